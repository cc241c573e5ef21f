//! End-to-end joint ICA run
//!
//! assemble cohort → normalize each modality → fuse → decompose → write.

use std::path::PathBuf;

use ndarray::Array2;
use tracing::info;

use neurofuse_core::{normalize, FusedMatrix, RegionAggregator, SubjectId};

use crate::cohort::{Cohort, CohortAssembler};
use crate::config::PipelineConfig;
use crate::decompose::{Decomposer, FastIcaDecomposer};
use crate::error::PipelineResult;
use crate::loader::ModalityLoader;
use crate::readers::{write_matrix, write_region_order};

/// Result of a pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Assembled (unnormalized) cohort
    pub cohort: Cohort,
    /// Normalized, fused matrix handed to the decomposition
    pub fused: FusedMatrix,
    /// Components, features × components
    pub components: Array2<f64>,
    /// Files written
    pub written: Vec<PathBuf>,
}

/// Joint ICA pipeline.
pub struct Pipeline<D = FastIcaDecomposer> {
    config: PipelineConfig,
    decomposer: D,
}

impl Pipeline {
    /// Pipeline using FastICA seeded from the configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let decomposer = FastIcaDecomposer::with_seed(config.seed);
        Self { config, decomposer }
    }
}

impl<D: Decomposer> Pipeline<D> {
    /// Pipeline with a custom decomposition.
    pub fn with_decomposer(config: PipelineConfig, decomposer: D) -> Self {
        Self { config, decomposer }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `subjects` and build the cohort matrices.
    ///
    /// # Errors
    ///
    /// Configuration, loading and cohort errors.
    pub fn assemble(&self, subjects: &[SubjectId]) -> PipelineResult<Cohort> {
        self.config.validate()?;
        let loader = ModalityLoader::new(&self.config.data_dir, self.config.layout.clone())?;
        CohortAssembler::new(loader, RegionAggregator::new(self.config.labeler))
            .with_region_order(self.config.region_order.clone())
            .on_missing_region(self.config.on_missing_region)
            .assemble(subjects)
    }

    /// Normalize each modality of `cohort` and fuse them.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Fusion`](crate::PipelineError::Fusion) if the matrices disagree on subject count.
    pub fn fuse(&self, cohort: &Cohort) -> PipelineResult<FusedMatrix> {
        let fa = normalize(&cohort.fa, self.config.fa_axis);
        let lfp = normalize(&cohort.lfp, self.config.lfp_axis);
        Ok(FusedMatrix::new(&fa, &lfp)?)
    }

    /// Run the whole pipeline and write its outputs under the data directory.
    ///
    /// # Errors
    ///
    /// Any fatal [`PipelineError`](crate::PipelineError).
    pub fn run(&self, subjects: &[SubjectId]) -> PipelineResult<PipelineOutput> {
        info!(
            subjects = subjects.len(),
            data_dir = %self.config.data_dir.display(),
            "Starting joint ICA run"
        );

        let cohort = self.assemble(subjects)?;
        let fused = self.fuse(&cohort)?;
        let components = self.decomposer.decompose(fused.data().t(), self.config.n_components)?;
        info!(shape = ?components.dim(), "Decomposition finished");

        let mut written = Vec::new();

        let path = self.config.output_path();
        write_matrix(&path, &components)?;
        written.push(path);

        if let Some(name) = &self.config.fused_file {
            let path = self.config.data_dir.join(name);
            write_matrix(&path, fused.data())?;
            written.push(path);
        }

        if let Some(name) = &self.config.region_order_file {
            let path = self.config.data_dir.join(name);
            write_region_order(&path, &cohort.region_order)?;
            written.push(path);
        }

        for path in &written {
            info!(path = %path.display(), "Wrote output");
        }

        Ok(PipelineOutput { cohort, fused, components, written })
    }
}
