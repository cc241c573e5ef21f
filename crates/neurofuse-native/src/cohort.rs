//! Cohort assembly
//!
//! Walks the subject list in order, loads each subject, lays its MEG data out
//! on a region order that is frozen once per run, flattens its FA map, and
//! stacks both vectors as rows of two cohort matrices. Row `i` of the FA
//! matrix and row `i` of the LFP matrix always belong to the same subject.

use core::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use neurofuse_core::{RegionAggregator, RegionError, RegionLabeler, RegionOrder, SubjectId, SubstringLabeler};

use crate::error::{PipelineError, PipelineResult};
use crate::loader::{MissingFile, Modality, SubjectLoad, SubjectSource};

/// Handling of a subject that lacks a region of the frozen order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRegionPolicy {
    /// Stop the run with an error naming the subject and region
    #[default]
    Abort,
    /// Drop the subject from the cohort and carry on
    Skip,
}

/// Why a subject was left out of the cohort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// An input file is missing
    MissingFile(MissingFile),
    /// The evoked response has no head MEG channels
    NoMegChannels,
    /// The subject has no channels in a region of the order
    MissingRegion(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile(missing) => fmt::Display::fmt(missing, f),
            Self::NoMegChannels => write!(f, "no MEG channels in the evoked response"),
            Self::MissingRegion(region) => write!(f, "no channels in region '{region}'"),
        }
    }
}

/// A subject left out of the cohort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedSubject {
    /// The subject
    pub subject: SubjectId,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Assembled cohort matrices.
#[derive(Clone, Debug)]
pub struct Cohort {
    /// Retained subjects, in row order
    pub subjects: Vec<SubjectId>,
    /// Subjects left out, in input order
    pub skipped: Vec<SkippedSubject>,
    /// Region order every LFP row follows
    pub region_order: RegionOrder,
    /// FA features, subjects × voxels
    pub fa: Array2<f64>,
    /// LFP features, subjects × (regions · time samples)
    pub lfp: Array2<f64>,
}

impl Cohort {
    /// Number of retained subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether no subject was retained.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Row-major accumulation of one modality's feature vectors.
struct FeatureRows {
    modality: Modality,
    width: Option<usize>,
    values: Vec<f64>,
}

impl FeatureRows {
    fn new(modality: Modality) -> Self {
        Self { modality, width: None, values: Vec::new() }
    }

    /// Check that `len` matches the width fixed by earlier rows.
    fn check(&self, subject: &SubjectId, len: usize) -> PipelineResult<()> {
        match self.width {
            Some(expected) if expected != len => Err(PipelineError::InconsistentFeatureLength {
                subject: subject.clone(),
                modality: self.modality,
                expected,
                got: len,
            }),
            _ => Ok(()),
        }
    }

    fn push(&mut self, row: &Array1<f64>) {
        self.width.get_or_insert(row.len());
        self.values.extend(row.iter().copied());
    }

    fn into_matrix(self, rows: usize) -> PipelineResult<Array2<f64>> {
        let cols = self.width.unwrap_or(0);
        Array2::from_shape_vec((rows, cols), self.values).map_err(|e| PipelineError::Shape {
            modality: self.modality,
            message: e.to_string(),
        })
    }
}

/// Builds cohort matrices from a subject list.
pub struct CohortAssembler<S, L = SubstringLabeler> {
    source: S,
    aggregator: RegionAggregator<L>,
    region_order: Option<RegionOrder>,
    on_missing_region: MissingRegionPolicy,
}

impl<S: SubjectSource, L: RegionLabeler> CohortAssembler<S, L> {
    /// Create an assembler reading subjects from `source`.
    pub fn new(source: S, aggregator: RegionAggregator<L>) -> Self {
        Self {
            source,
            aggregator,
            region_order: None,
            on_missing_region: MissingRegionPolicy::default(),
        }
    }

    /// Use a fixed region order instead of the first retained subject's.
    #[must_use]
    pub fn with_region_order(mut self, order: Option<RegionOrder>) -> Self {
        self.region_order = order;
        self
    }

    /// Set the missing-region policy.
    #[must_use]
    pub fn on_missing_region(mut self, policy: MissingRegionPolicy) -> Self {
        self.on_missing_region = policy;
        self
    }

    /// Assemble the cohort from `subjects`, in order.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Subject`] if a subject's existing files are unreadable
    /// - [`PipelineError::Region`] if a subject cannot be laid out on the
    ///   region order (and the policy does not skip it)
    /// - [`PipelineError::InconsistentFeatureLength`] if vector lengths differ
    /// - [`PipelineError::EmptyCohort`] if no subject is retained
    pub fn assemble(&self, subjects: &[SubjectId]) -> PipelineResult<Cohort> {
        let mut order = self.region_order.clone();
        let mut fa_rows = FeatureRows::new(Modality::Fa);
        let mut lfp_rows = FeatureRows::new(Modality::Meg);
        let mut retained = Vec::new();
        let mut skipped = Vec::new();

        for subject in subjects {
            let data = match self.source.load(subject) {
                Ok(SubjectLoad::Complete(data)) => data,
                Ok(SubjectLoad::Incomplete(missing)) => {
                    warn!(subject = %subject, reason = %missing, "Skipping incomplete subject");
                    skipped.push(SkippedSubject {
                        subject: subject.clone(),
                        reason: SkipReason::MissingFile(missing),
                    });
                    continue;
                }
                Err(source) => {
                    return Err(PipelineError::Subject { subject: subject.clone(), source });
                }
            };

            // A subject without MEG channels must never define the region order
            if data.evoked.n_channels() == 0 {
                warn!(subject = %subject, "Skipping subject without MEG channels");
                skipped.push(SkippedSubject {
                    subject: subject.clone(),
                    reason: SkipReason::NoMegChannels,
                });
                continue;
            }

            let order = order.get_or_insert_with(|| {
                let regions = self.aggregator.get_regions(&data.evoked);
                info!(subject = %subject, regions = ?regions.labels(), "Region order fixed");
                regions
            });

            let lfp = match self.aggregator.compute_lfp_vector(order, &data.evoked) {
                Ok(lfp) => lfp,
                Err(RegionError::MissingRegion { region })
                    if self.on_missing_region == MissingRegionPolicy::Skip =>
                {
                    warn!(subject = %subject, region = %region, "Skipping subject missing a region");
                    skipped.push(SkippedSubject {
                        subject: subject.clone(),
                        reason: SkipReason::MissingRegion(region),
                    });
                    continue;
                }
                Err(source) => {
                    return Err(PipelineError::Region { subject: subject.clone(), source });
                }
            };
            let fa = data.volume.flatten();

            // Both checks pass before either push so the matrices stay row-aligned
            fa_rows.check(subject, fa.len())?;
            lfp_rows.check(subject, lfp.len())?;
            fa_rows.push(&fa);
            lfp_rows.push(&lfp);
            retained.push(subject.clone());
            debug!(subject = %subject, row = retained.len() - 1, "Subject added to cohort");
        }

        let Some(region_order) = order.filter(|_| !retained.is_empty()) else {
            return Err(PipelineError::EmptyCohort { requested: subjects.len() });
        };

        let n = retained.len();
        let cohort = Cohort {
            fa: fa_rows.into_matrix(n)?,
            lfp: lfp_rows.into_matrix(n)?,
            subjects: retained,
            skipped,
            region_order,
        };

        info!(
            retained = cohort.len(),
            skipped = cohort.skipped.len(),
            fa_features = cohort.fa.ncols(),
            lfp_features = cohort.lfp.ncols(),
            "Cohort assembled"
        );
        Ok(cohort)
    }
}
