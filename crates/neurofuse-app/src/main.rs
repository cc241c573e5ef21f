//! Neurofuse Application
//!
//! Command-line entry point for fusing MEG evoked responses and DTI FA maps
//! across a cohort and extracting joint independent components.
//!
//! # Usage
//!
//! ```bash
//! # Full run with defaults (11 components, global z-scoring)
//! neurofuse run --subjects subjects.txt --data-dir /data/DTI_MEG
//!
//! # Reproducible rerun with a stored region order and a config file
//! neurofuse run --subjects subjects.txt --config jica.json --region-order regions.json
//!
//! # Regions present in one subject's MEG recording
//! neurofuse regions --data-dir /data/DTI_MEG --subject sub-ON97504
//!
//! # Write the default configuration
//! neurofuse init-config jica.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use neurofuse_core::{RegionAggregator, SubjectId};
use neurofuse_native::readers::{read_region_order, read_subject_list};
use neurofuse_native::{ModalityLoader, Pipeline, PipelineConfig};

/// Neurofuse Application
#[derive(Parser, Debug)]
#[command(name = "neurofuse")]
#[command(author, version, about = "Joint ICA of MEG evoked responses and DTI FA maps", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble the cohort, fuse modalities and run the decomposition
    Run {
        /// Subject list, whitespace separated
        #[arg(short, long)]
        subjects: PathBuf,

        /// Data directory (overrides the config file)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of components (overrides the config file)
        #[arg(short = 'k', long)]
        components: Option<usize>,

        /// Components file name, relative to the data directory
        /// (default `ica_<k>components.npy`)
        #[arg(short, long)]
        output: Option<String>,

        /// JSON file with a fixed region order
        #[arg(long)]
        region_order: Option<PathBuf>,

        /// Also save the region order used under this name
        #[arg(long)]
        save_region_order: Option<String>,

        /// Also save the fused matrix under this name
        #[arg(long)]
        save_fused: Option<String>,
    },

    /// Print the regions present in one subject's MEG recording
    Regions {
        /// Data directory
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Subject identifier
        #[arg(short, long)]
        subject: String,

        /// JSON configuration file (for file layout and labeler)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Neurofuse v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            subjects,
            data_dir,
            config,
            components,
            output,
            region_order,
            save_region_order,
            save_fused,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(k) = components {
                config.n_components = k;
            }
            if let Some(name) = output {
                config.output_file = Some(name);
            }
            if let Some(path) = region_order {
                config.region_order = Some(read_region_order(&path)?);
            }
            config.region_order_file = save_region_order.or(config.region_order_file);
            config.fused_file = save_fused.or(config.fused_file);

            run_pipeline(config, &subjects)?;
        }
        Commands::Regions { data_dir, subject, config } => {
            let config = load_config(config.as_deref())?;
            print_regions(&config, data_dir, &subject)?;
        }
        Commands::InitConfig { path } => {
            let json = PipelineConfig::default().to_json()?;
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::from_json_file(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Run the full joint ICA pipeline
fn run_pipeline(config: PipelineConfig, subjects_path: &Path) -> anyhow::Result<()> {
    let subjects = read_subject_list(subjects_path)?;
    info!("Loaded {} subjects from {}", subjects.len(), subjects_path.display());

    let output = Pipeline::new(config).run(&subjects)?;

    for skipped in &output.cohort.skipped {
        warn!("Skipped {}: {}", skipped.subject, skipped.reason);
    }
    info!(
        "Cohort: {} retained, {} skipped; fused matrix {}x{} ({} FA + {} LFP features)",
        output.cohort.len(),
        output.cohort.skipped.len(),
        output.fused.n_subjects(),
        output.fused.data().ncols(),
        output.fused.fa_features(),
        output.fused.lfp_features(),
    );
    for path in &output.written {
        println!("{}", path.display());
    }

    Ok(())
}

/// Print one subject's regions, one per line
fn print_regions(config: &PipelineConfig, data_dir: PathBuf, subject: &str) -> anyhow::Result<()> {
    let subject = SubjectId::from(subject);
    let loader = ModalityLoader::new(data_dir, config.layout.clone())?;
    let evoked = loader
        .load_evoked(&subject)?
        .with_context(|| format!("no evoked response for subject {subject}"))?;

    let regions = RegionAggregator::new(config.labeler).get_regions(&evoked);
    info!("{} MEG channels in {} regions", evoked.n_channels(), regions.len());
    for region in regions.iter() {
        println!("{region}");
    }

    Ok(())
}
