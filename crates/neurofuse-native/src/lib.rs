//! Neurofuse Native - subject loading, cohort assembly and joint ICA
//!
//! This crate turns a list of subjects and a data directory into the fused
//! MEG + FA matrix and its independent components:
//! - Per-subject file loading behind format-reader traits
//! - Cohort assembly with a run-wide frozen region order
//! - Per-modality normalization and fusion (from `neurofuse-core`)
//! - FastICA decomposition and `.npy` output
//!
//! # Modules
//!
//! - [`config`]: Pipeline configuration and file layout
//! - [`readers`]: Evoked/volume readers, subject lists, output writers
//! - [`loader`]: Per-subject modality loading
//! - [`cohort`]: Cohort matrix assembly
//! - [`decompose`]: Decomposition trait and FastICA
//! - [`pipeline`]: End-to-end run

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod cohort;
pub mod config;
pub mod decompose;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod readers;

// Re-export key types
pub use cohort::{Cohort, CohortAssembler, MissingRegionPolicy};
pub use config::{FileLayout, PipelineConfig};
pub use decompose::{Decomposer, FastIcaDecomposer};
pub use error::{LoadError, PipelineError, WriteError};
pub use loader::{ModalityLoader, SubjectLoad, SubjectSource};
pub use pipeline::{Pipeline, PipelineOutput};
