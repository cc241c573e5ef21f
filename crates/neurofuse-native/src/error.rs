//! Error types for loading, cohort assembly and decomposition
//!
//! Errors are grouped per stage using `thiserror`. Only a missing
//! per-subject file is recoverable, and that case is not an error at all:
//! the loader reports it as [`SubjectLoad::Incomplete`](crate::loader::SubjectLoad).

use std::path::PathBuf;

use neurofuse_core::{FusionError, RegionError, SubjectId};
use thiserror::Error;

use crate::loader::Modality;

// ============================================================================
// Loading
// ============================================================================

/// Errors reading subject lists, evoked responses and volumes.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O failure on a file that exists
    #[error("I/O error reading `{path}`: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A JSON file could not be parsed
    #[error("JSON parse error in `{path}`: {source}")]
    Json {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A `.npy` file could not be parsed
    #[error("NumPy read error in `{path}`: {message}")]
    NpyRead {
        /// File being parsed
        path: PathBuf,
        /// Error description
        message: String,
    },

    /// A file parsed but its contents are inconsistent
    #[error("Invalid contents in `{path}`: {message}")]
    Format {
        /// Offending file
        path: PathBuf,
        /// What is wrong
        message: String,
    },

    /// Subject identifier is empty
    #[error("Subject identifier is empty")]
    EmptySubjectId,

    /// The data directory does not exist
    #[error("Data directory not found: {path}")]
    DataDirNotFound {
        /// Missing directory
        path: PathBuf,
    },
}

impl LoadError {
    /// Construct a [`LoadError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Construct a [`LoadError::Format`].
    pub fn format<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Format { path: path.into(), message: message.into() }
    }

    /// Construct a [`LoadError::NpyRead`].
    pub fn npy_read<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::NpyRead { path: path.into(), message: message.into() }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Errors writing output artifacts.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The file could not be written
    #[error("I/O error writing `{path}`: {source}")]
    Io {
        /// Destination file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded as JSON
    #[error("JSON encode error for `{path}`: {source}")]
    Json {
        /// Destination file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A matrix could not be written as `.npy`
    #[error("NumPy write error in `{path}`: {source}")]
    Npy {
        /// Destination file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ndarray_npy::WriteNpyError,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Errors loading or validating a pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Cannot read config `{path}`: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a config
    #[error("Cannot parse config `{path}`: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A field holds an unusable value
    #[error("Invalid config field {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why it is rejected
        reason: String,
    },
}

// ============================================================================
// Decomposition
// ============================================================================

/// Errors from the decomposition step.
#[derive(Error, Debug)]
pub enum DecompositionError {
    /// Zero components requested, or the input matrix is empty
    #[error("Cannot extract {requested} components from a {rows}x{cols} matrix")]
    InvalidComponentCount {
        /// Components requested
        requested: usize,
        /// Rows (samples) in the input
        rows: usize,
        /// Columns (signals) in the input
        cols: usize,
    },

    /// The underlying algorithm failed
    #[error("Decomposition failed: {0}")]
    Fit(String),
}

// ============================================================================
// Pipeline
// ============================================================================

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Loading failed outside any single subject (subject list, data dir)
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A subject's files exist but could not be read
    #[error("Failed to load subject {subject}: {source}")]
    Subject {
        /// Failing subject
        subject: SubjectId,
        /// Underlying error
        #[source]
        source: LoadError,
    },

    /// A subject could not be laid out on the frozen region order
    #[error("Subject {subject}: {source}")]
    Region {
        /// Failing subject
        subject: SubjectId,
        /// Underlying error
        #[source]
        source: RegionError,
    },

    /// A subject's feature vector length differs from the cohort's
    #[error(
        "Subject {subject}: {modality} feature vector has length {got}, cohort expects {expected} \
         (heterogeneous acquisition geometry?)"
    )]
    InconsistentFeatureLength {
        /// Failing subject
        subject: SubjectId,
        /// Modality whose length differs
        modality: Modality,
        /// Length fixed by earlier subjects
        expected: usize,
        /// Length of this subject's vector
        got: usize,
    },

    /// No subject contributed data
    #[error("No subjects retained out of {requested} requested")]
    EmptyCohort {
        /// Number of subjects in the input list
        requested: usize,
    },

    /// Accumulated features could not be reshaped into a matrix
    #[error("Cannot shape {modality} cohort matrix: {message}")]
    Shape {
        /// Modality being shaped
        modality: Modality,
        /// Error description
        message: String,
    },

    /// Modality matrices could not be fused
    #[error(transparent)]
    Fusion(#[from] FusionError),

    /// Decomposition failed
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),

    /// An output artifact could not be written
    #[error(transparent)]
    Output(#[from] WriteError),
}

/// Result type for loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for writing outputs.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for decomposition.
pub type DecompositionResult<T> = Result<T, DecompositionError>;

/// Result type for a pipeline run.
pub type PipelineResult<T> = Result<T, PipelineError>;
