//! Error types for region aggregation and modality fusion

use thiserror::Error;

/// Errors from collapsing channels into region feature vectors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// A region in the frozen order has no channels in this recording
    #[error("Region '{region}' from the region order has no channels in this recording")]
    MissingRegion {
        /// Region label that could not be found
        region: String,
    },

    /// The recording has no channels at all
    #[error("Evoked response has no channels")]
    NoChannels,

    /// The region order is empty, so no features can be produced
    #[error("Region order is empty")]
    EmptyOrder,
}

/// Errors from concatenating modality matrices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FusionError {
    /// Modality matrices disagree on the number of subjects
    #[error("Row count mismatch: FA matrix has {fa_rows} subjects, LFP matrix has {lfp_rows}")]
    RowMismatch {
        /// Rows in the FA matrix
        fa_rows: usize,
        /// Rows in the LFP matrix
        lfp_rows: usize,
    },
}

/// Result type for region aggregation.
pub type RegionResult<T> = Result<T, RegionError>;

/// Result type for modality fusion.
pub type FusionResult<T> = Result<T, FusionError>;
