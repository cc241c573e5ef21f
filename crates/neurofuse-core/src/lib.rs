//! Neurofuse Core - data types and numerics for MEG + DTI cohort fusion
//!
//! This crate holds the format-independent part of the joint-ICA pipeline:
//! plain boundary types for evoked responses and volumes, channel-to-region
//! aggregation, per-modality standardization and modality concatenation.
//!
//! # Modules
//!
//! - [`types`]: Subjects, channel types, evoked responses, volumes
//! - [`region`]: Region labeling, region order, LFP feature vectors
//! - [`normalize`]: Z-scoring along a chosen axis
//! - [`fusion`]: FA | LFP concatenation
//! - [`error`]: Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod fusion;
pub mod normalize;
pub mod region;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{FusionError, RegionError};
pub use fusion::{fuse, FusedMatrix};
pub use normalize::{normalize, NormAxis};
pub use region::{RegionAggregator, RegionLabeler, RegionOrder, SubstringLabeler};
pub use types::{ChannelType, EvokedResponse, SubjectId, Volume};
