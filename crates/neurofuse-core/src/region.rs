//! Sensor-region aggregation
//!
//! MEG channel names encode the scalp region they sit over (for CTF systems
//! `MLC11` is left-central, `MRF21` right-frontal, ...). This module groups
//! channels by region, averages each group per time sample, and flattens the
//! averaged series into one feature vector following a fixed [`RegionOrder`].
//!
//! How a channel name maps to a region is delegated to a [`RegionLabeler`],
//! so other naming conventions can be plugged in without touching the
//! aggregation itself.
//!
//! # Example
//!
//! ```rust
//! use ndarray::array;
//! use neurofuse_core::region::{RegionAggregator, RegionOrder};
//! use neurofuse_core::types::EvokedResponse;
//!
//! let evoked = EvokedResponse::from_meg(
//!     vec!["MLC11".into(), "MLC12".into(), "MRF21".into()],
//!     array![[1.0, 2.0], [3.0, 4.0], [9.0, 9.0]],
//! )
//! .unwrap();
//!
//! let aggregator = RegionAggregator::default();
//! let order = RegionOrder::from_labels(["RF", "LC"]);
//! let lfp = aggregator.compute_lfp_vector(&order, &evoked).unwrap();
//! assert_eq!(lfp.to_vec(), vec![9.0, 9.0, 2.0, 3.0]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{RegionError, RegionResult};
use crate::types::EvokedResponse;

// ============================================================================
// Region Labeling
// ============================================================================

/// Maps a channel name to the region label it belongs to.
///
/// Any `Fn(&str) -> String` is a labeler.
pub trait RegionLabeler {
    /// Region label for `channel`.
    fn label(&self, channel: &str) -> String;
}

impl<F> RegionLabeler for F
where
    F: Fn(&str) -> String,
{
    fn label(&self, channel: &str) -> String {
        self(channel)
    }
}

/// Labels a channel by a fixed character window of its name.
///
/// The default window is characters 1..3, which for CTF names drops the
/// leading `M` and keeps the hemisphere + lobe code. Names shorter than the
/// window yield whatever characters fall inside it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstringLabeler {
    /// Index of the first character kept
    pub start: usize,
    /// Number of characters kept
    pub len: usize,
}

impl SubstringLabeler {
    /// Create a labeler keeping `len` characters starting at `start`.
    #[must_use]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }
}

impl Default for SubstringLabeler {
    fn default() -> Self {
        Self::new(1, 2)
    }
}

impl RegionLabeler for SubstringLabeler {
    fn label(&self, channel: &str) -> String {
        channel.chars().skip(self.start).take(self.len).collect()
    }
}

// ============================================================================
// Region Order
// ============================================================================

/// Ordered, duplicate-free list of region labels.
///
/// Fixes the layout of every LFP feature vector in a run: block `i` of each
/// vector is the averaged time series of region `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RegionOrder {
    labels: Vec<String>,
}

impl RegionOrder {
    /// Build an order from labels, keeping the first occurrence of duplicates.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let labels = labels
            .into_iter()
            .map(Into::into)
            .filter(|l: &String| seen.insert(l.clone()))
            .collect();
        Self { labels }
    }

    /// Region labels in order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Iterate labels in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the order has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of `region` in the order.
    #[must_use]
    pub fn position(&self, region: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == region)
    }

    /// Length of an LFP feature vector built with this order.
    #[must_use]
    pub fn feature_len(&self, n_times: usize) -> usize {
        self.labels.len() * n_times
    }
}

impl From<Vec<String>> for RegionOrder {
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<RegionOrder> for Vec<String> {
    fn from(order: RegionOrder) -> Self {
        order.labels
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Collapses per-channel time series into per-region averages.
#[derive(Clone, Debug)]
pub struct RegionAggregator<L = SubstringLabeler> {
    labeler: L,
}

impl Default for RegionAggregator {
    fn default() -> Self {
        Self::new(SubstringLabeler::default())
    }
}

impl<L: RegionLabeler> RegionAggregator<L> {
    /// Create an aggregator using `labeler` to assign channels to regions.
    pub fn new(labeler: L) -> Self {
        Self { labeler }
    }

    /// The labeler in use.
    pub fn labeler(&self) -> &L {
        &self.labeler
    }

    /// Distinct regions present in `evoked`, sorted by label.
    pub fn get_regions(&self, evoked: &EvokedResponse) -> RegionOrder {
        let regions: BTreeSet<String> = evoked
            .ch_names()
            .iter()
            .map(|name| self.labeler.label(name))
            .collect();
        RegionOrder { labels: regions.into_iter().collect() }
    }

    /// Unweighted mean time series of each region present in `evoked`.
    pub fn region_averages(&self, evoked: &EvokedResponse) -> BTreeMap<String, Array1<f64>> {
        let n_times = evoked.n_times();
        let mut sums: BTreeMap<String, (Array1<f64>, usize)> = BTreeMap::new();

        for (name, series) in evoked.ch_names().iter().zip(evoked.data().rows()) {
            let entry = sums
                .entry(self.labeler.label(name))
                .or_insert_with(|| (Array1::zeros(n_times), 0));
            entry.0 += &series;
            entry.1 += 1;
        }

        sums.into_iter()
            .map(|(region, (sum, count))| (region, sum / count as f64))
            .collect()
    }

    /// Concatenate region averages following `order`.
    ///
    /// # Errors
    ///
    /// [`RegionError::MissingRegion`] if a region in `order` has no channels
    /// in `evoked`. The vector is never built with a gap or shifted blocks.
    pub fn compute_lfp_vector(
        &self,
        order: &RegionOrder,
        evoked: &EvokedResponse,
    ) -> RegionResult<Array1<f64>> {
        if order.is_empty() {
            return Err(RegionError::EmptyOrder);
        }
        if evoked.n_channels() == 0 {
            return Err(RegionError::NoChannels);
        }

        let averages = self.region_averages(evoked);
        let mut features = Vec::with_capacity(order.feature_len(evoked.n_times()));

        for region in order.iter() {
            let series = averages
                .get(region)
                .ok_or_else(|| RegionError::MissingRegion { region: region.to_string() })?;
            features.extend(series.iter().copied());
        }

        Ok(Array1::from(features))
    }
}
