//! Core data types for cohort fusion
//!
//! Plain data structures exchanged at the boundary between file readers and
//! the aggregation logic. Readers produce [`EvokedResponse`] and [`Volume`];
//! everything downstream only sees these.

use core::fmt;

use ndarray::{Array1, Array2, ArrayD, Axis};
use serde::{Deserialize, Serialize};

// ============================================================================
// Subjects
// ============================================================================

/// Identifier of one subject in a cohort.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a subject identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Channels
// ============================================================================

/// Sensor type of a recorded channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// MEG magnetometer
    Mag,
    /// MEG planar or axial gradiometer
    Grad,
    /// Reference MEG sensor (noise compensation, not over the head)
    RefMeg,
    /// EEG electrode
    Eeg,
    /// Electro-oculogram
    Eog,
    /// Electrocardiogram
    Ecg,
    /// Trigger / stimulus channel
    Stim,
    /// Anything else
    Misc,
}

impl ChannelType {
    /// Whether this is a head MEG sensor (magnetometer or gradiometer).
    #[inline]
    #[must_use]
    pub const fn is_meg(self) -> bool {
        matches!(self, Self::Mag | Self::Grad)
    }
}

// ============================================================================
// Evoked Response
// ============================================================================

/// One subject's evoked response: channel names and a `[channel, time]` array.
#[derive(Clone, Debug, PartialEq)]
pub struct EvokedResponse {
    ch_names: Vec<String>,
    ch_types: Vec<ChannelType>,
    data: Array2<f64>,
}

impl EvokedResponse {
    /// Build an evoked response.
    ///
    /// Returns `None` when the number of names, types and data rows disagree.
    #[must_use]
    pub fn new(ch_names: Vec<String>, ch_types: Vec<ChannelType>, data: Array2<f64>) -> Option<Self> {
        if ch_names.len() != data.nrows() || ch_types.len() != data.nrows() {
            return None;
        }
        Some(Self { ch_names, ch_types, data })
    }

    /// Build an evoked response in which every channel is a magnetometer.
    #[must_use]
    pub fn from_meg(ch_names: Vec<String>, data: Array2<f64>) -> Option<Self> {
        let ch_types = vec![ChannelType::Mag; ch_names.len()];
        Self::new(ch_names, ch_types, data)
    }

    /// Channel names, in data row order.
    #[must_use]
    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Channel types, in data row order.
    #[must_use]
    pub fn ch_types(&self) -> &[ChannelType] {
        &self.ch_types
    }

    /// Sample array indexed `[channel, time]`.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Number of time samples per channel.
    #[must_use]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Keep only channels whose type satisfies `keep`.
    #[must_use]
    pub fn pick(&self, keep: impl Fn(ChannelType) -> bool) -> Self {
        let rows: Vec<usize> = self
            .ch_types
            .iter()
            .enumerate()
            .filter(|(_, t)| keep(**t))
            .map(|(i, _)| i)
            .collect();

        Self {
            ch_names: rows.iter().map(|&i| self.ch_names[i].clone()).collect(),
            ch_types: rows.iter().map(|&i| self.ch_types[i]).collect(),
            data: self.data.select(Axis(0), &rows),
        }
    }

    /// Keep head MEG channels only; reference MEG sensors are dropped.
    #[must_use]
    pub fn pick_meg(&self) -> Self {
        self.pick(ChannelType::is_meg)
    }
}

// ============================================================================
// Volume
// ============================================================================

/// A volumetric scalar map (e.g. fractional anisotropy) of any dimensionality.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    data: ArrayD<f64>,
}

impl Volume {
    /// Wrap an N-dimensional array.
    #[must_use]
    pub fn new(data: ArrayD<f64>) -> Self {
        Self { data }
    }

    /// Shape of the volume.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the volume has no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying array.
    #[must_use]
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Flatten to one value per voxel in row-major (C) order.
    #[must_use]
    pub fn flatten(&self) -> Array1<f64> {
        self.data.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn test_evoked_shape_validation() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(EvokedResponse::from_meg(vec!["MLC11".into()], data.clone()).is_none());
        assert!(EvokedResponse::from_meg(vec!["MLC11".into(), "MRC11".into()], data).is_some());
    }

    #[test]
    fn test_pick_meg_drops_reference_and_eeg() {
        let evoked = EvokedResponse::new(
            vec!["MLC11".into(), "BG1".into(), "EEG001".into(), "MRF21".into()],
            vec![ChannelType::Mag, ChannelType::RefMeg, ChannelType::Eeg, ChannelType::Grad],
            array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]],
        )
        .unwrap();

        let meg = evoked.pick_meg();
        assert_eq!(meg.ch_names(), &["MLC11".to_string(), "MRF21".to_string()]);
        assert_eq!(meg.data(), &array![[1.0, 1.0], [4.0, 4.0]]);
    }

    #[test]
    fn test_volume_flatten_row_major() {
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 2, 2]), (0..8).map(f64::from).collect()).unwrap();
        let volume = Volume::new(data);
        assert_eq!(volume.len(), 8);
        assert_eq!(volume.flatten().to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_volume_flatten_follows_logical_order_for_fortran_layout() {
        use ndarray::ShapeBuilder;
        let data = ndarray::Array2::from_shape_vec((2, 3).f(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0])
            .unwrap()
            .into_dyn();
        let volume = Volume::new(data);
        assert_eq!(volume.flatten().to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_subject_id_display() {
        let id = SubjectId::from("sub-ON97504");
        assert_eq!(id.to_string(), "sub-ON97504");
        assert_eq!(id.as_str(), "sub-ON97504");
    }
}
