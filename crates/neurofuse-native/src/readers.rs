//! File readers and writers
//!
//! Evoked responses and volumes are read through the [`EvokedReader`] and
//! [`VolumeReader`] traits so the pipeline never depends on a particular
//! file-format library. The shipped readers cover simple interchange files:
//!
//! - evoked responses exported to JSON:
//!   `{ "ch_names": [...], "ch_types": [...], "data": [[...], ...] }`
//!   with `data` indexed `[channel][time]`; `ch_types` may be omitted, in
//!   which case every channel is taken as a magnetometer
//! - volumes stored as `.npy` arrays of `f64` or `f32`, any dimensionality

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::{Array2, ArrayD};
use ndarray_npy::{write_npy, ReadNpyExt};
use serde::Deserialize;

use neurofuse_core::{ChannelType, EvokedResponse, RegionOrder, SubjectId, Volume};

use crate::error::{LoadError, LoadResult, WriteError, WriteResult};

// ============================================================================
// Reader Traits
// ============================================================================

/// Reads one subject's evoked response.
pub trait EvokedReader {
    /// Read the evoked response stored at `path`.
    ///
    /// # Errors
    ///
    /// Any failure to open or parse the file.
    fn read_evoked(&self, path: &Path) -> LoadResult<EvokedResponse>;
}

/// Reads one subject's volumetric map.
pub trait VolumeReader {
    /// Read the volume stored at `path`.
    ///
    /// # Errors
    ///
    /// Any failure to open or parse the file.
    fn read_volume(&self, path: &Path) -> LoadResult<Volume>;
}

// ============================================================================
// JSON Evoked Reader
// ============================================================================

#[derive(Deserialize)]
struct EvokedFile {
    ch_names: Vec<String>,
    #[serde(default)]
    ch_types: Option<Vec<ChannelType>>,
    data: Vec<Vec<f64>>,
}

/// Reads evoked responses exported as JSON.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonEvokedReader;

impl EvokedReader for JsonEvokedReader {
    fn read_evoked(&self, path: &Path) -> LoadResult<EvokedResponse> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let parsed: EvokedFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| LoadError::Json { path: path.to_path_buf(), source })?;

        let n_channels = parsed.data.len();
        let n_times = parsed.data.first().map_or(0, Vec::len);
        if let Some((ch, row)) = parsed.data.iter().enumerate().find(|(_, r)| r.len() != n_times) {
            return Err(LoadError::format(
                path,
                format!("channel {ch} has {} samples, channel 0 has {n_times}", row.len()),
            ));
        }

        let flat: Vec<f64> = parsed.data.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n_channels, n_times), flat)
            .map_err(|e| LoadError::format(path, e.to_string()))?;

        let ch_types = parsed
            .ch_types
            .unwrap_or_else(|| vec![ChannelType::Mag; parsed.ch_names.len()]);
        let (n_names, n_types) = (parsed.ch_names.len(), ch_types.len());

        EvokedResponse::new(parsed.ch_names, ch_types, data).ok_or_else(|| {
            LoadError::format(
                path,
                format!("{n_names} channel names and {n_types} channel types for {n_channels} data rows"),
            )
        })
    }
}

// ============================================================================
// NPY Volume Reader
// ============================================================================

/// Reads volumes stored as `.npy` arrays.
#[derive(Copy, Clone, Debug, Default)]
pub struct NpyVolumeReader;

impl VolumeReader for NpyVolumeReader {
    fn read_volume(&self, path: &Path) -> LoadResult<Volume> {
        let open = || File::open(path).map_err(|e| LoadError::io(path, e));

        let data = match ArrayD::<f64>::read_npy(open()?) {
            Ok(data) => data,
            // FA maps are commonly single precision
            Err(as_f64) => ArrayD::<f32>::read_npy(open()?)
                .map(|a| a.mapv(f64::from))
                .map_err(|_| LoadError::npy_read(path, as_f64.to_string()))?,
        };

        Ok(Volume::new(data))
    }
}

// ============================================================================
// Plain-Text and JSON Helpers
// ============================================================================

/// Read a subject list: whitespace-separated identifiers, `#` starts a comment.
///
/// # Errors
///
/// [`LoadError::Io`] if the file cannot be read.
pub fn read_subject_list(path: &Path) -> LoadResult<Vec<SubjectId>> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    Ok(parse_subject_list(&text))
}

/// Parse subject identifiers from text.
pub fn parse_subject_list(text: &str) -> Vec<SubjectId> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .map(SubjectId::from)
        .collect()
}

/// Read a region order stored as a JSON array of labels.
///
/// # Errors
///
/// [`LoadError::Io`] or [`LoadError::Json`].
pub fn read_region_order(path: &Path) -> LoadResult<RegionOrder> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| LoadError::Json { path: path.to_path_buf(), source })
}

/// Write a region order as a JSON array of labels.
///
/// # Errors
///
/// [`WriteError::Json`] or [`WriteError::Io`].
pub fn write_region_order(path: &Path, order: &RegionOrder) -> WriteResult<()> {
    let json = serde_json::to_string_pretty(order)
        .map_err(|source| WriteError::Json { path: path.to_path_buf(), source })?;
    std::fs::write(path, json).map_err(|source| WriteError::Io { path: path.to_path_buf(), source })
}

/// Write a matrix as a `.npy` file.
///
/// # Errors
///
/// [`WriteError::Npy`] if the file cannot be created or written.
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> WriteResult<()> {
    write_npy(path, matrix).map_err(|source| WriteError::Npy { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn test_parse_subject_list() {
        let text = "sub-01 sub-02\n# excluded\n\n  sub-03  # trailing\n24601\n";
        let subjects = parse_subject_list(text);
        let ids: Vec<&str> = subjects.iter().map(SubjectId::as_str).collect();
        assert_eq!(ids, vec!["sub-01", "sub-02", "sub-03", "24601"]);
    }

    #[test]
    fn test_read_json_evoked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ave.json");
        std::fs::write(
            &path,
            r#"{"ch_names":["MLC11","BG1"],"ch_types":["mag","ref_meg"],"data":[[1,2,3],[4,5,6]]}"#,
        )
        .unwrap();

        let evoked = JsonEvokedReader.read_evoked(&path).unwrap();
        assert_eq!(evoked.n_channels(), 2);
        assert_eq!(evoked.n_times(), 3);
        assert_eq!(evoked.ch_types(), &[ChannelType::Mag, ChannelType::RefMeg]);
        assert_eq!(evoked.data(), &array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_json_evoked_defaults_to_magnetometers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ave.json");
        std::fs::write(&path, r#"{"ch_names":["MLC11"],"data":[[0.5]]}"#).unwrap();

        let evoked = JsonEvokedReader.read_evoked(&path).unwrap();
        assert_eq!(evoked.ch_types(), &[ChannelType::Mag]);
    }

    #[test]
    fn test_json_evoked_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ave.json");
        std::fs::write(&path, r#"{"ch_names":["A","B"],"data":[[1,2],[3]]}"#).unwrap();

        let err = JsonEvokedReader.read_evoked(&path).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }), "{err}");
    }

    #[test]
    fn test_json_evoked_rejects_name_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ave.json");
        std::fs::write(&path, r#"{"ch_names":["A"],"data":[[1,2],[3,4]]}"#).unwrap();

        assert!(matches!(
            JsonEvokedReader.read_evoked(&path),
            Err(LoadError::Format { .. })
        ));
    }

    #[test]
    fn test_read_npy_volume_f64_and_f32() {
        let dir = tempfile::tempdir().unwrap();

        let f64_path = dir.path().join("fa64.npy");
        let vol = ArrayD::from_elem(IxDyn(&[2, 2, 2]), 0.25_f64);
        write_npy(&f64_path, &vol).unwrap();
        let read = NpyVolumeReader.read_volume(&f64_path).unwrap();
        assert_eq!(read.shape(), &[2, 2, 2]);
        assert!(read.flatten().iter().all(|&v| v == 0.25));

        let f32_path = dir.path().join("fa32.npy");
        let vol = ArrayD::from_elem(IxDyn(&[3, 2]), 0.5_f32);
        write_npy(&f32_path, &vol).unwrap();
        let read = NpyVolumeReader.read_volume(&f32_path).unwrap();
        assert_eq!(read.len(), 6);
        assert!(read.flatten().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_read_npy_volume_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fa.npy");
        std::fs::write(&path, b"not an npy file").unwrap();

        assert!(matches!(
            NpyVolumeReader.read_volume(&path),
            Err(LoadError::NpyRead { .. })
        ));
    }

    #[test]
    fn test_region_order_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        let order = RegionOrder::from_labels(["LC", "RF", "ZO"]);

        write_region_order(&path, &order).unwrap();
        assert_eq!(read_region_order(&path).unwrap(), order);
    }

    #[test]
    fn test_write_errors_keep_their_source() {
        use std::error::Error as _;

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");

        let err = write_region_order(&missing.join("regions.json"), &RegionOrder::from_labels(["LC"]))
            .unwrap_err();
        assert!(matches!(err, WriteError::Io { ref path, .. } if path.ends_with("regions.json")));
        assert!(err.source().is_some());

        let err = write_matrix(&missing.join("m.npy"), &array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, WriteError::Npy { .. }));
        assert!(err.source().is_some());
    }
}
