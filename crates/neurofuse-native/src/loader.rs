//! Per-subject modality loading
//!
//! Locates a subject's evoked response and FA map by naming convention and
//! reads both. A subject with either file absent is reported as
//! [`SubjectLoad::Incomplete`] so the caller can skip it; files that exist
//! but cannot be read are errors.

use core::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use neurofuse_core::{EvokedResponse, SubjectId, Volume};

use crate::config::FileLayout;
use crate::error::{LoadError, LoadResult};
use crate::readers::{EvokedReader, JsonEvokedReader, NpyVolumeReader, VolumeReader};

/// Imaging modality of a per-subject input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    /// MEG evoked response (source of LFP features)
    Meg,
    /// Fractional anisotropy map
    Fa,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meg => f.write_str("MEG"),
            Self::Fa => f.write_str("FA"),
        }
    }
}

/// An expected input file that is not on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingFile {
    /// Modality of the missing file
    pub modality: Modality,
    /// Where the file was expected
    pub path: PathBuf,
}

impl fmt::Display for MissingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file not found: {}", self.modality, self.path.display())
    }
}

/// Both modalities of one subject, MEG restricted to head MEG channels.
#[derive(Clone, Debug)]
pub struct SubjectData {
    /// Subject the data belongs to
    pub subject: SubjectId,
    /// Evoked response, MEG channels only
    pub evoked: EvokedResponse,
    /// FA map
    pub volume: Volume,
}

/// Outcome of loading one subject.
#[derive(Clone, Debug)]
pub enum SubjectLoad {
    /// Both files present and read
    Complete(SubjectData),
    /// A file is missing; the subject should be skipped
    Incomplete(MissingFile),
}

/// Anything that can produce a subject's data.
pub trait SubjectSource {
    /// Load `subject`.
    ///
    /// # Errors
    ///
    /// Failures reading files that exist. Missing files are not errors.
    fn load(&self, subject: &SubjectId) -> LoadResult<SubjectLoad>;
}

/// Loads subjects from a data directory through format readers.
#[derive(Clone, Debug)]
pub struct ModalityLoader<E = JsonEvokedReader, V = NpyVolumeReader> {
    data_dir: PathBuf,
    layout: FileLayout,
    evoked_reader: E,
    volume_reader: V,
}

impl ModalityLoader {
    /// Create a loader using the JSON evoked and `.npy` volume readers.
    ///
    /// # Errors
    ///
    /// [`LoadError::DataDirNotFound`] if `data_dir` is not a directory.
    pub fn new(data_dir: impl Into<PathBuf>, layout: FileLayout) -> LoadResult<Self> {
        Self::with_readers(data_dir, layout, JsonEvokedReader, NpyVolumeReader)
    }
}

impl<E: EvokedReader, V: VolumeReader> ModalityLoader<E, V> {
    /// Create a loader with custom format readers.
    ///
    /// # Errors
    ///
    /// [`LoadError::DataDirNotFound`] if `data_dir` is not a directory.
    pub fn with_readers(
        data_dir: impl Into<PathBuf>,
        layout: FileLayout,
        evoked_reader: E,
        volume_reader: V,
    ) -> LoadResult<Self> {
        let data_dir = data_dir.into();
        if !data_dir.is_dir() {
            return Err(LoadError::DataDirNotFound { path: data_dir });
        }
        Ok(Self { data_dir, layout, evoked_reader, volume_reader })
    }

    /// Data directory the loader reads from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read `subject`'s evoked response without checking the FA map.
    ///
    /// Returns `None` when the evoked file is missing.
    ///
    /// # Errors
    ///
    /// See [`SubjectSource::load`].
    pub fn load_evoked(&self, subject: &SubjectId) -> LoadResult<Option<EvokedResponse>> {
        if subject.as_str().is_empty() {
            return Err(LoadError::EmptySubjectId);
        }
        let path = self.layout.evoked_path(&self.data_dir, subject);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(self.evoked_reader.read_evoked(&path)?.pick_meg()))
    }
}

impl<E: EvokedReader, V: VolumeReader> SubjectSource for ModalityLoader<E, V> {
    fn load(&self, subject: &SubjectId) -> LoadResult<SubjectLoad> {
        if subject.as_str().is_empty() {
            return Err(LoadError::EmptySubjectId);
        }

        let evoked_path = self.layout.evoked_path(&self.data_dir, subject);
        let fa_path = self.layout.fa_path(&self.data_dir, subject);

        for (modality, path) in [(Modality::Meg, &evoked_path), (Modality::Fa, &fa_path)] {
            if !path.is_file() {
                return Ok(SubjectLoad::Incomplete(MissingFile { modality, path: path.clone() }));
            }
        }

        let evoked = self.evoked_reader.read_evoked(&evoked_path)?.pick_meg();
        let volume = self.volume_reader.read_volume(&fa_path)?;
        debug!(
            subject = %subject,
            channels = evoked.n_channels(),
            times = evoked.n_times(),
            voxels = volume.len(),
            "Loaded subject"
        );

        Ok(SubjectLoad::Complete(SubjectData { subject: subject.clone(), evoked, volume }))
    }
}
