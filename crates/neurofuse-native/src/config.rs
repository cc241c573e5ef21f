//! Pipeline configuration
//!
//! Every field has a default matching the hackathon run layout (MEG in
//! `meg/`, FA maps in `dti/`, global z-scoring of both modalities, 11
//! components), so a config file only needs the fields it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use neurofuse_core::{NormAxis, RegionOrder, SubjectId, SubstringLabeler};

use crate::cohort::MissingRegionPolicy;
use crate::error::{ConfigError, ConfigResult};

/// Placeholder replaced by the subject identifier in file patterns.
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

// ============================================================================
// File Layout
// ============================================================================

/// Where each subject's files live under the data directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayout {
    /// Subdirectory holding evoked responses
    pub evoked_dir: String,
    /// Evoked response file name, with `{subject}` placeholder
    pub evoked_pattern: String,
    /// Subdirectory holding FA maps
    pub fa_dir: String,
    /// FA map file name, with `{subject}` placeholder
    pub fa_pattern: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            evoked_dir: "meg".to_string(),
            evoked_pattern: "{subject}_ses-01_task-haririhammer_ave.json".to_string(),
            fa_dir: "dti".to_string(),
            fa_pattern: "{subject}_FA.npy".to_string(),
        }
    }
}

impl FileLayout {
    /// Path of `subject`'s evoked response under `data_dir`.
    #[must_use]
    pub fn evoked_path(&self, data_dir: &Path, subject: &SubjectId) -> PathBuf {
        data_dir
            .join(&self.evoked_dir)
            .join(self.evoked_pattern.replace(SUBJECT_PLACEHOLDER, subject.as_str()))
    }

    /// Path of `subject`'s FA map under `data_dir`.
    #[must_use]
    pub fn fa_path(&self, data_dir: &Path, subject: &SubjectId) -> PathBuf {
        data_dir
            .join(&self.fa_dir)
            .join(self.fa_pattern.replace(SUBJECT_PLACEHOLDER, subject.as_str()))
    }
}

// ============================================================================
// Pipeline Configuration
// ============================================================================

/// Full configuration of one pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory holding per-subject data; outputs are written here too
    pub data_dir: PathBuf,
    /// Per-subject file naming
    pub layout: FileLayout,
    /// Character window of the channel name that names its region
    pub labeler: SubstringLabeler,
    /// Fixed region order; when absent the first retained subject defines it
    pub region_order: Option<RegionOrder>,
    /// What to do with a subject lacking a region of the order
    pub on_missing_region: MissingRegionPolicy,
    /// Normalization axis for the FA matrix
    pub fa_axis: NormAxis,
    /// Normalization axis for the LFP matrix
    pub lfp_axis: NormAxis,
    /// Number of independent components to extract
    pub n_components: usize,
    /// Seed for the decomposition's random initialization
    pub seed: usize,
    /// Components output file name, relative to `data_dir`; defaults to
    /// `ica_<n_components>components.npy`
    pub output_file: Option<String>,
    /// Also write the fused matrix under this name, relative to `data_dir`
    pub fused_file: Option<String>,
    /// Also write the region order used under this name, relative to `data_dir`
    pub region_order_file: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            layout: FileLayout::default(),
            labeler: SubstringLabeler::default(),
            region_order: None,
            on_missing_region: MissingRegionPolicy::default(),
            fa_axis: NormAxis::Global,
            lfp_axis: NormAxis::Global,
            n_components: 11,
            seed: 42,
            output_file: None,
            fused_file: None,
            region_order_file: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.n_components == 0 {
            return Err(invalid("n_components", "must be at least 1"));
        }
        if self.labeler.len == 0 {
            return Err(invalid("labeler.len", "must be at least 1"));
        }
        for (field, pattern) in [
            ("layout.evoked_pattern", &self.layout.evoked_pattern),
            ("layout.fa_pattern", &self.layout.fa_pattern),
        ] {
            if !pattern.contains(SUBJECT_PLACEHOLDER) {
                return Err(invalid(field, format!("'{pattern}' lacks {SUBJECT_PLACEHOLDER}")));
            }
        }
        if self.output_file.as_deref() == Some("") {
            return Err(invalid("output_file", "must not be empty"));
        }
        if matches!(&self.region_order, Some(order) if order.is_empty()) {
            return Err(invalid("region_order", "must list at least one region"));
        }
        Ok(())
    }

    /// Path of the components output file.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        match &self.output_file {
            Some(name) => self.data_dir.join(name),
            None => self.data_dir.join(format!("ica_{}components.npy", self.n_components)),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.n_components, 11);
        assert_eq!(config.fa_axis, NormAxis::Global);
        assert_eq!(config.output_path(), PathBuf::from("./ica_11components.npy"));
    }

    #[test]
    fn test_default_output_name_follows_component_count() {
        let config = PipelineConfig { n_components: 5, ..PipelineConfig::default() };
        assert_eq!(config.output_path(), PathBuf::from("./ica_5components.npy"));

        let config = PipelineConfig {
            n_components: 5,
            output_file: Some("jica.npy".to_string()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.output_path(), PathBuf::from("./jica.npy"));
    }

    #[test]
    fn test_layout_paths() {
        let layout = FileLayout::default();
        let subject = SubjectId::from("sub-ON97504");
        let root = Path::new("/data");

        assert_eq!(
            layout.evoked_path(root, &subject),
            PathBuf::from("/data/meg/sub-ON97504_ses-01_task-haririhammer_ave.json")
        );
        assert_eq!(layout.fa_path(root, &subject), PathBuf::from("/data/dti/sub-ON97504_FA.npy"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"n_components": 4, "lfp_axis": "features", "region_order": ["LC", "RF"],
                "layout": {"fa_pattern": "FA_{subject}.npy"}, "on_missing_region": "skip"}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.n_components, 4);
        assert_eq!(config.lfp_axis, NormAxis::Features);
        assert_eq!(config.fa_axis, NormAxis::Global);
        assert_eq!(config.layout.fa_pattern, "FA_{subject}.npy");
        assert_eq!(config.layout.evoked_dir, "meg");
        assert_eq!(config.on_missing_region, MissingRegionPolicy::Skip);
        assert_eq!(config.region_order.unwrap().len(), 2);
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let mut config = PipelineConfig::default();
        config.n_components = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "n_components", .. })));

        let mut config = PipelineConfig::default();
        config.layout.evoked_pattern = "ave.json".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "layout.evoked_pattern", .. })
        ));

        let mut config = PipelineConfig::default();
        config.labeler = SubstringLabeler::new(1, 0);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.output_file = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "output_file", .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.region_order = Some(RegionOrder::from_labels(["ZC", "LF"]));
        config.seed = usize::MAX;
        let json = config.to_json().unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unreadable_config() {
        let err = PipelineConfig::from_json_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
