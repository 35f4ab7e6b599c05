//! Shared configuration for the question answerer.
//!
//! Defaults carry the fixed values the adapter uses when nothing else is
//! supplied. A JSON file may override any subset of fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CoreError;
use crate::delegate::{CPU_FALLBACK_THREADS, DelegatePolicy, NNAPI_MIN_PLATFORM_VERSION};

/// Name of the bundled model directory under the assets directory.
pub const BERT_QA_MODEL: &str = "mobilebert";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Directory holding packaged model assets.
    pub assets_dir: PathBuf,
    /// Model directory name inside `assets_dir`.
    pub model: String,
    /// Threads used by the CPU fallback delegate.
    pub cpu_threads: usize,
    pub nnapi_min_platform_version: u32,
    /// Platform version reported to delegate selection. `None` means the
    /// platform has no NNAPI (desktop hosts).
    pub platform_version: Option<u32>,
    pub max_seq_len: usize,
    pub max_query_len: usize,
    pub max_answer_len: usize,
    pub num_answers: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("models"),
            model: BERT_QA_MODEL.to_string(),
            cpu_threads: CPU_FALLBACK_THREADS,
            nnapi_min_platform_version: NNAPI_MIN_PLATFORM_VERSION,
            platform_version: None,
            max_seq_len: 384,
            max_query_len: 64,
            max_answer_len: 32,
            num_answers: 5,
        }
    }
}

impl QaConfig {
    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Full path of the bundled model directory.
    pub fn model_dir(&self) -> PathBuf {
        self.assets_dir.join(&self.model)
    }

    pub fn delegate_policy(&self) -> DelegatePolicy {
        DelegatePolicy {
            nnapi_min_platform_version: self.nnapi_min_platform_version,
            cpu_threads: self.cpu_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_fixed_values() {
        let config = QaConfig::default();
        assert_eq!(config.cpu_threads, 4);
        assert_eq!(config.nnapi_min_platform_version, 27);
        assert_eq!(config.model, "mobilebert");
        assert_eq!(config.model_dir(), PathBuf::from("models/mobilebert"));
        assert_eq!(config.platform_version, None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "assets_dir": "/opt/assets", "platform_version": 30 }}"#).unwrap();

        let config = QaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.assets_dir, PathBuf::from("/opt/assets"));
        assert_eq!(config.platform_version, Some(30));
        assert_eq!(config.cpu_threads, 4);
        assert_eq!(config.num_answers, 5);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = QaConfig::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound(_)));
    }

    #[test]
    fn malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = QaConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn policy_follows_config() {
        let config = QaConfig {
            cpu_threads: 2,
            nnapi_min_platform_version: 29,
            ..QaConfig::default()
        };
        let policy = config.delegate_policy();
        assert_eq!(policy.cpu_threads, 2);
        assert_eq!(policy.nnapi_min_platform_version, 29);
    }
}
