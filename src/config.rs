//! Compiler configuration: optional ~/.cadenza/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::orchestrator::{adapter_for, Orchestrator};

/// Settings shared by the CLI and library callers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Adapter names to register, in priority order for equal confidence.
    #[serde(default = "CompilerConfig::default_languages")]
    pub languages: Vec<String>,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Where compiled artifacts go when no explicit output path is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            languages: Self::default_languages(),
            log_level: None,
            output_dir: None,
        }
    }
}

impl CompilerConfig {
    fn default_languages() -> Vec<String> {
        vec!["EMEL".to_string(), "SUSL".to_string()]
    }

    /// Default path: ~/.cadenza/config.yaml.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".cadenza");
        path.push("config.yaml");
        path
    }

    /// Load from the default path, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        Self::load_or_default(&Self::default_path())
    }

    /// Like [`load_from`](Self::load_from), but an unreadable or invalid file
    /// is logged and replaced by the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save as YAML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }

    /// An orchestrator with the configured languages. Unknown names are
    /// skipped.
    pub fn build_orchestrator(&self) -> Orchestrator {
        let mut orchestrator = Orchestrator::new();
        for name in &self.languages {
            match adapter_for(name) {
                Some(adapter) => orchestrator.register(adapter),
                None => warn!("unknown language {name:?} in configuration, skipping"),
            }
        }
        orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_both_languages() {
        let config = CompilerConfig::default();
        let orchestrator = config.build_orchestrator();
        assert_eq!(orchestrator.languages().collect::<Vec<_>>(), vec!["EMEL", "SUSL"]);
    }

    #[test]
    fn partial_yaml_keeps_default_languages() {
        let config: CompilerConfig = serde_yaml::from_str("log_level: debug\n").unwrap();
        assert_eq!(config.languages, vec!["EMEL", "SUSL"]);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn unknown_languages_are_skipped() {
        let config = CompilerConfig {
            languages: vec!["susl".into(), "abc".into()],
            ..Default::default()
        };
        let orchestrator = config.build_orchestrator();
        assert_eq!(orchestrator.languages().collect::<Vec<_>>(), vec!["SUSL"]);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert_eq!(CompilerConfig::load_or_default(&path), CompilerConfig::default());

        std::fs::write(&path, "languages: {EMEL\n").unwrap();
        assert_eq!(CompilerConfig::load_or_default(&path), CompilerConfig::default());

        std::fs::write(&path, "log_level: info\n").unwrap();
        let loaded = CompilerConfig::load_or_default(&path);
        assert_eq!(loaded.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn invalid_yaml_is_invalid_data() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "languages: [EMEL\n").unwrap();
        let err = CompilerConfig::load_from(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
