//! Engine configuration, optionally read from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::{RtmError, DEFAULT_BLANK_SYMBOL, DEFAULT_TAPE_CAPACITY};

/// Tunables for a single engine run.
///
/// ```toml
/// blank = "B"
/// tape_capacity = 4096
/// max_steps = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The symbol every tape cell starts with.
    pub blank: char,
    /// Number of cells allocated for each tape.
    pub tape_capacity: usize,
    /// Forward-step ceiling. `None` lets a non-halting machine loop forever.
    pub max_steps: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blank: DEFAULT_BLANK_SYMBOL,
            tape_capacity: DEFAULT_TAPE_CAPACITY,
            max_steps: None,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, RtmError> {
        let config: Self =
            toml::from_str(content).map_err(|e| RtmError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, RtmError> {
        let content = fs::read_to_string(path).map_err(|e| {
            RtmError::FileError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn with_blank(mut self, blank: char) -> Self {
        self.blank = blank;
        self
    }

    pub fn with_tape_capacity(mut self, tape_capacity: usize) -> Self {
        self.tape_capacity = tape_capacity;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), RtmError> {
        if self.tape_capacity < 2 {
            return Err(RtmError::ConfigError(format!(
                "tape_capacity must be at least 2, got {}",
                self.tape_capacity
            )));
        }
        if self.blank.is_whitespace() {
            return Err(RtmError::ConfigError(
                "blank symbol cannot be whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.blank, 'B');
        assert_eq!(config.tape_capacity, DEFAULT_TAPE_CAPACITY);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("max_steps = 50").unwrap();
        assert_eq!(config.max_steps, Some(50));
        assert_eq!(config.blank, DEFAULT_BLANK_SYMBOL);
        assert_eq!(config.tape_capacity, DEFAULT_TAPE_CAPACITY);
    }

    #[test]
    fn test_full_toml() {
        let config =
            EngineConfig::from_toml_str("blank = \"_\"\ntape_capacity = 64\nmax_steps = 7\n")
                .unwrap();
        assert_eq!(
            config,
            EngineConfig::default()
                .with_blank('_')
                .with_tape_capacity(64)
                .with_max_steps(Some(7))
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let error = EngineConfig::from_toml_str("tape_capacity = 1").unwrap_err();
        assert!(matches!(error, RtmError::ConfigError(_)));

        let error = EngineConfig::from_toml_str("blank = \" \"").unwrap_err();
        assert!(matches!(error, RtmError::ConfigError(_)));

        let error = EngineConfig::from_toml_str("tape_capacity = \"big\"").unwrap_err();
        assert!(matches!(error, RtmError::ConfigError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tape_capacity = 128").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tape_capacity, 128);
    }

    #[test]
    fn test_missing_file() {
        let error = EngineConfig::from_file(Path::new("/nonexistent/rtm.toml")).unwrap_err();
        assert!(matches!(error, RtmError::FileError(_)));
    }
}
