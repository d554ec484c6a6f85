///
/// # Configuration
///
/// Settings read from `callopt.toml`. Every section and key is optional;
/// a missing file yields the defaults.
///
/// ## Example callopt.toml
///
/// ```toml
/// [optimizer]
/// # Builtins that always take the generic call path
/// disabled = ["implode"]
///
/// [output]
/// # Emit the #include lines for the kernel headers the code needs
/// headers = true
/// # Indentation level (tabs) of the emitted statements
/// indent = 1
/// ```
///

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "callopt.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub headers: bool,
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            headers: true,
            indent: 1,
        }
    }
}

impl Config {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Loads `callopt.toml` from `dir`, or the defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
[optimizer]
disabled = ["implode"]

[output]
headers = false
indent = 2
"#;
        let config = Config::parse(text, Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.optimizer.disabled, vec!["implode"]);
        assert!(!config.output.headers);
        assert_eq!(config.output.indent, 2);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::parse("[optimizer]\n", Path::new(CONFIG_FILE)).unwrap();
        assert!(config.optimizer.disabled.is_empty());
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::parse("[optimizer\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "[output]\nindent = 0\n").unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.output.indent, 0);
        assert!(config.output.headers);
    }
}
