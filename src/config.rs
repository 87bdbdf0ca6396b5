use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use sportlib_core::SportsLibrary;

const DEFAULT_LIBRARY_NAME: &str = "sportlib";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the library's documents
    pub data_dir: ConfigValue<PathBuf>,
    /// Library name, used for the default data directory
    pub library_name: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    library_name: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with a custom environment lookup.
    pub fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut library_name =
            ConfigValue::new(DEFAULT_LIBRARY_NAME.to_string(), ConfigSource::Default);
        let mut data_dir: Option<ConfigValue<PathBuf>> = None;
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative paths are relative to the config file
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = Some(ConfigValue::new(resolved, ConfigSource::File));
            }
            if let Some(name) = file_config.library_name {
                library_name = ConfigValue::new(name, ConfigSource::File);
            }
        }

        if let Some(dir) = env("SPORTLIB_DATA_DIR") {
            data_dir = Some(ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment));
        }
        if let Some(name) = env("SPORTLIB_LIBRARY_NAME") {
            library_name = ConfigValue::new(name, ConfigSource::Environment);
        }

        let data_dir = data_dir.unwrap_or_else(|| {
            ConfigValue::new(
                SportsLibrary::default_data_dir(&library_name.value),
                ConfigSource::Default,
            )
        });

        Ok(Self {
            data_dir,
            library_name,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/sportlib/
    /// - macOS: ~/Library/Application Support/sportlib/
    /// - Windows: %APPDATA%/sportlib/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_LIBRARY_NAME)
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config.data_dir.value.ends_with("sportlib"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.library_name.value, "sportlib");
        assert_eq!(config.library_name.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /custom/sport").unwrap();
        writeln!(file, "library_name: running").unwrap();

        let config = Config::load_with_env(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/sport"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.library_name.value, "running");
        assert_eq!(config.library_name.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolved_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: data\n").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("data"));
    }

    #[test]
    fn test_library_name_drives_default_data_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "library_name: marathon\n").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config.data_dir.value.ends_with("marathon"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: /from/file\nlibrary_name: file\n").unwrap();

        let env = |name: &str| match name {
            "SPORTLIB_DATA_DIR" => Some("/from/env".to_string()),
            _ => None,
        };
        let config = Config::load_with_env(Some(config_path), env).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/from/env"));
        assert_eq!(config.data_dir.source, ConfigSource::Environment);
        assert_eq!(config.library_name.source, ConfigSource::File);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let err = Config::load_with_env(Some(config_path), no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
