//! Configuration module for albumr
//!
//! Manages the named album libraries and where their derived data lives.
//! Configuration is stored in the user's config directory.

mod setup;

pub use setup::first_time_setup;

use crate::library::Library;
use crate::metadata::ThumbnailSpec;
use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Path display format
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathFormat {
    /// Display absolute paths
    #[default]
    Absolute,
    /// Display paths relative to the current directory
    Relative,
}

impl std::str::FromStr for PathFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absolute" => Ok(Self::Absolute),
            "relative" => Ok(Self::Relative),
            other => Err(ConfigError::Message(format!(
                "Invalid path format '{other}' (expected 'absolute' or 'relative')"
            ))),
        }
    }
}

/// Keys accepted by `config get` and `config set`
pub const SETTING_KEYS: &[&str] = &[
    "quiet",
    "path_format",
    "data_dir",
    "thumbnail.width",
    "thumbnail.height",
    "thumbnail.quality",
];

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AlbumrConfig {
    /// Map of library names to their album directories
    #[serde(default)]
    pub libraries: HashMap<String, PathBuf>,

    /// The library to use when none is specified
    #[serde(default)]
    pub default_library: Option<String>,

    /// Root of the per-library data directories
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Default format for displaying paths
    #[serde(default)]
    pub path_format: PathFormat,

    /// Cover thumbnail geometry
    #[serde(default)]
    pub thumbnail: ThumbnailSpec,
}

impl AlbumrConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("albumr").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::from_file(config_path)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Load configuration, running first-time setup if config doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading or creating the configuration fails.
    pub fn load_or_setup() -> Result<Self, ConfigError> {
        if Self::config_path()?.exists() {
            Self::load()
        } else {
            first_time_setup()
        }
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))
    }

    /// Root of the per-library data directories
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no data directory is configured and the system
    /// one cannot be determined.
    pub fn data_root(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("albumr"))
            .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))
    }

    /// Resolve a library by name, falling back to the default library
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no name is given and there is no default, or
    /// the name is not configured.
    pub fn library(&self, name: Option<&str>) -> Result<Library, ConfigError> {
        let name = name
            .or(self.default_library.as_deref())
            .ok_or_else(|| ConfigError::Message("No library specified and no default library set".to_string()))?;
        let work_dir = self
            .libraries
            .get(name)
            .ok_or_else(|| ConfigError::Message(format!("Library '{name}' does not exist in configuration")))?;

        Ok(Library::new(name, work_dir, self.data_root()?.join(name)).with_thumbnail(self.thumbnail.normalized()))
    }

    /// Add a library to the configuration
    ///
    /// The first library added becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if saving the configuration fails.
    pub fn add_library(&mut self, name: String, path: PathBuf) -> Result<(), ConfigError> {
        if self.default_library.is_none() {
            self.default_library = Some(name.clone());
        }
        self.libraries.insert(name, path);
        self.save()
    }

    /// Remove a library from the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if saving the configuration fails.
    pub fn remove_library(&mut self, name: &str) -> Result<Option<PathBuf>, ConfigError> {
        let removed = self.libraries.remove(name);
        if self.default_library.as_deref() == Some(name) {
            self.default_library = None;
        }
        self.save()?;
        Ok(removed)
    }

    /// Set the default library
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the library name doesn't exist in the
    /// configuration or if saving the configuration fails.
    pub fn set_default_library(&mut self, name: String) -> Result<(), ConfigError> {
        if !self.libraries.contains_key(&name) {
            return Err(ConfigError::Message(format!(
                "Library '{name}' does not exist in configuration"
            )));
        }
        self.default_library = Some(name);
        self.save()
    }

    /// List all library names, sorted
    #[must_use]
    pub fn list_libraries(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.libraries.keys().collect();
        names.sort();
        names
    }

    /// Read a setting as display text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for keys outside [`SETTING_KEYS`].
    pub fn get_value(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "quiet" => self.quiet.to_string(),
            "path_format" => match self.path_format {
                PathFormat::Absolute => "absolute".to_string(),
                PathFormat::Relative => "relative".to_string(),
            },
            "data_dir" => self.data_root()?.display().to_string(),
            "thumbnail.width" => self.thumbnail.width.to_string(),
            "thumbnail.height" => self.thumbnail.height.to_string(),
            "thumbnail.quality" => self.thumbnail.quality.to_string(),
            _ => return Err(unknown_key(key)),
        })
    }

    /// Change a setting in memory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unknown keys and values that do not parse.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "quiet" => self.quiet = parse_value(key, value)?,
            "path_format" => self.path_format = value.parse()?,
            "data_dir" => self.data_dir = (!value.is_empty()).then(|| PathBuf::from(value)),
            "thumbnail.width" => {
                self.thumbnail = self
                    .thumbnail
                    .with_width(parse_dimension(key, value)?)
                    .ok_or_else(|| ConfigError::Message(format!("{key} must be a multiple of 3 (height follows at 3:4)")))?;
            }
            "thumbnail.height" => {
                self.thumbnail = self
                    .thumbnail
                    .with_height(parse_dimension(key, value)?)
                    .ok_or_else(|| ConfigError::Message(format!("{key} must be a multiple of 4 (width follows at 3:4)")))?;
            }
            "thumbnail.quality" => {
                let quality: u8 = parse_value(key, value)?;
                if !(1..=100).contains(&quality) {
                    return Err(ConfigError::Message(format!("{key} must be between 1 and 100")));
                }
                self.thumbnail.quality = quality;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::Message(format!(
        "Unknown setting '{key}' (expected one of: {})",
        SETTING_KEYS.join(", ")
    ))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Message(format!("Invalid value '{value}' for {key}")))
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, ConfigError> {
    match parse_value(key, value)? {
        0 => Err(ConfigError::Message(format!("{key} must be greater than zero"))),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_with(libraries: &[(&str, &str)]) -> AlbumrConfig {
        let mut config = AlbumrConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..AlbumrConfig::default()
        };
        for (name, path) in libraries {
            config.libraries.insert((*name).to_string(), PathBuf::from(path));
        }
        config
    }

    #[test]
    fn test_default_config() {
        let config = AlbumrConfig::default();
        assert!(config.libraries.is_empty());
        assert!(config.default_library.is_none());
        assert_eq!(config.thumbnail, ThumbnailSpec::default());
    }

    #[test]
    fn test_library_resolution_uses_default() {
        let mut config = config_with(&[("home", "/albums/home"), ("work", "/albums/work")]);
        config.default_library = Some("home".to_string());

        let library = config.library(None).unwrap();
        assert_eq!(library.name, "home");
        assert_eq!(library.work_dir, Path::new("/albums/home"));
        assert_eq!(library.data_dir, Path::new("/data/home"));

        let library = config.library(Some("work")).unwrap();
        assert_eq!(library.data_dir, Path::new("/data/work"));
    }

    #[test]
    fn test_library_gets_three_by_four_thumbnails_from_hand_edited_file() {
        let mut config = config_with(&[("home", "/albums/home")]);
        config.thumbnail.height = 500;

        let library = config.library(Some("home")).unwrap();
        assert_eq!((library.thumbnail.width, library.thumbnail.height), (300, 400));
    }

    #[test]
    fn test_library_resolution_errors() {
        let config = config_with(&[("home", "/albums/home")]);
        assert!(config.library(None).is_err());
        assert!(config.library(Some("missing")).is_err());
    }

    #[test]
    fn test_list_libraries_sorted() {
        let config = config_with(&[("gamma", "/g"), ("alpha", "/a"), ("beta", "/b")]);
        assert_eq!(config.list_libraries(), [&"alpha".to_string(), &"beta".to_string(), &"gamma".to_string()]);
    }

    #[test]
    fn test_set_and_get_values() {
        let mut config = config_with(&[]);
        config.set_value("quiet", "true").unwrap();
        config.set_value("path_format", "Relative").unwrap();
        config.set_value("thumbnail.width", "150").unwrap();
        config.set_value("thumbnail.quality", "70").unwrap();

        assert!(config.quiet);
        assert_eq!(config.path_format, PathFormat::Relative);
        assert_eq!(config.get_value("thumbnail.width").unwrap(), "150");
        assert_eq!(config.get_value("thumbnail.height").unwrap(), "200");
        assert_eq!(config.get_value("thumbnail.quality").unwrap(), "70");
        assert_eq!(config.get_value("data_dir").unwrap(), "/data");
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = config_with(&[]);
        assert!(config.set_value("quiet", "maybe").is_err());
        assert!(config.set_value("thumbnail.height", "0").is_err());
        assert!(config.set_value("thumbnail.width", "100").is_err());
        assert!(config.set_value("thumbnail.height", "250").is_err());
        assert_eq!(config.thumbnail, ThumbnailSpec::default());
        assert!(config.set_value("thumbnail.quality", "101").is_err());
        assert!(config.set_value("colour", "red").is_err());
        assert!(config.get_value("colour").is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_thumbnail() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = config_with(&[("home", "/albums/home")]);
        config.thumbnail.height = 500;
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AlbumrConfig::from_file(path).unwrap();
        assert_eq!(loaded.thumbnail.height, 500);
        assert_eq!(loaded.libraries.get("home"), Some(&PathBuf::from("/albums/home")));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "quiet = true\n").unwrap();

        let loaded = AlbumrConfig::from_file(path).unwrap();
        assert!(loaded.quiet);
        assert!(loaded.libraries.is_empty());
        assert_eq!(loaded.thumbnail, ThumbnailSpec::default());
    }
}
