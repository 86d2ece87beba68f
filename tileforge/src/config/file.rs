//! Reading and writing `~/.tileforge/config.ini`.
//!
//! A missing file means "use the defaults"; the file is only created on an
//! explicit [`ConfigFile::write`]. Writes go through a sibling temporary file
//! so a reader never sees a half-written configuration.

use super::settings::ConfigFile;
use ini::Ini;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = ".tileforge";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Refused to replace an existing file
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// A key holds a value outside its allowed range or format
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// The file to use: `explicit` if given, else [`config_file_path`].
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit.map(Path::to_path_buf).unwrap_or_else(config_file_path)
    }

    /// Load the configuration from `explicit` or the default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigFileError> {
        Self::read(&Self::resolve_path(explicit))
    }

    /// Parse the file at `path`, falling back to defaults if it is absent.
    pub fn read(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        super::parser::parse_ini(&ini)
    }

    /// Write this configuration to `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigFileError::AlreadyExists`] if `path` exists and `overwrite`
    /// is false; [`ConfigFileError::Write`] if the file or its directory
    /// cannot be written.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<(), ConfigFileError> {
        if path.exists() && !overwrite {
            return Err(ConfigFileError::AlreadyExists(path.to_path_buf()));
        }
        let write_error = |source: io::Error| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let staging = path.with_extension("ini.tmp");
        fs::write(&staging, super::writer::to_config_string(self)).map_err(write_error)?;
        fs::rename(&staging, path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            write_error(e)
        })
    }
}

/// `~/.tileforge`, or `./.tileforge` when there is no home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
}

/// `~/.tileforge/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.cache.memory_capacity, DEFAULT_CONFIG_MEMORY_CAPACITY);
        assert_eq!(config.cache.disk_capacity, DEFAULT_CONFIG_DISK_CAPACITY);
        assert!(config.cache.persistent);
        assert_eq!(config.workers.count, DEFAULT_CONFIG_WORKERS);
        assert_eq!(config.workers.idle_wait_ms, 100);
        assert_eq!(config.render.theme, "osmarender");
        assert!(config.logging.file.ends_with(".tileforge/tileforge.log"));
    }

    #[test]
    fn test_read_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigFile::read(&temp_dir.path().join("nonexistent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sub").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.directory = temp_dir.path().join("tiles");
        config.cache.memory_capacity = 7;
        config.cache.persistent = false;
        config.workers.count = 3;
        config.render.theme = "night".to_string();
        config.render.text_scale = 1.5;
        config.write(&path, false).unwrap();

        assert_eq!(ConfigFile::read(&path).unwrap(), config);
        assert!(!path.with_extension("ini.tmp").exists());
    }

    #[test]
    fn test_write_refuses_to_replace_without_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        let mut custom = ConfigFile::default();
        custom.workers.count = 5;
        custom.write(&path, false).unwrap();

        let err = ConfigFile::default().write(&path, false).unwrap_err();
        assert!(matches!(err, ConfigFileError::AlreadyExists(ref p) if p == &path));
        assert_eq!(ConfigFile::read(&path).unwrap().workers.count, 5);

        ConfigFile::default().write(&path, true).unwrap();
        assert_eq!(ConfigFile::read(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_read_malformed_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        fs::write(&path, "[cache\nmemory_capacity = 1\n").unwrap();

        let err = ConfigFile::read(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::Read { .. }));
        assert!(err.to_string().contains("config.ini"));
    }

    #[test]
    fn test_load_prefers_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.ini");
        let mut config = ConfigFile::default();
        config.render.theme = "explicit".to_string();
        config.write(&path, false).unwrap();

        assert_eq!(ConfigFile::resolve_path(Some(&path)), path);
        assert_eq!(ConfigFile::load(Some(&path)).unwrap().render.theme, "explicit");
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".tileforge/config.ini"));
        assert_eq!(ConfigFile::resolve_path(None), config_file_path());
    }
}
