//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MAX_WORKERS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("memory_capacity") {
            config.cache.memory_capacity =
                parse_number(v, "cache", "memory_capacity", "must be a tile count")?;
        }
        if let Some(v) = section.get("disk_capacity") {
            config.cache.disk_capacity =
                parse_number(v, "cache", "disk_capacity", "must be a tile count")?;
        }
        if let Some(v) = section.get("persistent") {
            config.cache.persistent = parse_bool(v, "cache", "persistent")?;
        }
    }

    // [workers] section
    if let Some(section) = ini.section(Some("workers")) {
        if let Some(v) = section.get("count") {
            let count: usize = parse_number(v, "workers", "count", "must be a positive integer")?;
            if count == 0 || count > MAX_WORKERS {
                return Err(invalid(
                    "workers",
                    "count",
                    v,
                    &format!("must be between 1 and {}", MAX_WORKERS),
                ));
            }
            config.workers.count = count;
        }
        if let Some(v) = section.get("idle_wait_ms") {
            let ms: u64 = parse_number(v, "workers", "idle_wait_ms", "must be milliseconds")?;
            if ms == 0 {
                return Err(invalid("workers", "idle_wait_ms", v, "must be greater than 0"));
            }
            config.workers.idle_wait_ms = ms;
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("theme") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("render", "theme", v, "must not be empty"));
            }
            config.render.theme = v.to_string();
        }
        if let Some(v) = section.get("text_scale") {
            let scale: f32 = parse_number(v, "render", "text_scale", "must be a number")?;
            if !scale.is_finite() || scale <= 0.0 {
                return Err(invalid("render", "text_scale", v, "must be greater than 0"));
            }
            config.render.text_scale = scale;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_bool(value: &str, section: &str, key: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
