//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; Fast (memory) tier capacity in tiles (default: 128)
memory_capacity = {}
; Durable (disk) tier capacity in tiles (default: 4096)
disk_capacity = {}
; Durable tier directory. Tiles are stored as <directory>/<xx>/<fingerprint>.png
directory = {}
; Keep durable tiles across sessions (default: true)
persistent = {}

[workers]
; Number of render worker threads (default: 2)
count = {}
; Milliseconds an idle or paused worker waits before re-checking (default: 100)
idle_wait_ms = {}

[render]
; Theme name passed to the renderer (default: osmarender)
theme = {}
; Text scale factor (default: 1.0)
text_scale = {:?}

[logging]
; Log file, truncated at the start of every session
file = {}
"#,
        config.cache.memory_capacity,
        config.cache.disk_capacity,
        path_to_string(&config.cache.directory),
        config.cache.persistent,
        config.workers.count,
        config.workers.idle_wait_ms,
        config.render.theme,
        config.render.text_scale,
        path_to_string(&config.logging.file),
    )
}

/// Display a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
