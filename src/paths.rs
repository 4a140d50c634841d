//! Filesystem locations used by the display engine.
//!
//! | Purpose | Linux | macOS |
//! |---------|-------|-------|
//! | Config + selection | `~/.config/taskwall/` | `~/Library/Application Support/taskwall/` |
//!
//! `TASKWALL_CONFIG_DIR` overrides [`config_dir`]. Logs go wherever
//! `logging.directory` points; there is no default log location.

use std::path::PathBuf;

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TASKWALL_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("taskwall"))
        .unwrap_or_else(|| PathBuf::from("/tmp/taskwall-config"))
}

/// `config_dir()/config.toml`.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// `config_dir()/selection.json`.
#[must_use]
pub fn selection_file() -> PathBuf {
    config_dir().join("selection.json")
}
