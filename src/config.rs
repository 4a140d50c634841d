//! Configuration types for the display engine.
//!
//! Stored as TOML. Every section is `#[serde(default)]`, so a file only
//! needs the keys that differ from the defaults:
//!
//! ```toml
//! [deck]
//! base_url = "https://cloud.example.org"
//! username = "foyer"
//! app_password = "xxxxx-xxxxx-xxxxx-xxxxx-xxxxx"
//! board_ids = [3, 7]
//!
//! [rotation]
//! base_duration_ms = 30000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WallError};
use taskwall_deck::DeckConfig;

/// Environment variable that overrides `deck.app_password`.
pub const PASSWORD_ENV: &str = "TASKWALL_DECK_PASSWORD";

/// Log filter used when neither `RUST_LOG` nor `logging.filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "taskwall=info,taskwall_deck=info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Board service location, credentials and board filter.
    pub deck: DeckSettings,
    /// Board rotation timing.
    pub rotation: RotationConfig,
    /// Urgency thresholds and priority keywords.
    pub urgency: UrgencyConfig,
    /// Task list presentation.
    pub display: DisplayConfig,
    /// Background refresh.
    pub refresh: RefreshConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Board service settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckSettings {
    /// Server root, e.g. `https://cloud.example.org`.
    pub base_url: String,
    /// Basic-auth user name.
    pub username: String,
    /// App password. [`PASSWORD_ENV`] takes precedence when set.
    pub app_password: String,
    /// Boards to show when no selection has been saved. Empty = all boards.
    pub board_ids: Vec<i64>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent (None = `taskwall/<version>`).
    pub user_agent: Option<String>,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            app_password: String::new(),
            board_ids: Vec::new(),
            timeout_seconds: 15,
            user_agent: None,
        }
    }
}

impl std::fmt::Debug for DeckSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .field("board_ids", &self.board_ids)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DeckSettings {
    /// Client configuration, with the password taken from [`PASSWORD_ENV`]
    /// when that variable is set and non-empty.
    pub fn to_deck_config(&self) -> DeckConfig {
        self.to_deck_config_with(std::env::var(PASSWORD_ENV).ok())
    }

    /// Client configuration with an explicit password override.
    pub fn to_deck_config_with(&self, password_override: Option<String>) -> DeckConfig {
        let password = password_override
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.app_password.clone());
        DeckConfig {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password,
            timeout_seconds: self.timeout_seconds,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Board rotation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Display time of a board with five or more urgent cards, in ms.
    /// Boards with fewer urgent cards get a fraction of this.
    pub base_duration_ms: u64,
    /// Progress update interval in ms.
    pub progress_tick_ms: u64,
    /// Pause between boards in ms.
    pub transition_ms: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            base_duration_ms: 40_000,
            progress_tick_ms: 100,
            transition_ms: 150,
        }
    }
}

impl RotationConfig {
    pub fn base_duration(&self) -> Duration {
        Duration::from_millis(self.base_duration_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Urgency thresholds (in days) and extra priority keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyConfig {
    /// A card due within this many days is shown as urgent.
    pub urgent_threshold_days: u32,
    /// A card due within this many days counts toward rotation urgency.
    pub upcoming_threshold_days: u32,
    /// Overdue cards older than this stop counting as urgent and sort as
    /// if they had no due date.
    pub max_overdue_days: u32,
    /// Label fragments treated as high priority in addition to "high" and
    /// "urgent".
    pub high_keywords: Vec<String>,
    /// Label fragments treated as low priority in addition to "low".
    pub low_keywords: Vec<String>,
}

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self {
            urgent_threshold_days: 3,
            upcoming_threshold_days: 7,
            max_overdue_days: 30,
            high_keywords: Vec::new(),
            low_keywords: Vec::new(),
        }
    }
}

/// Task list presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum number of tasks shown for the current board.
    pub task_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { task_limit: 5 }
    }
}

/// Background refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between background refreshes.
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 20 * 60,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Log output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file. None = stderr only.
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn effective_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

impl WallConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `deck.base_url` is set and is an `http`/`https` URL
    /// - `deck.timeout_seconds`, rotation durations, `display.task_limit`
    ///   and `refresh.interval_secs` are greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.deck.base_url.trim().is_empty() {
            return Err(WallError::Config("deck.base_url must be set".into()));
        }
        self.deck
            .to_deck_config_with(None)
            .validate()
            .map_err(|e| WallError::Config(format!("invalid [deck] section: {e}")))?;

        let positive = [
            ("rotation.base_duration_ms", self.rotation.base_duration_ms),
            ("rotation.progress_tick_ms", self.rotation.progress_tick_ms),
            ("refresh.interval_secs", self.refresh.interval_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(WallError::Config(format!("{name} must be greater than 0")));
            }
        }
        if self.display.task_limit == 0 {
            return Err(WallError::Config(
                "display.task_limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| WallError::Config(e.to_string()))
    }

    /// Load from `path`, or return defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`WallConfig::from_file`] for a file that exists.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WallError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (see [`crate::paths::config_file`]).
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }
}
