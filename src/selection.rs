//! Persisted board selection.
//!
//! The selection is the set of board ids the operator picked for the wall.
//! It is stored as `{"version": 1, "board_ids": [...]}` and decides which
//! boards are fetched:
//!
//! 1. a non-empty saved selection
//! 2. otherwise `deck.board_ids` from the config file
//! 3. otherwise every board

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WallError};

const SELECTION_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SelectionFile {
    #[serde(default = "default_version")]
    version: u8,
    #[serde(default)]
    board_ids: BTreeSet<i64>,
}

fn default_version() -> u8 {
    SELECTION_VERSION
}

/// JSON-file backed board selection.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `config_dir()/selection.json`.
    pub fn default_location() -> Self {
        Self::new(crate::paths::selection_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved selection. A missing file is an empty selection.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Selection`] if the file cannot be read or parsed.
    pub fn load(&self) -> Result<BTreeSet<i64>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => {
                return Err(WallError::Selection(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let file: SelectionFile = serde_json::from_slice(&bytes)
            .map_err(|e| WallError::Selection(format!("cannot parse selection: {e}")))?;
        if file.version > SELECTION_VERSION {
            tracing::warn!(
                version = file.version,
                "selection file is newer than this build, reading it anyway"
            );
        }
        Ok(file.board_ids)
    }

    /// Persist `board_ids`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Selection`] if the file cannot be written.
    pub fn save(&self, board_ids: &BTreeSet<i64>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WallError::Selection(format!("cannot create selection dir: {e}")))?;
        }

        let file = SelectionFile {
            version: SELECTION_VERSION,
            board_ids: board_ids.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| WallError::Selection(format!("cannot serialize selection: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| WallError::Selection(format!("cannot write selection: {e}")))?;

        tracing::debug!(path = %self.path.display(), boards = board_ids.len(), "selection saved");
        Ok(())
    }
}

/// Board ids to fetch for a saved selection and configured fallback ids.
/// Empty means all boards.
pub fn effective_filter(selection: &BTreeSet<i64>, configured: &[i64]) -> Vec<i64> {
    if selection.is_empty() {
        configured.to_vec()
    } else {
        selection.iter().copied().collect()
    }
}
