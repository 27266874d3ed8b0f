use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::Board;
use crate::error::Result;

/// Board persistence in a single JSON file.
///
/// Reads and writes are best effort: `load` falls back to an empty board and
/// `save` logs failures instead of returning them.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the board; missing or corrupt data yields a fresh empty board.
    pub fn load(&self) -> Board {
        match self.try_load() {
            Ok(Some(board)) => board,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no board file, starting empty");
                Board::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load board, starting empty"
                );
                Board::new()
            }
        }
    }

    /// Save the board stamped with the current schema version.
    pub fn save(&self, board: &Board) {
        if let Err(e) = self.try_save(board) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save board");
        }
    }

    pub fn try_load(&self) -> Result<Option<Board>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let board: Board = serde_json::from_str(&raw)?;
        Ok(Some(board))
    }

    /// Write through a temporary sibling file and rename it into place.
    pub fn try_save(&self, board: &Board) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&board.stamped())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
