//! Project configuration stored in `.kanban/config.yaml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Directory holding board data and configuration.
pub const KANBAN_DIR: &str = ".kanban";
pub const CONFIG_FILE: &str = "config.yaml";
/// Environment variable overriding the configured actor label.
pub const ACTOR_ENV: &str = "KANBAN_ACTOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanConfig {
    /// Attribution written into every audit entry.
    pub actor_label: String,
    /// Board file, relative to the `.kanban/` directory.
    pub data_file: PathBuf,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            actor_label: "local user".to_string(),
            data_file: PathBuf::from("board.json"),
        }
    }
}

impl KanbanConfig {
    /// Read the config from `kanban_dir`, falling back to defaults when the
    /// file does not exist. Environment overrides are applied last.
    pub fn load(kanban_dir: &Path) -> Result<Self> {
        let path = kanban_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_yaml::from_str(&raw)?
        } else {
            Self::default()
        };

        if let Ok(actor) = env::var(ACTOR_ENV) {
            if !actor.trim().is_empty() {
                config.actor_label = actor;
            }
        }

        Ok(config)
    }

    pub fn save(&self, kanban_dir: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(kanban_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }

    /// Absolute location of the board file.
    pub fn data_path(&self, kanban_dir: &Path) -> PathBuf {
        kanban_dir.join(&self.data_file)
    }
}
