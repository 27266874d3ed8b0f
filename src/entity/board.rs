// src/entity/board.rs
use serde::{Deserialize, Serialize};

use super::{AuditEntry, Task};

/// Version stamped on every saved or exported board.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// The aggregate root: tasks in insertion order plus the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub tasks: Vec<Task>,
    #[serde(rename = "auditLogs")]
    pub audit_log: Vec<AuditEntry>,
    #[serde(default = "current_version")]
    pub version: String,
}

fn current_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for Board {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            audit_log: Vec::new(),
            version: current_version(),
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Copy of this board carrying the current schema version.
    pub fn stamped(&self) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            ..self.clone()
        }
    }
}
