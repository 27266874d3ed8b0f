// src/entity/task.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldError;

/// Minimum number of characters in a task title.
pub const MIN_TITLE_LENGTH: usize = 3;
/// Upper bound of the grading scale.
pub const MAX_GRADING_SCORE: f64 = 10.0;
/// Grading scores move in half-point steps.
pub const GRADING_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact: the search language treats `p:HIGH` as invalid.
impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Invalid task priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub estimate_minutes: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_notes: Option<String>,
}

impl Task {
    /// Build a fresh task from a draft. Status always starts at `todo`.
    pub fn from_draft(draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_task_id(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            priority: draft.priority,
            tags: draft.tags,
            estimate_minutes: draft.estimate_minutes,
            created_at,
            due_at: draft.due_at,
            status: TaskStatus::Todo,
            grading_score: draft.grading_score,
            grading_notes: draft.grading_notes,
        }
    }

    /// Shape constraints shared by creation and update.
    pub fn validate(&self) -> Vec<FieldError> {
        validate_fields(&self.title, self.estimate_minutes, self.grading_score)
    }
}

/// Generate a new opaque task id.
pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub estimate_minutes: u32,
    pub due_at: Option<DateTime<Utc>>,
    pub grading_score: Option<f64>,
    pub grading_notes: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, estimate_minutes: u32) -> Self {
        Self {
            title: title.into(),
            estimate_minutes,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Vec<FieldError> {
        validate_fields(&self.title, self.estimate_minutes, self.grading_score)
    }
}

fn validate_fields(title: &str, estimate_minutes: u32, grading_score: Option<f64>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if title.trim().chars().count() < MIN_TITLE_LENGTH {
        errors.push(FieldError::new(
            "title",
            format!("Title must be at least {} characters", MIN_TITLE_LENGTH),
        ));
    }

    if estimate_minutes == 0 {
        errors.push(FieldError::new(
            "estimateMinutes",
            "Estimate must be a positive number of minutes",
        ));
    }

    if let Some(score) = grading_score {
        if !is_valid_grading_score(score) {
            errors.push(FieldError::new(
                "gradingScore",
                "Grading score must be between 0 and 10 in steps of 0.5",
            ));
        }
    }

    errors
}

pub fn is_valid_grading_score(score: f64) -> bool {
    score.is_finite()
        && (0.0..=MAX_GRADING_SCORE).contains(&score)
        && (score / GRADING_STEP).fract() == 0.0
}

/// A partial view of a task as stored in an audit diff.
///
/// Only the fields that are `Some` are serialized, so a MOVE snapshot
/// renders as `{"status": "doing"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_notes: Option<String>,
}

impl TaskSnapshot {
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: Some(task.title.clone()),
            description: task.description.clone(),
            priority: Some(task.priority),
            tags: Some(task.tags.clone()),
            estimate_minutes: Some(task.estimate_minutes),
            created_at: Some(task.created_at),
            due_at: task.due_at,
            status: Some(task.status),
            grading_score: task.grading_score,
            grading_notes: task.grading_notes.clone(),
        }
    }
}
