//! JSON export and validated import.

use std::collections::HashSet;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::entity::{
    is_valid_grading_score, new_task_id, AuditEntry, Board, Priority, Task, TaskStatus,
    MIN_TITLE_LENGTH, SCHEMA_VERSION,
};
use crate::error::{FieldError, Result};

/// Outcome of an import.
///
/// - `valid == false`: rejected, `data` is `None`, `errors` lists every problem.
/// - `valid == true` with errors: accepted after repair (duplicate ids).
/// - `valid == true` without errors: accepted as is.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub data: Option<Board>,
}

impl ImportReport {
    fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            valid: false,
            errors,
            data: None,
        }
    }

    pub fn is_repaired(&self) -> bool {
        self.valid && !self.errors.is_empty()
    }
}

/// Pretty-printed JSON of the whole board.
pub fn export_to_text(board: &Board) -> Result<String> {
    Ok(serde_json::to_string_pretty(board)?)
}

/// Parse and validate an exported board.
pub fn import_from_text(raw: &str) -> ImportReport {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return ImportReport::rejected(vec![FieldError::new(
                "json",
                format!("Invalid JSON file: {}", e),
            )])
        }
    };
    validate_board_value(&value)
}

/// Validate an already-parsed JSON value and repair duplicate task ids.
pub fn validate_board_value(value: &Value) -> ImportReport {
    let Some(root) = value.as_object() else {
        return ImportReport::rejected(vec![FieldError::new("root", "Invalid JSON structure")]);
    };

    let mut errors = Vec::new();

    match root.get("tasks").and_then(Value::as_array) {
        Some(tasks) => {
            for (index, task) in tasks.iter().enumerate() {
                validate_task_value(index, task, &mut errors);
            }
        }
        None => errors.push(FieldError::new("tasks", "Tasks must be an array")),
    }

    let mut audit_log = Vec::new();
    match root.get("auditLogs").and_then(Value::as_array) {
        Some(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                match serde_json::from_value::<AuditEntry>(entry.clone()) {
                    Ok(entry) => audit_log.push(entry),
                    Err(e) => errors.push(FieldError::new(
                        format!("auditLogs[{}]", index),
                        format!("Malformed audit entry: {}", e),
                    )),
                }
            }
        }
        None => errors.push(FieldError::new("auditLogs", "Audit logs must be an array")),
    }

    if !errors.is_empty() {
        return ImportReport::rejected(errors);
    }

    let raw_tasks = root
        .get("tasks")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut tasks = Vec::with_capacity(raw_tasks.len());
    for (index, raw) in raw_tasks.into_iter().enumerate() {
        match serde_json::from_value::<Task>(raw) {
            Ok(task) => tasks.push(task),
            Err(e) => errors.push(FieldError::new(format!("tasks[{}]", index), e.to_string())),
        }
    }
    if !errors.is_empty() {
        return ImportReport::rejected(errors);
    }

    let regenerated = regenerate_duplicate_ids(&mut tasks);
    if regenerated > 0 {
        errors.push(FieldError::new(
            "tasks",
            format!("{} duplicate task id(s) were found and regenerated", regenerated),
        ));
    }

    ImportReport {
        valid: true,
        errors,
        data: Some(Board {
            tasks,
            audit_log,
            version: SCHEMA_VERSION.to_string(),
        }),
    }
}

/// First occurrence keeps its id; later ones get fresh ids. Returns how
/// many ids were replaced.
fn regenerate_duplicate_ids(tasks: &mut [Task]) -> usize {
    let mut seen = HashSet::new();
    let mut regenerated = 0;
    for task in tasks.iter_mut() {
        if !seen.insert(task.id.clone()) {
            let mut id = new_task_id();
            while seen.contains(&id) {
                id = new_task_id();
            }
            seen.insert(id.clone());
            task.id = id;
            regenerated += 1;
        }
    }
    regenerated
}

fn validate_task_value(index: usize, value: &Value, errors: &mut Vec<FieldError>) {
    let field = |name: &str| format!("tasks[{}].{}", index, name);

    let Some(task) = value.as_object() else {
        errors.push(FieldError::new(
            format!("tasks[{}]", index),
            "Task must be an object",
        ));
        return;
    };

    if !task
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
    {
        errors.push(FieldError::new(
            field("id"),
            "Task ID is required and must be a string",
        ));
    }

    if !task
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| t.chars().count() >= MIN_TITLE_LENGTH)
    {
        errors.push(FieldError::new(
            field("title"),
            format!("Title must be at least {} characters", MIN_TITLE_LENGTH),
        ));
    }

    if !task
        .get("priority")
        .and_then(Value::as_str)
        .is_some_and(|p| p.parse::<Priority>().is_ok())
    {
        errors.push(FieldError::new(
            field("priority"),
            "Priority must be low, medium, or high",
        ));
    }

    if !task
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().all(Value::is_string))
    {
        errors.push(FieldError::new(field("tags"), "Tags must be an array of strings"));
    }

    if !task
        .get("estimateMinutes")
        .and_then(Value::as_u64)
        .is_some_and(|n| n > 0 && n <= u64::from(u32::MAX))
    {
        errors.push(FieldError::new(
            field("estimateMinutes"),
            "Estimate must be a positive whole number of minutes",
        ));
    }

    if !task
        .get("createdAt")
        .and_then(Value::as_str)
        .is_some_and(is_timestamp)
    {
        errors.push(FieldError::new(
            field("createdAt"),
            "Creation date is required and must be an RFC 3339 timestamp",
        ));
    }

    if !task
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.parse::<TaskStatus>().is_ok())
    {
        errors.push(FieldError::new(
            field("status"),
            "Status must be todo, doing, or done",
        ));
    }

    validate_optional(task, "description", &field, errors, "Description must be a string", |v| {
        v.is_string()
    });
    validate_optional(
        task,
        "dueAt",
        &field,
        errors,
        "Due date must be an RFC 3339 timestamp",
        |v| v.as_str().is_some_and(is_timestamp),
    );
    validate_optional(
        task,
        "gradingScore",
        &field,
        errors,
        "Grading score must be between 0 and 10 in steps of 0.5",
        |v| v.as_f64().is_some_and(is_valid_grading_score),
    );
    validate_optional(task, "gradingNotes", &field, errors, "Grading notes must be a string", |v| {
        v.is_string()
    });
}

/// Optional fields may be absent or null; otherwise `check` must hold.
fn validate_optional(
    task: &Map<String, Value>,
    name: &str,
    field: &dyn Fn(&str) -> String,
    errors: &mut Vec<FieldError>,
    message: &str,
    check: impl Fn(&Value) -> bool,
) {
    match task.get(name) {
        None | Some(Value::Null) => {}
        Some(v) if check(v) => {}
        Some(_) => errors.push(FieldError::new(field(name), message)),
    }
}

fn is_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}
