//! Audit entries and the plain-text audit report.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::entity::{AuditAction, AuditDiff, AuditEntry, TaskSnapshot};

/// Create an audit entry stamped with a fresh id and the current time.
///
/// Snapshots are taken by value, so later changes to the task cannot reach
/// back into a recorded entry.
pub fn record(
    action: AuditAction,
    task_id: &str,
    before: Option<TaskSnapshot>,
    after: Option<TaskSnapshot>,
    actor_label: &str,
) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        action,
        task_id: task_id.to_string(),
        diff: AuditDiff { before, after },
        actor_label: actor_label.to_string(),
    }
}

/// Entries matching `action` (when given) whose task id contains
/// `task_id` (when given and non-empty), in log order.
pub fn filter_entries(
    entries: &[AuditEntry],
    action: Option<AuditAction>,
    task_id: Option<&str>,
) -> Vec<AuditEntry> {
    let task_id = task_id.filter(|s| !s.is_empty());
    entries
        .iter()
        .filter(|e| action.map_or(true, |a| e.action == a))
        .filter(|e| task_id.map_or(true, |needle| e.task_id.contains(needle)))
        .cloned()
        .collect()
}

/// Render a report over `entries`, generated now.
pub fn summarize(entries: &[AuditEntry]) -> String {
    summarize_at(entries, Utc::now())
}

/// Render a report over `entries` with a fixed generation time.
pub fn summarize_at(entries: &[AuditEntry], generated_at: DateTime<Utc>) -> String {
    let mut out = String::from("=== AUDIT SUMMARY ===\n\n");
    let _ = writeln!(out, "Total events: {}", entries.len());
    let _ = writeln!(out, "Generated at: {}\n", format_timestamp(&generated_at));

    let mut counts: HashMap<AuditAction, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.action).or_default() += 1;
    }

    out.push_str("--- By action ---\n");
    for action in AuditAction::ALL {
        let _ = writeln!(out, "{}: {}", action, counts.get(&action).copied().unwrap_or(0));
    }

    out.push_str("\n--- Events ---\n\n");

    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}] {} - {}",
            index + 1,
            entry.action,
            format_timestamp(&entry.timestamp)
        );
        let _ = writeln!(out, "   Task ID: {}", entry.task_id);
        let _ = writeln!(out, "   Actor: {}", entry.actor_label);

        if entry.diff.before.is_some() || entry.diff.after.is_some() {
            out.push_str("   Changes:\n");
            for line in describe_changes(entry) {
                let _ = writeln!(out, "   → {}", line);
            }
        }

        out.push('\n');
    }

    out
}

/// Per-action change lines for one entry.
pub fn describe_changes(entry: &AuditEntry) -> Vec<String> {
    let before = entry.diff.before.as_ref();
    let after = entry.diff.after.as_ref();

    match entry.action {
        AuditAction::Create => match after {
            Some(after) => vec![
                format!("New: {}", after.title.as_deref().unwrap_or("Untitled")),
                format!("Priority: {}", display_or_na(after.priority)),
                format!("Status: {}", display_or_na(after.status)),
            ],
            None => Vec::new(),
        },
        AuditAction::Delete => match before {
            Some(before) => vec![format!(
                "Deleted: {}",
                before.title.as_deref().unwrap_or("Untitled")
            )],
            None => Vec::new(),
        },
        AuditAction::Move => match (before, after) {
            (Some(before), Some(after)) => vec![format!(
                "From: {} → To: {}",
                display_or_na(before.status),
                display_or_na(after.status)
            )],
            _ => Vec::new(),
        },
        AuditAction::Update => match after {
            Some(after) => changed_fields(before, after),
            None => Vec::new(),
        },
    }
}

/// `key: before → after` for every key present in `after` whose JSON
/// differs from the same key in `before`. Missing values render as `null`.
fn changed_fields(before: Option<&TaskSnapshot>, after: &TaskSnapshot) -> Vec<String> {
    let before = before.map(snapshot_fields).unwrap_or_default();
    let after = snapshot_fields(after);

    after
        .iter()
        .filter_map(|(key, new)| {
            let old = before.get(key).unwrap_or(&Value::Null);
            (old != new).then(|| format!("{}: {} → {}", key, old, new))
        })
        .collect()
}

fn snapshot_fields(snapshot: &TaskSnapshot) -> Map<String, Value> {
    match serde_json::to_value(snapshot) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn display_or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
