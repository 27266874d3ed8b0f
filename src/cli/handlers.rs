use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::audit::{filter_entries, summarize};
use crate::config::KANBAN_DIR;
use crate::entity::{AuditAction, Priority, Task, TaskDraft, TaskStatus};
use crate::error::{KanbanError, Result};
use crate::search::{filter_tasks, parse_query, search_examples};
use crate::stats::{board_stats, grading_stats, tasks_with_status};
use crate::storage::{export_to_text, import_from_text, BoardStore};

/// Shortest id prefix accepted in place of a full task id.
const MIN_ID_PREFIX_LENGTH: usize = 4;

/// Find the project root by looking for .kanban/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(KANBAN_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<BoardStore> {
    BoardStore::open(&find_project_root())
}

/// Resolve an exact id or a unique prefix to a task id.
fn resolve_task_id(store: &BoardStore, input: &str) -> Result<String> {
    if store.task(input).is_some() {
        return Ok(input.to_string());
    }
    if input.len() < MIN_ID_PREFIX_LENGTH {
        return Err(KanbanError::TaskNotFound(input.to_string()));
    }

    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(input))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(KanbanError::TaskNotFound(input.to_string())),
        _ => Err(KanbanError::AmbiguousTaskId(input.to_string())),
    }
}

/// Accept a plain date (midnight UTC) or a full RFC 3339 timestamp.
fn parse_due(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            KanbanError::InvalidArgument(format!(
                "Invalid due date '{}'. Expected YYYY-MM-DD or RFC 3339",
                s
            ))
        })
}

fn parse_priority(s: &str) -> Result<Priority> {
    s.parse().map_err(KanbanError::InvalidArgument)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "  ({}) [{}] {} - {} min",
        short_id(&task.id),
        task.priority,
        task.title,
        task.estimate_minutes
    );

    let mut meta = Vec::new();
    if let Some(due) = task.due_at {
        meta.push(format!("due {}", due.format("%Y-%m-%d")));
    }
    if !task.tags.is_empty() {
        meta.push(format!("#{}", task.tags.join(" #")));
    }
    if let Some(score) = task.grading_score {
        meta.push(format!("score {}", score));
    }
    if !meta.is_empty() {
        line.push_str(&format!("  ({})", meta.join(", ")));
    }

    line
}

fn print_grouped(tasks: &[Task]) {
    for status in TaskStatus::ALL {
        let column = tasks_with_status(tasks, status);
        println!("{} ({})", status.as_str().to_uppercase(), column.len());
        for task in column {
            println!("{}", format_task_line(task));
        }
        println!();
    }
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let _store = BoardStore::init(&root)?;

    println!("Initialized kanban board in {}", root.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_add(
    title: String,
    priority: String,
    estimate: u32,
    tags: Vec<String>,
    due: Option<String>,
    description: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let mut store = open_store()?;

    let mut draft = TaskDraft::new(title, estimate);
    draft.priority = parse_priority(&priority)?;
    draft.tags = tags;
    draft.due_at = due.as_deref().map(parse_due).transpose()?;
    draft.description = description;

    if stdin {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        if !content.trim().is_empty() {
            draft.description = Some(content.trim_end().to_string());
        }
    }

    let task = store.create_task(draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("Created task ({}) - {}", short_id(&task.id), task.title);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    id: String,
    title: Option<String>,
    priority: Option<String>,
    estimate: Option<u32>,
    tags: Vec<String>,
    clear_tags: bool,
    due: Option<String>,
    clear_due: bool,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let mut store = open_store()?;
    let id = resolve_task_id(&store, &id)?;

    let mut task = store
        .task(&id)
        .cloned()
        .ok_or_else(|| KanbanError::TaskNotFound(id.clone()))?;

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(priority) = priority {
        task.priority = parse_priority(&priority)?;
    }
    if let Some(estimate) = estimate {
        task.estimate_minutes = estimate;
    }
    if clear_tags {
        task.tags.clear();
    } else if !tags.is_empty() {
        task.tags = tags;
    }
    if clear_due {
        task.due_at = None;
    } else if let Some(due) = due {
        task.due_at = Some(parse_due(&due)?);
    }
    if let Some(description) = description {
        task.description = Some(description).filter(|d| !d.is_empty());
    }

    store.update_task(task)?;
    let task = store
        .task(&id)
        .ok_or_else(|| KanbanError::TaskNotFound(id.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("Updated task ({}) - {}", short_id(&task.id), task.title);
    }

    Ok(())
}

pub fn handle_move(id: String, status: String) -> Result<()> {
    let mut store = open_store()?;
    let id = resolve_task_id(&store, &id)?;
    let status: TaskStatus = status.parse().map_err(KanbanError::InvalidArgument)?;

    if store.move_task(&id, status) {
        println!("Moved task ({}) to {}", short_id(&id), status);
    } else {
        println!("Task ({}) is already in {}", short_id(&id), status);
    }

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let mut store = open_store()?;
    let id = resolve_task_id(&store, &id)?;
    let title = store
        .task(&id)
        .map(|t| t.title.clone())
        .unwrap_or_default();

    if !force {
        eprintln!("Delete task ({}) - {}? [y/N] ", short_id(&id), title);

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(KanbanError::InvalidArgument(
                "Use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    store.delete_task(&id);
    println!("Deleted task ({}) - {}", short_id(&id), title);

    Ok(())
}

pub fn handle_list(json: bool) -> Result<()> {
    let store = open_store()?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.tasks())?);
    } else if store.tasks().is_empty() {
        println!("No tasks yet. Add one with 'kanban-auditor add'.");
    } else {
        print_grouped(store.tasks());
    }

    Ok(())
}

pub fn handle_search(query: Vec<String>, json: bool) -> Result<()> {
    if query.is_empty() && !json {
        println!("Search operators:");
        for example in search_examples() {
            println!("  {}", example);
        }
        return Ok(());
    }

    let raw = query.join(" ");
    let parsed = parse_query(&raw);
    let store = open_store()?;
    let results = filter_tasks(store.tasks(), &parsed);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No tasks match '{}'.", raw);
    } else {
        println!("Search results for '{}':\n", raw);
        print_grouped(&results);
    }

    Ok(())
}

pub fn handle_audit(action: Option<String>, task: Option<String>, json: bool) -> Result<()> {
    let store = open_store()?;
    let action: Option<AuditAction> = action
        .map(|a| a.parse().map_err(KanbanError::InvalidArgument))
        .transpose()?;

    let all = store.audit_log();
    let entries = filter_entries(all, action, task.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        if entries.len() != all.len() {
            println!("Showing {} of {} events\n", entries.len(), all.len());
        }
        print!("{}", summarize(&entries));
    }

    Ok(())
}

pub fn handle_grade(
    id: String,
    score: Option<f64>,
    clear_score: bool,
    notes: Option<String>,
    clear_notes: bool,
) -> Result<()> {
    let mut store = open_store()?;
    let id = resolve_task_id(&store, &id)?;

    let score = if clear_score { Some(None) } else { score.map(Some) };
    let notes = if clear_notes { Some(None) } else { notes.map(Some) };
    store.grade_task(&id, score, notes)?;

    let task = store
        .task(&id)
        .ok_or_else(|| KanbanError::TaskNotFound(id.clone()))?;
    match task.grading_score {
        Some(score) => println!("Graded task ({}) with {}", short_id(&id), score),
        None => println!("Task ({}) has no grade", short_id(&id)),
    }

    Ok(())
}

pub fn handle_stats(json: bool) -> Result<()> {
    let store = open_store()?;
    let board = board_stats(store.tasks());
    let grading = grading_stats(store.tasks());

    if json {
        let value = serde_json::json!({ "board": board, "grading": grading });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Tasks: {}", board.total);
        for status in TaskStatus::ALL {
            println!("  {}: {}", status, board.count(status));
        }
        println!("Audit entries: {}", store.audit_log().len());
        println!(
            "Graded: {} | Ungraded: {} | Average: {:.2}",
            grading.graded, grading.ungraded, grading.average
        );
    }

    Ok(())
}

pub fn handle_export(output: Option<PathBuf>) -> Result<()> {
    let store = open_store()?;
    let text = export_to_text(&store.board().stamped())?;

    match output {
        Some(path) => {
            fs::write(&path, text)?;
            eprintln!(
                "Exported {} tasks to {}",
                store.tasks().len(),
                path.display()
            );
        }
        None => println!("{}", text),
    }

    Ok(())
}

pub fn handle_import(file: PathBuf) -> Result<()> {
    let mut store = open_store()?;
    let raw = fs::read_to_string(&file)?;
    let report = import_from_text(&raw);

    if !report.valid {
        eprintln!("Import rejected:");
        for error in &report.errors {
            eprintln!("  • {}", error);
        }
        return Err(KanbanError::InvalidArgument(format!(
            "{} is not a valid board export",
            file.display()
        )));
    }

    let repaired = report.is_repaired();
    store.apply_import(report)?;

    if repaired {
        println!(
            "Imported {} tasks (duplicate ids were regenerated)",
            store.tasks().len()
        );
    } else {
        println!("Imported {} tasks", store.tasks().len());
    }

    Ok(())
}
