use std::fs;
use std::path::Path;

use chrono::Utc;

use super::{ImportReport, JsonFileStorage};
use crate::audit;
use crate::config::{KanbanConfig, KANBAN_DIR};
use crate::entity::{
    is_valid_grading_score, AuditAction, AuditEntry, Board, Task, TaskDraft, TaskSnapshot,
    TaskStatus, SYSTEM_TASK_ID,
};
use crate::error::{FieldError, KanbanError, Result};

/// Title recorded on the corrective entry appended after an import repair.
pub const IMPORT_REPAIR_NOTE: &str = "Duplicate ids resolved during import";

/// Owner of the board. Every state change goes through one of its
/// operations, each of which appends exactly one audit entry and then
/// saves.
pub struct BoardStore {
    board: Board,
    storage: Option<JsonFileStorage>,
    actor_label: String,
}

impl BoardStore {
    /// Initialize a new kanban project under `root`.
    pub fn init(root: &Path) -> Result<Self> {
        let kanban_dir = root.join(KANBAN_DIR);

        if kanban_dir.exists() {
            return Err(KanbanError::AlreadyInitialized);
        }

        fs::create_dir_all(&kanban_dir)?;

        let config = KanbanConfig::default();
        config.save(&kanban_dir)?;

        let storage = JsonFileStorage::new(config.data_path(&kanban_dir));
        storage.try_save(&Board::new())?;

        Ok(Self::with_storage(storage, config.actor_label))
    }

    /// Open an existing kanban project under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let kanban_dir = root.join(KANBAN_DIR);

        if !kanban_dir.is_dir() {
            return Err(KanbanError::NotInitialized);
        }

        let config = KanbanConfig::load(&kanban_dir)?;
        let storage = JsonFileStorage::new(config.data_path(&kanban_dir));
        Ok(Self::with_storage(storage, config.actor_label))
    }

    /// Load the board from `storage`; later commits save back to it.
    pub fn with_storage(storage: JsonFileStorage, actor_label: impl Into<String>) -> Self {
        let board = storage.load();
        Self {
            board,
            storage: Some(storage),
            actor_label: actor_label.into(),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(actor_label: impl Into<String>) -> Self {
        Self {
            board: Board::new(),
            storage: None,
            actor_label: actor_label.into(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tasks(&self) -> &[Task] {
        &self.board.tasks
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.board.audit_log
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.board.task(id)
    }

    pub fn actor_label(&self) -> &str {
        &self.actor_label
    }

    pub fn storage(&self) -> Option<&JsonFileStorage> {
        self.storage.as_ref()
    }

    /// Validate and append a new task.
    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(KanbanError::Validation(errors));
        }

        let task = Task::from_draft(draft, Utc::now());
        let entry = audit::record(
            AuditAction::Create,
            &task.id,
            None,
            Some(TaskSnapshot::from(&task)),
            &self.actor_label,
        );

        self.board.tasks.push(task.clone());
        self.commit(entry);

        Ok(task)
    }

    /// Replace an existing task. Returns `Ok(false)` without recording
    /// anything when no task has that id. `createdAt` cannot be changed
    /// and the title is stored trimmed, as on creation.
    pub fn update_task(&mut self, mut task: Task) -> Result<bool> {
        let Some(index) = self.board.position(&task.id) else {
            tracing::debug!(task_id = %task.id, "update of unknown task ignored");
            return Ok(false);
        };

        let errors = task.validate();
        if !errors.is_empty() {
            return Err(KanbanError::Validation(errors));
        }

        let before = &self.board.tasks[index];
        task.created_at = before.created_at;
        task.title = task.title.trim().to_string();
        let entry = audit::record(
            AuditAction::Update,
            &task.id,
            Some(TaskSnapshot::from(before)),
            Some(TaskSnapshot::from(&task)),
            &self.actor_label,
        );

        self.board.tasks[index] = task;
        self.commit(entry);

        Ok(true)
    }

    /// Change a task's status. Unknown ids and same-status moves are no-ops.
    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> bool {
        let Some(index) = self.board.position(id) else {
            return false;
        };
        let current = self.board.tasks[index].status;
        if current == status {
            return false;
        }

        let entry = audit::record(
            AuditAction::Move,
            id,
            Some(TaskSnapshot::status_only(current)),
            Some(TaskSnapshot::status_only(status)),
            &self.actor_label,
        );

        self.board.tasks[index].status = status;
        self.commit(entry);

        true
    }

    /// Remove a task. Unknown ids are a no-op.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let Some(index) = self.board.position(id) else {
            return false;
        };

        let entry = audit::record(
            AuditAction::Delete,
            id,
            Some(TaskSnapshot::from(&self.board.tasks[index])),
            None,
            &self.actor_label,
        );

        self.board.tasks.remove(index);
        self.commit(entry);

        true
    }

    /// Set or clear the grading fields of a task, recorded as one UPDATE.
    ///
    /// `None` leaves a field as it is; `Some(None)` clears it.
    pub fn grade_task(
        &mut self,
        id: &str,
        score: Option<Option<f64>>,
        notes: Option<Option<String>>,
    ) -> Result<bool> {
        if let Some(Some(score)) = score {
            if !is_valid_grading_score(score) {
                return Err(KanbanError::Validation(vec![FieldError::new(
                    "gradingScore",
                    "Grading score must be between 0 and 10 in steps of 0.5",
                )]));
            }
        }

        let Some(existing) = self.board.task(id) else {
            return Ok(false);
        };

        let mut graded = existing.clone();
        if let Some(score) = score {
            graded.grading_score = score;
        }
        if let Some(notes) = notes {
            graded.grading_notes = notes;
        }
        if &graded == existing {
            return Ok(true);
        }
        self.update_task(graded)
    }

    /// Replace the whole board with an accepted import.
    ///
    /// A rejected report changes nothing. A repaired report additionally
    /// gets a `system` entry documenting the repair.
    pub fn apply_import(&mut self, report: ImportReport) -> Result<()> {
        let repaired = report.is_repaired();
        let board = match report {
            ImportReport {
                valid: true,
                data: Some(board),
                ..
            } => board,
            ImportReport { errors, .. } => return Err(KanbanError::Validation(errors)),
        };

        tracing::info!(
            tasks = board.tasks.len(),
            entries = board.audit_log.len(),
            repaired,
            "importing board"
        );

        if repaired {
            let entry = audit::record(
                AuditAction::Update,
                SYSTEM_TASK_ID,
                None,
                Some(TaskSnapshot::titled(IMPORT_REPAIR_NOTE)),
                &self.actor_label,
            );
            self.board = board;
            self.commit(entry);
        } else {
            self.board = board;
            self.persist();
        }

        Ok(())
    }

    /// Append the entry for a change already applied to the board, then save.
    fn commit(&mut self, mut entry: AuditEntry) {
        if let Some(last) = self.board.audit_log.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }

        tracing::debug!(action = %entry.action, task_id = %entry.task_id, "commit");

        self.board.audit_log.push(entry);
        self.persist();
    }

    fn persist(&self) {
        if let Some(storage) = &self.storage {
            storage.save(&self.board);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Priority;
    use crate::storage::import_from_text;
    use tempfile::TempDir;

    fn store() -> BoardStore {
        BoardStore::in_memory("tester")
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title, 30)
    }

    #[test]
    fn test_create_records_entry() {
        let mut store = store();
        let task = store.create_task(draft("Write tests")).unwrap();

        assert_eq!(store.tasks().len(), 1);
        assert_eq!(task.status, TaskStatus::Todo);
        let entry = &store.audit_log()[0];
        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.task_id, task.id);
        assert!(entry.diff.before.is_none());
        assert_eq!(entry.diff.after.as_ref().unwrap().title.as_deref(), Some("Write tests"));
        assert_eq!(entry.actor_label, "tester");
    }

    #[test]
    fn test_create_rejects_invalid_draft() {
        let mut store = store();
        let err = store.create_task(TaskDraft::new("no", 0)).unwrap_err();
        match err {
            KanbanError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("Expected validation error, got {other:?}"),
        }
        assert!(store.tasks().is_empty());
        assert!(store.audit_log().is_empty());
    }

    #[test]
    fn test_update_records_full_snapshots() {
        let mut store = store();
        let task = store.create_task(draft("Write tests")).unwrap();

        let mut edited = task.clone();
        edited.title = "Write more tests".to_string();
        edited.priority = Priority::High;
        edited.created_at = Utc::now() + chrono::Duration::days(10);
        assert!(store.update_task(edited).unwrap());

        let stored = store.task(&task.id).unwrap();
        assert_eq!(stored.title, "Write more tests");
        assert_eq!(stored.created_at, task.created_at);

        let entry = store.audit_log().last().unwrap();
        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.diff.before.as_ref().unwrap().title.as_deref(), Some("Write tests"));
        assert_eq!(entry.diff.after.as_ref().unwrap().priority, Some(Priority::High));
    }

    #[test]
    fn test_update_rejects_invalid_task() {
        let mut store = store();
        let task = store.create_task(draft("Write tests")).unwrap();
        let mut edited = task.clone();
        edited.title = "x".to_string();
        assert!(store.update_task(edited).is_err());
        assert_eq!(store.task(&task.id).unwrap().title, "Write tests");
        assert_eq!(store.audit_log().len(), 1);
    }

    #[test]
    fn test_unknown_ids_change_nothing() {
        let mut store = store();
        store.create_task(draft("Existing")).unwrap();
        let before = store.board().clone();

        let mut ghost = Task::from_draft(draft("Ghost task"), Utc::now());
        ghost.id = "missing".to_string();
        assert!(!store.update_task(ghost).unwrap());
        assert!(!store.move_task("missing", TaskStatus::Done));
        assert!(!store.delete_task("missing"));
        assert!(!store.grade_task("missing", Some(Some(5.0)), None).unwrap());

        assert_eq!(store.board(), &before);
    }

    #[test]
    fn test_move_to_same_status_is_noop() {
        let mut store = store();
        let task = store.create_task(draft("Move me")).unwrap();
        assert!(!store.move_task(&task.id, TaskStatus::Todo));
        assert_eq!(store.audit_log().len(), 1);
    }

    #[test]
    fn test_move_records_status_only() {
        let mut store = store();
        let task = store.create_task(draft("Move me")).unwrap();
        assert!(store.move_task(&task.id, TaskStatus::Doing));

        assert_eq!(store.task(&task.id).unwrap().status, TaskStatus::Doing);
        let entry = store.audit_log().last().unwrap();
        assert_eq!(entry.action, AuditAction::Move);
        assert_eq!(entry.diff.before, Some(TaskSnapshot::status_only(TaskStatus::Todo)));
        assert_eq!(entry.diff.after, Some(TaskSnapshot::status_only(TaskStatus::Doing)));
    }

    #[test]
    fn test_delete_records_before_only() {
        let mut store = store();
        let task = store.create_task(draft("Delete me")).unwrap();
        assert!(store.delete_task(&task.id));
        assert!(!store.delete_task(&task.id));

        assert!(store.tasks().is_empty());
        assert_eq!(store.audit_log().len(), 2);
        let entry = store.audit_log().last().unwrap();
        assert_eq!(entry.action, AuditAction::Delete);
        assert!(entry.diff.after.is_none());
        assert_eq!(entry.diff.before.as_ref().unwrap().title.as_deref(), Some("Delete me"));
    }

    #[test]
    fn test_log_matches_non_noop_operations() {
        let mut store = store();
        let a = store.create_task(draft("Task A")).unwrap();
        let b = store.create_task(draft("Task B")).unwrap();
        store.move_task(&a.id, TaskStatus::Doing);
        store.move_task(&a.id, TaskStatus::Doing);
        store.delete_task("nope");
        let mut renamed = b.clone();
        renamed.title = "Task B2".to_string();
        store.update_task(renamed).unwrap();
        store.delete_task(&a.id);

        let expected = vec![
            (AuditAction::Create, a.id.clone()),
            (AuditAction::Create, b.id.clone()),
            (AuditAction::Move, a.id.clone()),
            (AuditAction::Update, b.id.clone()),
            (AuditAction::Delete, a.id.clone()),
        ];
        let actual: Vec<_> = store
            .audit_log()
            .iter()
            .map(|e| (e.action, e.task_id.clone()))
            .collect();
        assert_eq!(actual, expected);

        let timestamps: Vec<_> = store.audit_log().iter().map(|e| e.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_grade_task_touches_only_grading_fields() {
        let mut store = store();
        let task = store.create_task(draft("Grade me")).unwrap();
        assert!(store
            .grade_task(&task.id, Some(Some(8.5)), Some(Some("Solid work".to_string())))
            .unwrap());

        let graded = store.task(&task.id).unwrap();
        assert_eq!(graded.grading_score, Some(8.5));
        assert_eq!(graded.title, "Grade me");

        let lines = audit::describe_changes(store.audit_log().last().unwrap());
        assert_eq!(
            lines,
            vec![
                "gradingNotes: null → \"Solid work\"".to_string(),
                "gradingScore: null → 8.5".to_string(),
            ]
        );

        assert!(store.grade_task(&task.id, Some(Some(11.0)), None).is_err());
    }

    #[test]
    fn test_grade_score_only_keeps_notes() {
        let mut store = store();
        let task = store.create_task(draft("Grade me twice")).unwrap();
        store
            .grade_task(&task.id, Some(Some(7.0)), Some(Some("keep these notes".to_string())))
            .unwrap();
        store.grade_task(&task.id, Some(Some(8.0)), None).unwrap();

        let graded = store.task(&task.id).unwrap();
        assert_eq!(graded.grading_score, Some(8.0));
        assert_eq!(graded.grading_notes.as_deref(), Some("keep these notes"));

        let lines = audit::describe_changes(store.audit_log().last().unwrap());
        assert_eq!(lines, vec!["gradingScore: 7.0 → 8.0".to_string()]);
    }

    #[test]
    fn test_grade_clears_only_requested_fields() {
        let mut store = store();
        let task = store.create_task(draft("Grade then clear")).unwrap();
        store
            .grade_task(&task.id, Some(Some(6.5)), Some(Some("meh".to_string())))
            .unwrap();

        store.grade_task(&task.id, Some(None), None).unwrap();
        let graded = store.task(&task.id).unwrap();
        assert_eq!(graded.grading_score, None);
        assert_eq!(graded.grading_notes.as_deref(), Some("meh"));

        // Nothing to change records nothing.
        let entries = store.audit_log().len();
        assert!(store.grade_task(&task.id, None, None).unwrap());
        assert_eq!(store.audit_log().len(), entries);
    }

    #[test]
    fn test_update_stores_trimmed_title() {
        let mut store = store();
        let task = store.create_task(draft("  Padded  ")).unwrap();
        assert_eq!(task.title, "Padded");

        let mut edited = task.clone();
        edited.title = "  Still padded \t".to_string();
        store.update_task(edited).unwrap();
        assert_eq!(store.task(&task.id).unwrap().title, "Still padded");
    }

    #[test]
    fn test_apply_import_repair_appends_system_entry() {
        let mut store = store();
        store.create_task(draft("Will be replaced")).unwrap();

        let raw = r#"{
            "tasks": [
                {"id": "x", "title": "First", "priority": "low", "tags": [], "estimateMinutes": 5,
                 "createdAt": "2026-01-01T00:00:00Z", "status": "todo"},
                {"id": "x", "title": "Second", "priority": "high", "tags": [], "estimateMinutes": 5,
                 "createdAt": "2026-01-01T00:00:00Z", "status": "done"}
            ],
            "auditLogs": []
        }"#;
        store.apply_import(import_from_text(raw)).unwrap();

        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.audit_log().len(), 1);
        let entry = &store.audit_log()[0];
        assert!(entry.is_system());
        assert_eq!(entry.action, AuditAction::Update);
    }

    #[test]
    fn test_apply_import_rejected_changes_nothing() {
        let mut store = store();
        store.create_task(draft("Keep me")).unwrap();
        let before = store.board().clone();

        let result = store.apply_import(import_from_text(r#"{"tasks": [{"id": "1"}], "auditLogs": []}"#));
        assert!(matches!(result, Err(KanbanError::Validation(_))));
        assert_eq!(store.board(), &before);
    }

    #[test]
    fn test_commits_are_saved() {
        let tmp = TempDir::new().unwrap();
        let mut store = BoardStore::init(tmp.path()).unwrap();
        let task = store.create_task(draft("Persisted")).unwrap();
        store.move_task(&task.id, TaskStatus::Done);

        let reopened = BoardStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.tasks().len(), 1);
        assert_eq!(reopened.tasks()[0].status, TaskStatus::Done);
        assert_eq!(reopened.audit_log().len(), 2);
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = TempDir::new().unwrap();
        BoardStore::init(tmp.path()).unwrap();
        assert!(matches!(
            BoardStore::init(tmp.path()),
            Err(KanbanError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_open_without_init_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            BoardStore::open(tmp.path()),
            Err(KanbanError::NotInitialized)
        ));
    }
}
