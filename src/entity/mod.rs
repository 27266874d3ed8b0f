mod audit;
mod board;
mod task;

pub use audit::{AuditAction, AuditDiff, AuditEntry, SYSTEM_TASK_ID};
pub use board::{Board, SCHEMA_VERSION};
pub use task::{
    is_valid_grading_score, new_task_id, Priority, Task, TaskDraft, TaskSnapshot, TaskStatus,
    GRADING_STEP, MAX_GRADING_SCORE, MIN_TITLE_LENGTH,
};
