//! Read-only statistics over the task collection.

use serde::Serialize;

use crate::entity::{Task, TaskStatus};

/// Task counts per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub todo: usize,
    pub doing: usize,
    pub done: usize,
    pub total: usize,
}

impl BoardStats {
    pub fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::Doing => self.doing,
            TaskStatus::Done => self.done,
        }
    }
}

/// Summary of the grading overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradingStats {
    pub graded: usize,
    pub ungraded: usize,
    /// Mean score of graded tasks, 0 when nothing is graded
    pub average: f64,
}

pub fn board_stats(tasks: &[Task]) -> BoardStats {
    let mut stats = BoardStats {
        total: tasks.len(),
        ..BoardStats::default()
    };
    for task in tasks {
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::Doing => stats.doing += 1,
            TaskStatus::Done => stats.done += 1,
        }
    }
    stats
}

pub fn grading_stats(tasks: &[Task]) -> GradingStats {
    let scores: Vec<f64> = tasks.iter().filter_map(|t| t.grading_score).collect();
    let average = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    GradingStats {
        graded: scores.len(),
        ungraded: tasks.len() - scores.len(),
        average,
    }
}

/// Tasks of one column, in board order.
pub fn tasks_with_status(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}
