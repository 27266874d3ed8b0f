use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kanban-auditor")]
#[command(version, about = "A local task board with a full audit trail")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new board in the current directory
    Init,

    /// Add a new task
    Add {
        /// Task title (at least 3 characters)
        title: String,

        /// Priority (low, medium, high)
        #[arg(long, short = 'p', default_value = "medium")]
        priority: String,

        /// Estimate in minutes
        #[arg(long, short = 'e')]
        estimate: u32,

        /// Tags (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Description
        #[arg(long, short = 'd', conflicts_with = "stdin")]
        description: Option<String>,

        /// Read the description from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit an existing task
    Edit {
        /// Task id or unique prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New priority
        #[arg(long, short = 'p')]
        priority: Option<String>,

        /// New estimate in minutes
        #[arg(long, short = 'e')]
        estimate: Option<u32>,

        /// Replace all tags (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,

        /// New description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a task to another column
    Move {
        /// Task id or unique prefix
        id: String,

        /// Target status (todo, doing, done)
        status: String,
    },

    /// Delete a task
    Delete {
        /// Task id or unique prefix
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List tasks grouped by status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search tasks with the operator language (tag:, p:, due:, est:)
    Search {
        /// Query tokens; omit to print the operator help
        query: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the audit summary
    Audit {
        /// Only entries with this action (CREATE, UPDATE, DELETE, MOVE)
        #[arg(long, short = 'a')]
        action: Option<String>,

        /// Only entries whose task id contains this text
        #[arg(long)]
        task: Option<String>,

        /// Output the raw entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set or clear the grading score and notes of a task
    Grade {
        /// Task id or unique prefix
        id: String,

        /// Score from 0 to 10 in steps of 0.5
        #[arg(long, short = 's')]
        score: Option<f64>,

        /// Remove the score
        #[arg(long, conflicts_with = "score")]
        clear_score: bool,

        /// Grading notes
        #[arg(long, short = 'n')]
        notes: Option<String>,

        /// Remove the notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },

    /// Show column and grading statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the board as pretty-printed JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the board with an exported JSON file
    Import {
        /// File to import
        file: PathBuf,
    },
}
