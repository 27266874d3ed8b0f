pub mod audit;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod search;
pub mod stats;
pub mod storage;

pub use error::{FieldError, KanbanError, Result};
pub use search::{filter_tasks, parse_query, SearchQuery};
pub use storage::BoardStore;
