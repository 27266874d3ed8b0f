mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_add, handle_audit, handle_delete, handle_edit, handle_export, handle_grade,
    handle_import, handle_init, handle_list, handle_move, handle_search, handle_stats,
};
