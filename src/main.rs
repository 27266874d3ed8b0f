use clap::Parser;
use kanban_auditor::cli::{
    handle_add, handle_audit, handle_delete, handle_edit, handle_export, handle_grade,
    handle_import, handle_init, handle_list, handle_move, handle_search, handle_stats, Cli,
    Commands,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "KANBAN_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Add {
            title,
            priority,
            estimate,
            tags,
            due,
            description,
            stdin,
            json,
        } => handle_add(title, priority, estimate, tags, due, description, stdin, json),
        Commands::Edit {
            id,
            title,
            priority,
            estimate,
            tags,
            clear_tags,
            due,
            clear_due,
            description,
            json,
        } => handle_edit(
            id,
            title,
            priority,
            estimate,
            tags,
            clear_tags,
            due,
            clear_due,
            description,
            json,
        ),
        Commands::Move { id, status } => handle_move(id, status),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::List { json } => handle_list(json),
        Commands::Search { query, json } => handle_search(query, json),
        Commands::Audit { action, task, json } => handle_audit(action, task, json),
        Commands::Grade {
            id,
            score,
            clear_score,
            notes,
            clear_notes,
        } => handle_grade(id, score, clear_score, notes, clear_notes),
        Commands::Stats { json } => handle_stats(json),
        Commands::Export { output } => handle_export(output),
        Commands::Import { file } => handle_import(file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
