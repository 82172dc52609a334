//! Command-line entry point for the task store.
//!
//! # Responsibility
//! - Resolve configuration, open and migrate the store, then run one
//!   tenant-scoped operation.
//! - Print results as JSON on stdout.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;
use taskstore_core::db::applied_migrations;
use taskstore_core::{
    init_logging, NewTask, SqliteTaskRepository, StoreConfig, TaskId, TaskPatch, TaskService,
    TenantId,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tenant-scoped task store")]
struct Args {
    /// SQLite database file (overrides TASKSTORE_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory of `*.sql` migrations (overrides TASKSTORE_MIGRATIONS_DIR)
    #[arg(long)]
    migrations: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides TASKSTORE_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Authenticated tenant the command acts for
    #[arg(short, long, global = true)]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and list the applied ones
    Migrate,
    /// List the tenant's tasks, newest first
    List,
    /// Show one task
    Show { id: TaskId },
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change some fields of a task
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task completed
    Done { id: TaskId },
    /// Delete a task
    Rm { id: TaskId },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let mut config = StoreConfig::from_env()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(dir) = args.migrations {
        config.migrations_dir = Some(dir);
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)
            .map_err(|err| eyre!("failed to initialize logging: {err}"))?;
    }

    let conn = config
        .open()
        .wrap_err_with(|| format!("failed to open `{}`", config.db_path.display()))?;

    if let Command::Migrate = args.command {
        let names: Vec<String> = applied_migrations(&conn)?
            .into_iter()
            .map(|record| format!("{} {}", record.applied_at, record.name))
            .collect();
        return print_json(&names);
    }

    let tenant = args
        .tenant
        .ok_or_else(|| eyre!("--tenant is required for task commands"))
        .and_then(|tenant| Ok(TenantId::try_new(tenant)?))?;
    let repo = SqliteTaskRepository::try_new(&conn)?;
    let service = TaskService::new(&repo);

    match args.command {
        Command::Migrate => Ok(()),
        Command::List => print_json(&service.list.execute(&tenant)?),
        Command::Show { id } => {
            let task = service.get.execute(id, &tenant)?.ok_or_else(|| not_found(id))?;
            print_json(&task)
        }
        Command::Add { title, description } => {
            let input = NewTask { title, description };
            print_json(&service.create.execute(&input, &tenant)?)
        }
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                completed,
            };
            let task = service
                .update
                .execute(id, &patch, &tenant)?
                .ok_or_else(|| not_found(id))?;
            print_json(&task)
        }
        Command::Done { id } => {
            let patch = TaskPatch::default().completed(true);
            let task = service
                .update
                .execute(id, &patch, &tenant)?
                .ok_or_else(|| not_found(id))?;
            print_json(&task)
        }
        Command::Rm { id } => {
            if !service.delete.execute(id, &tenant)? {
                return Err(not_found(id));
            }
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn not_found(id: TaskId) -> color_eyre::Report {
    eyre!("task {id} not found")
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
