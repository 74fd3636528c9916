use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use taskboard::common::Priority;
use taskboard::config::TaskboardConfig;
use taskboard::logging::{LogFormat, init_tracing};
use taskboard::webhook::ForwardMode;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Collaborative kanban board client and storage webhook forwarder")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the storage webhook forwarder
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
    /// List or create boards
    Boards {
        #[command(subcommand)]
        command: BoardsCommands,
    },
    /// Inspect a single board
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },
    /// Create or move tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Create or rename columns
    Column {
        #[command(subcommand)]
        command: ColumnCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum WebhookCommands {
    /// Listen for storage events and forward new PDFs
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// await: respond after forwarding; detach: respond immediately
        #[arg(long, value_enum)]
        mode: Option<ForwardMode>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BoardsCommands {
    /// List your boards, newest first
    List {
        /// Only boards whose title contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Boards updated on or after this date (YYYY-MM-DD)
        #[arg(long)]
        updated_from: Option<NaiveDate>,
        /// Boards updated on or before this date (YYYY-MM-DD)
        #[arg(long)]
        updated_to: Option<NaiveDate>,
        #[arg(long)]
        min_tasks: Option<usize>,
        #[arg(long)]
        max_tasks: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Create a board with the default columns
    Create {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(long)]
        creator: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BoardCommands {
    /// Show a board's columns and tasks
    Show {
        board_id: Uuid,
        /// Only tasks with these priorities (repeatable)
        #[arg(long)]
        priority: Vec<Priority>,
        /// Only tasks assigned to these people (repeatable; "" for unassigned)
        #[arg(long)]
        assignee: Vec<String>,
        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Add a task to the end of a column
    Create {
        board_id: Uuid,
        title: String,
        /// Target column (defaults to the board's first column)
        #[arg(long)]
        column: Option<Uuid>,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        #[arg(short, long)]
        assignee: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Set a task's column and position
    Move {
        task_id: Uuid,
        column_id: Uuid,
        position: i32,
    },
}

#[derive(Subcommand, Clone)]
pub enum ColumnCommands {
    /// Append a column to a board
    Create { board_id: Uuid, title: String },
    /// Rename a column
    Rename { column_id: Uuid, title: String },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskboard.toml file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; values may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = TaskboardConfig::new(project_dir)?;

    match cli.command {
        Commands::Webhook { command } => cmd::cmd_webhook(&config, command).await?,
        Commands::Boards { command } => cmd::cmd_boards(&config, command).await?,
        Commands::Board { command } => cmd::cmd_board(&config, command).await?,
        Commands::Task { command } => cmd::cmd_task(&config, command).await?,
        Commands::Column { command } => cmd::cmd_column(&config, command).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
