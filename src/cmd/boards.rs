//! Board, task and column commands — `taskboard boards|board|task|column`.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::super::{BoardCommands, BoardsCommands, ColumnCommands, TaskCommands};
use taskboard::backend::{BoardBackend, RestBackend, SharedBackend};
use taskboard::board::{BoardFilters, BoardSession, Dashboard, NewBoardInput, NewTaskInput};
use taskboard::common::{ColumnUpdate, ColumnWithTasks, PresencePayload, Priority, Task};
use taskboard::config::TaskboardConfig;

fn connect(config: &TaskboardConfig) -> Result<SharedBackend> {
    let backend = RestBackend::from_config(&config.toml.backend)?;
    Ok(Arc::new(backend))
}

/// Load a board session, turning a recorded load failure into an error.
async fn open_board(config: &TaskboardConfig, board_id: uuid::Uuid) -> Result<BoardSession> {
    let mut session =
        BoardSession::new(connect(config)?, board_id).with_policy(config.toml.board.rollback);
    session.load().await;
    if let Some(message) = session.take_error() {
        anyhow::bail!(message);
    }
    Ok(session)
}

pub async fn cmd_boards(config: &TaskboardConfig, command: BoardsCommands) -> Result<()> {
    let mut dashboard = Dashboard::new(connect(config)?)
        .with_default_columns(config.toml.board.default_columns.clone())
        .with_default_color(config.toml.board.default_color.clone());

    match command {
        BoardsCommands::List {
            search,
            updated_from,
            updated_to,
            min_tasks,
            max_tasks,
            json,
        } => {
            dashboard.load().await;
            if let Some(message) = dashboard.take_error() {
                anyhow::bail!("Failed to load boards: {}", message);
            }
            dashboard.filters = BoardFilters {
                search,
                updated_from,
                updated_to,
                min_tasks,
                max_tasks,
            };
            let boards = dashboard.filtered_boards();

            if json {
                println!("{}", serde_json::to_string_pretty(&boards)?);
                return Ok(());
            }
            if boards.is_empty() {
                println!("No boards found.");
                return Ok(());
            }
            for summary in boards {
                let board = &summary.board;
                println!(
                    "{}  {}  {}",
                    console::style(board.id).dim(),
                    console::style(&board.title).bold(),
                    console::style(format!(
                        "{} tasks · updated {}",
                        summary.tasks.len(),
                        board.updated_at.format("%Y-%m-%d")
                    ))
                    .dim()
                );
            }
        }
        BoardsCommands::Create {
            title,
            description,
            color,
            creator,
        } => {
            if title.trim().is_empty() {
                anyhow::bail!("Board title must not be blank");
            }
            let board = dashboard
                .create_board(NewBoardInput {
                    title,
                    description,
                    color,
                    creator,
                })
                .await
                .context("Failed to create board")?;
            println!(
                "{} {} ({})",
                console::style("Created board").green(),
                console::style(&board.title).bold(),
                board.id
            );
        }
    }
    Ok(())
}

pub async fn cmd_board(config: &TaskboardConfig, command: BoardCommands) -> Result<()> {
    match command {
        BoardCommands::Show {
            board_id,
            priority,
            assignee,
            due,
            json,
        } => {
            let mut session = open_board(config, board_id).await?;
            session.filters.priorities = priority.into_iter().collect();
            session.filters.assignees = assignee.into_iter().collect();
            session.filters.due_date = due;
            let columns = session.filtered_columns();
            let storage_base = config.toml.storage_public_url();

            if json {
                let users: Vec<_> = session
                    .users()
                    .iter()
                    .map(|user| {
                        let avatar_url = storage_base
                            .and_then(|base| PresencePayload::from(user).avatar_url(base));
                        serde_json::json!({
                            "id": user.id,
                            "full_name": user.full_name,
                            "avatar_url": avatar_url,
                        })
                    })
                    .collect();
                let out = serde_json::json!({
                    "board": session.board(),
                    "columns": columns,
                    "users": users,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            print_board(&session, &columns, storage_base);
        }
    }
    Ok(())
}

fn print_board(session: &BoardSession, columns: &[ColumnWithTasks], storage_base: Option<&str>) {
    if let Some(board) = session.board() {
        println!();
        println!("{}", console::style(&board.title).bold().cyan());
        if let Some(description) = &board.description {
            println!("{}", console::style(description).dim());
        }
        println!(
            "{}",
            console::style(format!(
                "{} tasks · {} users · by {}",
                session.task_count(),
                session.user_count(),
                board.creator
            ))
            .dim()
        );
    }
    for user in session.users() {
        let avatar = storage_base.and_then(|base| PresencePayload::from(user).avatar_url(base));
        match avatar {
            Some(url) => println!("  {} {}", user.full_name, console::style(url).dim()),
            None => println!("  {}", user.full_name),
        }
    }
    if session.active_filter_count() > 0 {
        println!(
            "{}",
            console::style(format!("{} filters active", session.active_filter_count())).yellow()
        );
    }

    for column in columns {
        println!();
        println!(
            "{} {}  {}",
            console::style(&column.column.title).bold(),
            console::style(format!("({})", column.tasks.len())).dim(),
            console::style(column.column.id).dim()
        );
        if column.tasks.is_empty() {
            println!("  {}", console::style("(empty)").dim());
        }
        for task in &column.tasks {
            println!("  {}", task_line(task));
        }
    }
    println!();
}

fn task_line(task: &Task) -> String {
    let priority = match task.priority {
        Priority::High => console::style("high").red().to_string(),
        Priority::Medium => console::style("medium").yellow().to_string(),
        Priority::Low => console::style("low").green().to_string(),
    };
    let mut line = format!("[{}] {}", priority, task.title);
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!(" @{}", assignee));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due));
    }
    format!("{}  {}", line, console::style(task.id).dim())
}

pub async fn cmd_task(config: &TaskboardConfig, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Create {
            board_id,
            title,
            column,
            priority,
            assignee,
            due,
            description,
        } => {
            let mut session = open_board(config, board_id).await?;
            let input = NewTaskInput {
                title,
                description,
                assignee,
                due_date: due,
                priority,
            };
            let task = match column {
                Some(column_id) => session.create_task(column_id, input).await,
                None => session.create_task_in_first_column(input).await,
            }
            .context("Failed to create task")?;
            println!(
                "{} {} ({})",
                console::style("Created task").green(),
                console::style(&task.title).bold(),
                task.id
            );
        }
        TaskCommands::Move {
            task_id,
            column_id,
            position,
        } => {
            if position < 0 {
                anyhow::bail!("Position must not be negative");
            }
            let backend = connect(config)?;
            backend
                .move_task(task_id, column_id, position)
                .await
                .context("Failed to move task")?;
            println!(
                "{} {} to column {} at position {}",
                console::style("Moved task").green(),
                task_id,
                column_id,
                position
            );
        }
    }
    Ok(())
}

pub async fn cmd_column(config: &TaskboardConfig, command: ColumnCommands) -> Result<()> {
    match command {
        ColumnCommands::Create { board_id, title } => {
            let mut session = open_board(config, board_id).await?;
            let column = session
                .create_column(&title)
                .await
                .context("Failed to create column")?;
            println!(
                "{} {} ({})",
                console::style("Created column").green(),
                console::style(&column.title).bold(),
                column.id
            );
        }
        ColumnCommands::Rename { column_id, title } => {
            if title.trim().is_empty() {
                anyhow::bail!("Column title must not be blank");
            }
            let backend = connect(config)?;
            let column = backend
                .update_column(
                    column_id,
                    &ColumnUpdate {
                        title: Some(title.trim().to_string()),
                        sort_order: None,
                    },
                )
                .await
                .context("Failed to rename column")?;
            println!(
                "{} {} ({})",
                console::style("Renamed column to").green(),
                console::style(&column.title).bold(),
                column.id
            );
        }
    }
    Ok(())
}
