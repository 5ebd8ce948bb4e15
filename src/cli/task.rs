//! huddle task command implementations.
//!
//! Task mutations require `write` on the board; listing requires `read`.

use std::path::PathBuf;

use crate::board::TaskRecord;
use crate::cli::board::{authorize_board, view_filter};
use crate::cli::load_context;
use crate::error::Result;
use crate::ordering;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;

pub struct NewOptions {
    pub board: String,
    pub title: String,
    pub column: Option<String>,
    pub sprint: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub board: String,
    pub sprint: Option<String>,
    pub backlog: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MoveOptions {
    pub board: String,
    pub task: String,
    pub column: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct SprintOptions {
    pub board: String,
    pub task: String,
    pub sprint: Option<String>,
    pub backlog: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub board: String,
    pub task: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct TaskChangeOutput {
    board: String,
    task: TaskRecord,
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    board: String,
    total: usize,
    tasks: Vec<TaskRecord>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Write)?;

    let task = ctx.boards.create_task(
        &board.id,
        &options.title,
        options.column.as_deref(),
        options.sprint.as_deref(),
        Some(ctx.user.clone()),
    )?;

    let output = TaskChangeOutput {
        board: board.id.clone(),
        task,
    };
    let mut human = HumanOutput::new("Task created");
    human.push_summary("Board", board.id);
    human.push_summary("Number", format!("#{}", output.task.number));
    human.push_summary("Title", output.task.title.clone());
    human.push_summary("Column", output.task.column_id.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Read)?;

    let filter = view_filter(&board, options.sprint.as_deref(), options.backlog)?;
    let tasks: Vec<TaskRecord> = ordering::filter_tasks(&board, &filter)
        .into_iter()
        .cloned()
        .collect();

    let output = TaskListOutput {
        board: board.id.clone(),
        total: tasks.len(),
        tasks,
    };
    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Board", board.id.clone());
    human.push_summary("Total", output.total.to_string());
    for task in &output.tasks {
        let column = board
            .column(&task.column_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        let sprint = task
            .sprint_id
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        human.push_detail(format!("#{} {} ({}){}", task.number, task.title, column, sprint));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &output,
        Some(&human),
    )
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Write)?;

    let task = ctx.boards.move_task(&board.id, &options.task, &options.column)?;

    let output = TaskChangeOutput {
        board: board.id.clone(),
        task,
    };
    let mut human = HumanOutput::new("Task moved");
    human.push_summary("Board", board.id);
    human.push_summary("Number", format!("#{}", output.task.number));
    human.push_summary("Column", output.task.column_id.clone());
    human.push_summary("Position", output.task.position.to_string());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task move",
        &output,
        Some(&human),
    )
}

pub fn run_sprint(options: SprintOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Write)?;

    // --backlog and no --sprint both mean "unassign".
    let sprint = if options.backlog { None } else { options.sprint };
    let task = ctx
        .boards
        .assign_sprint(&board.id, &options.task, sprint.as_deref())?;

    let output = TaskChangeOutput {
        board: board.id.clone(),
        task,
    };
    let mut human = HumanOutput::new(match output.task.sprint_id.as_deref() {
        Some(_) => "Task assigned to sprint",
        None => "Task moved to backlog",
    });
    human.push_summary("Board", board.id);
    human.push_summary("Number", format!("#{}", output.task.number));
    if let Some(sprint_id) = output.task.sprint_id.as_deref() {
        human.push_summary("Sprint", sprint_id);
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task sprint",
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Write)?;

    let task = ctx.boards.delete_task(&board.id, &options.task)?;

    let output = TaskChangeOutput {
        board: board.id.clone(),
        task,
    };
    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("Board", board.id);
    human.push_summary("Number", format!("#{}", output.task.number));
    human.push_warning("task numbers are never reused".to_string());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task rm",
        &output,
        Some(&human),
    )
}
