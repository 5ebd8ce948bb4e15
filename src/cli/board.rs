//! huddle board and column command implementations.
//!
//! Board creation requires organization membership. Structural changes
//! (columns, defaults, ordering) require `admin` on the board; viewing
//! requires `read`.

use std::path::PathBuf;

use crate::access::ResourceView;
use crate::board::{BoardRecord, ColumnRecord, TaskRecord};
use crate::cli::{load_context, Context};
use crate::error::Result;
use crate::ordering::{self, SprintFilter};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;

pub struct NewOptions {
    pub org: String,
    pub name: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub org: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub board: String,
    pub sprint: Option<String>,
    pub backlog: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ColumnAddOptions {
    pub board: String,
    pub name: String,
    pub wip: Option<u32>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ColumnSetDefaultOptions {
    pub board: String,
    pub column: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ColumnReorderOptions {
    pub board: String,
    pub columns: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ColumnSetWipOptions {
    pub board: String,
    pub column: String,
    pub limit: Option<u32>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ColumnRmOptions {
    pub board: String,
    pub column: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct BoardCreateOutput {
    id: String,
    org: String,
    name: String,
    columns: Vec<ColumnRecord>,
}

#[derive(serde::Serialize)]
struct BoardListEntry {
    id: String,
    name: String,
    columns: usize,
    tasks: usize,
}

#[derive(serde::Serialize)]
struct BoardListOutput {
    org: String,
    total: usize,
    boards: Vec<BoardListEntry>,
}

#[derive(serde::Serialize)]
struct BoardShowOutput {
    id: String,
    org: String,
    name: String,
    creator: String,
    columns: Vec<ColumnRecord>,
    tasks: Vec<TaskRecord>,
}

#[derive(serde::Serialize)]
struct ColumnChangeOutput {
    board: String,
    column: ColumnRecord,
}

#[derive(serde::Serialize)]
struct ColumnOrderOutput {
    board: String,
    columns: Vec<String>,
}

/// Resolve the board and check the caller's level on it in one step.
pub(crate) fn authorize_board(
    ctx: &Context,
    input: &str,
    required: PermissionLevel,
) -> Result<BoardRecord> {
    let board_id = ctx.boards.resolve_board_id(input)?;
    let board = ctx.boards.load(&board_id)?;
    ctx.require_permission(&ResourceView::from(&board), required)?;
    Ok(board)
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;

    let board = ctx
        .boards
        .create(&org_id, &options.name, &ctx.user, &ctx.config.boards)?;

    let output = BoardCreateOutput {
        id: board.id.clone(),
        org: org_id,
        name: board.name.clone(),
        columns: board.columns_sorted().into_iter().cloned().collect(),
    };
    let mut human = HumanOutput::new("Board created");
    human.push_summary("ID", board.id.clone());
    human.push_summary("Name", board.name.clone());
    for column in &output.columns {
        let marker = if column.is_default { " (default)" } else { "" };
        human.push_detail(format!("{} {}{}", column.id, column.name, marker));
    }
    human.push_next_step("huddle task new <board> <title>");
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;

    let boards = ctx.boards.list_for_org(&org_id)?;
    let output = BoardListOutput {
        org: org_id,
        total: boards.len(),
        boards: boards
            .iter()
            .map(|b| BoardListEntry {
                id: b.id.clone(),
                name: b.name.clone(),
                columns: b.columns.len(),
                tasks: b.tasks.len(),
            })
            .collect(),
    };
    let mut human = HumanOutput::new("Boards");
    human.push_summary("Org", output.org.clone());
    human.push_summary("Total", output.total.to_string());
    for board in &output.boards {
        human.push_detail(format!(
            "{} {} ({} columns, {} tasks)",
            board.id, board.name, board.columns, board.tasks
        ));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Read)?;

    let filter = view_filter(&board, options.sprint.as_deref(), options.backlog)?;
    let tasks: Vec<TaskRecord> = ordering::filter_tasks(&board, &filter)
        .into_iter()
        .cloned()
        .collect();

    let output = BoardShowOutput {
        id: board.id.clone(),
        org: board.org_id.clone(),
        name: board.name.clone(),
        creator: board.creator.clone(),
        columns: board.columns_sorted().into_iter().cloned().collect(),
        tasks,
    };
    let mut human = HumanOutput::new(format!("Board {} - {}", board.id, board.name));
    for column in &output.columns {
        let marker = if column.is_default { " (default)" } else { "" };
        let wip = column
            .wip_limit
            .map(|l| format!(" wip:{l}"))
            .unwrap_or_default();
        human.push_summary(
            format!("{}{}", column.name, marker),
            format!(
                "{} tasks{}",
                output.tasks.iter().filter(|t| t.column_id == column.id).count(),
                wip
            ),
        );
    }
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
        "board show",
        &output,
        Some(&human),
    )
}

pub fn run_column_add(options: ColumnAddOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Admin)?;

    let column = ctx.boards.add_column(&board.id, &options.name, options.wip)?;

    emit_column_change(
        options.json,
        options.quiet,
        "column add",
        "Column added",
        &board.id,
        column,
    )
}

pub fn run_column_set_default(options: ColumnSetDefaultOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Admin)?;

    let column = ctx.boards.set_default_column(&board.id, &options.column)?;

    emit_column_change(
        options.json,
        options.quiet,
        "column set-default",
        "Default column set",
        &board.id,
        column,
    )
}

pub fn run_column_reorder(options: ColumnReorderOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Admin)?;

    ctx.boards.reorder_columns(&board.id, &options.columns)?;

    let reordered = ctx.boards.load(&board.id)?;
    let output = ColumnOrderOutput {
        board: board.id.clone(),
        columns: reordered
            .columns_sorted()
            .iter()
            .map(|c| c.id.clone())
            .collect(),
    };
    let mut human = HumanOutput::new("Columns reordered");
    human.push_summary("Board", board.id);
    for column in reordered.columns_sorted() {
        human.push_detail(format!("{} {} @{}", column.id, column.name, column.position));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "column reorder",
        &output,
        Some(&human),
    )
}

pub fn run_column_set_wip(options: ColumnSetWipOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Admin)?;

    let column = ctx
        .boards
        .set_wip_limit(&board.id, &options.column, options.limit)?;

    emit_column_change(
        options.json,
        options.quiet,
        "column set-wip",
        if options.limit.is_some() {
            "WIP limit set"
        } else {
            "WIP limit cleared"
        },
        &board.id,
        column,
    )
}

pub fn run_column_rm(options: ColumnRmOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Admin)?;

    let removed = ctx.boards.delete_column(&board.id, &options.column)?;

    emit_column_change(
        options.json,
        options.quiet,
        "column rm",
        "Column deleted",
        &board.id,
        removed,
    )
}

pub(crate) fn view_filter(
    board: &BoardRecord,
    sprint: Option<&str>,
    backlog: bool,
) -> Result<SprintFilter> {
    if backlog {
        return Ok(SprintFilter::Backlog);
    }
    match sprint {
        Some(input) => Ok(SprintFilter::Sprint(board.resolve_sprint(input)?)),
        None => Ok(SprintFilter::All),
    }
}

fn emit_column_change(
    json: bool,
    quiet: bool,
    command: &str,
    header: &str,
    board_id: &str,
    column: ColumnRecord,
) -> Result<()> {
    let output = ColumnChangeOutput {
        board: board_id.to_string(),
        column,
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Board", board_id);
    human.push_summary("Column", format!("{} ({})", output.column.name, output.column.id));
    if let Some(limit) = output.column.wip_limit {
        human.push_summary("WIP limit", limit.to_string());
    }
    emit_success(OutputOptions { json, quiet }, command, &output, Some(&human))
}
