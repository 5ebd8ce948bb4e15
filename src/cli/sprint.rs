//! huddle sprint command implementations.

use std::path::PathBuf;

use crate::board::SprintRecord;
use crate::cli::board::authorize_board;
use crate::cli::load_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;

pub struct NewOptions {
    pub board: String,
    pub name: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub board: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct SprintCreateOutput {
    board: String,
    sprint: SprintRecord,
}

#[derive(serde::Serialize)]
struct SprintListOutput {
    board: String,
    total: usize,
    sprints: Vec<SprintRecord>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Write)?;

    let sprint = ctx.boards.create_sprint(&board.id, &options.name)?;

    let output = SprintCreateOutput {
        board: board.id.clone(),
        sprint,
    };
    let mut human = HumanOutput::new("Sprint created");
    human.push_summary("Board", board.id);
    human.push_summary("ID", output.sprint.id.clone());
    human.push_summary("Name", output.sprint.name.clone());
    human.push_next_step("huddle task sprint <board> <task> --sprint <sprint>");
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "sprint new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let board = authorize_board(&ctx, &options.board, PermissionLevel::Read)?;

    let output = SprintListOutput {
        board: board.id.clone(),
        total: board.sprints.len(),
        sprints: board.sprints.clone(),
    };
    let mut human = HumanOutput::new("Sprints");
    human.push_summary("Board", board.id.clone());
    human.push_summary("Total", output.total.to_string());
    for sprint in &output.sprints {
        let assigned = board
            .tasks
            .iter()
            .filter(|t| t.sprint_id.as_deref() == Some(sprint.id.as_str()))
            .count();
        human.push_detail(format!(
            "{} {} ({} assigned tasks)",
            sprint.id, sprint.name, assigned
        ));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "sprint list",
        &output,
        Some(&human),
    )
}
