//! huddle project command implementations.
//!
//! Creation requires organization membership; edits require `write`,
//! archiving requires `admin`. The creator holds implicit admin through the
//! resolver, so a fresh project is immediately manageable by its creator.

use std::path::PathBuf;

use crate::access::ResourceView;
use crate::cli::load_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;
use crate::project::ProjectRecord;

pub struct NewOptions {
    pub org: String,
    pub name: String,
    pub description: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub org: String,
    pub all: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ArchiveOptions {
    pub id: String,
    pub archived: bool,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ProjectCreateOutput {
    id: String,
    org: String,
    name: String,
    creator: String,
}

#[derive(serde::Serialize)]
struct ProjectListOutput {
    org: String,
    total: usize,
    projects: Vec<ProjectRecord>,
}

#[derive(serde::Serialize)]
struct ProjectChangeOutput {
    id: String,
    changed: bool,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;

    let project = ctx
        .projects
        .create(&org_id, &options.name, options.description, &ctx.user)?;

    let output = ProjectCreateOutput {
        id: project.id.clone(),
        org: org_id,
        name: project.name.clone(),
        creator: project.creator.clone(),
    };
    let mut human = HumanOutput::new("Project created");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Name", output.name.clone());
    human.push_summary("Creator", output.creator.clone());
    human.push_next_step("huddle grant set <project> <group> <level>");
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;

    let projects = ctx.projects.list(Some(&org_id), options.all)?;
    let output = ProjectListOutput {
        org: org_id,
        total: projects.len(),
        projects,
    };
    let mut human = HumanOutput::new("Projects");
    human.push_summary("Org", output.org.clone());
    human.push_summary("Total", output.total.to_string());
    for project in &output.projects {
        let mut line = format!("{} {}", project.id, project.name);
        if project.archived {
            line.push_str(" [archived]");
        }
        human.push_detail(line);
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let project_id = ctx.projects.resolve_project_id(&options.id)?;
    let project = ctx.projects.get(&project_id)?;
    ctx.require_permission(&ResourceView::from(&project), PermissionLevel::Read)?;

    let mut human = HumanOutput::new(format!("Project {}", project.id));
    human.push_summary("Name", project.name.clone());
    human.push_summary("Org", project.org_id.clone());
    human.push_summary("Creator", project.creator.clone());
    human.push_summary("Archived", project.archived.to_string());
    if let Some(description) = project.description.as_ref() {
        human.push_summary("Description", description.clone());
    }
    human.push_summary("Created", project.created_at.to_rfc3339());
    human.push_summary("Updated", project.updated_at.to_rfc3339());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project show",
        &project,
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let project_id = ctx.projects.resolve_project_id(&options.id)?;
    let project = ctx.projects.get(&project_id)?;
    ctx.require_permission(&ResourceView::from(&project), PermissionLevel::Write)?;

    let changed = ctx
        .projects
        .edit(&project_id, options.name, options.description)?;

    let output = ProjectChangeOutput {
        id: project_id.clone(),
        changed,
    };
    let mut human = HumanOutput::new(if changed {
        "Project updated"
    } else {
        "No project changes"
    });
    human.push_summary("ID", project_id);
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project edit",
        &output,
        Some(&human),
    )
}

pub fn run_archive(options: ArchiveOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let project_id = ctx.projects.resolve_project_id(&options.id)?;
    let project = ctx.projects.get(&project_id)?;
    ctx.require_permission(&ResourceView::from(&project), PermissionLevel::Admin)?;

    let changed = ctx.projects.set_archived(&project_id, options.archived)?;

    let output = ProjectChangeOutput {
        id: project_id.clone(),
        changed,
    };
    let title = if options.archived {
        if changed {
            "Project archived"
        } else {
            "Project already archived"
        }
    } else if changed {
        "Project unarchived"
    } else {
        "Project already active"
    };
    let mut human = HumanOutput::new(title);
    human.push_summary("ID", project_id);
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        if options.archived {
            "project archive"
        } else {
            "project unarchive"
        },
        &output,
        Some(&human),
    )
}
