//! Command-line interface for huddle
//!
//! This module defines the CLI structure using clap derive macros.
//! Each entity gets its own submodule; every mutating command authorizes
//! through the permission resolver before touching a store, which makes the
//! CLI the reference resource-handler layer for the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::access::{self, ResourceView};
use crate::actor;
use crate::board::BoardStore;
use crate::config::Config;
use crate::directory::DirectoryStore;
use crate::error::{Error, Result};
use crate::grant::GrantStore;
use crate::project::ProjectStore;
use crate::storage::Storage;

mod access_cmd;
mod board;
mod grant;
mod group;
mod init;
mod org;
mod project;
mod sprint;
mod task;
mod user;

/// huddle - Multi-Tenant Collaboration
///
/// Organizations, groups, grants, projects, and Kanban boards, with one
/// permission resolver in front of every mutation.
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "HUDDLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Acting user identity
    #[arg(long, global = true, env = "HUDDLE_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the huddle data directory
    Init,

    /// Acting-user identity
    #[command(subcommand)]
    User(UserCommands),

    /// Organization management
    #[command(subcommand)]
    Org(OrgCommands),

    /// Group management
    #[command(subcommand)]
    Group(GroupCommands),

    /// Resource grant management
    #[command(subcommand)]
    Grant(GrantCommands),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Board management
    #[command(subcommand)]
    Board(BoardCommands),

    /// Column management on a board
    #[command(subcommand)]
    Column(ColumnCommands),

    /// Task management on a board
    #[command(subcommand)]
    Task(TaskCommands),

    /// Sprint management on a board
    #[command(subcommand)]
    Sprint(SprintCommands),

    /// Permission resolution
    #[command(subcommand)]
    Access(AccessCommands),
}

/// Acting-user subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Persist the acting-user identity
    Set {
        /// User identifier
        name: String,
    },

    /// Show the resolved acting user
    Show,
}

/// Organization subcommands
#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// Create an organization (you become its owner)
    New {
        /// Organization name
        name: String,
    },

    /// List organizations you belong to
    List,

    /// Show an organization with members and groups
    Show {
        /// Organization id (or prefix)
        org: String,
    },

    /// Membership management
    #[command(subcommand)]
    Member(OrgMemberCommands),
}

/// Organization membership subcommands
#[derive(Subcommand, Debug)]
pub enum OrgMemberCommands {
    /// Add a member
    Add {
        /// Organization id (or prefix)
        org: String,
        /// User identifier
        member: String,
        /// Role: owner, admin, member
        #[arg(long, default_value = "member")]
        role: String,
    },

    /// Change a member's role
    SetRole {
        /// Organization id (or prefix)
        org: String,
        /// User identifier
        member: String,
        /// Role: owner, admin, member
        role: String,
    },

    /// Remove a member
    Rm {
        /// Organization id (or prefix)
        org: String,
        /// User identifier
        member: String,
    },
}

/// Group subcommands
#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a group in an organization
    New {
        /// Organization id (or prefix)
        org: String,
        /// Group name
        name: String,
    },

    /// List groups of an organization
    List {
        /// Organization id (or prefix)
        org: String,
    },

    /// Membership management
    #[command(subcommand)]
    Member(GroupMemberCommands),
}

/// Group membership subcommands
#[derive(Subcommand, Debug)]
pub enum GroupMemberCommands {
    /// Add a member (the first member must be an admin)
    Add {
        /// Group id (or prefix)
        group: String,
        /// User identifier
        member: String,
        /// Role: admin, member
        #[arg(long, default_value = "member")]
        role: String,
    },

    /// Change a member's role
    SetRole {
        /// Group id (or prefix)
        group: String,
        /// User identifier
        member: String,
        /// Role: admin, member
        role: String,
    },

    /// Remove a member
    Rm {
        /// Group id (or prefix)
        group: String,
        /// User identifier
        member: String,
    },
}

/// Grant subcommands
#[derive(Subcommand, Debug)]
pub enum GrantCommands {
    /// Grant (or re-grant) a group a level on a project or board
    Set {
        /// Project or board id (or prefix)
        resource: String,
        /// Group id (or prefix)
        group: String,
        /// Permission level: read, write, admin
        level: String,
    },

    /// Remove a group's grant
    Rm {
        /// Project or board id (or prefix)
        resource: String,
        /// Group id (or prefix)
        group: String,
    },

    /// List the grants on a resource
    List {
        /// Project or board id (or prefix)
        resource: String,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project (you become its creator with implicit admin)
    New {
        /// Organization id (or prefix)
        org: String,
        /// Project name
        name: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
    },

    /// List projects of an organization
    List {
        /// Organization id (or prefix)
        org: String,
        /// Include archived projects
        #[arg(long)]
        all: bool,
    },

    /// Show a project
    Show {
        /// Project id (or prefix)
        id: String,
    },

    /// Edit name or description
    Edit {
        /// Project id (or prefix)
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description (empty clears it)
        #[arg(long)]
        description: Option<String>,
    },

    /// Archive a project
    Archive {
        /// Project id (or prefix)
        id: String,
    },

    /// Restore an archived project
    Unarchive {
        /// Project id (or prefix)
        id: String,
    },
}

/// Board subcommands
#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Create a board with the configured starter columns
    New {
        /// Organization id (or prefix)
        org: String,
        /// Board name
        name: String,
    },

    /// List boards of an organization
    List {
        /// Organization id (or prefix)
        org: String,
    },

    /// Show a board with its columns and tasks
    Show {
        /// Board id (or prefix)
        board: String,
        /// Restrict tasks to a sprint view (backlog tasks stay visible)
        #[arg(long)]
        sprint: Option<String>,
        /// Restrict tasks to the backlog
        #[arg(long, conflicts_with = "sprint")]
        backlog: bool,
    },
}

/// Column subcommands
#[derive(Subcommand, Debug)]
pub enum ColumnCommands {
    /// Add a column at the end of the board
    Add {
        /// Board id (or prefix)
        board: String,
        /// Column name
        name: String,
        /// WIP limit for the column
        #[arg(long)]
        wip: Option<u32>,
    },

    /// Make a column the default for new tasks
    SetDefault {
        /// Board id (or prefix)
        board: String,
        /// Column id or name
        column: String,
    },

    /// Reorder columns; every column of the board must be listed
    Reorder {
        /// Board id (or prefix)
        board: String,
        /// Column ids or names in the desired order
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Change or clear a column's WIP limit
    SetWip {
        /// Board id (or prefix)
        board: String,
        /// Column id or name
        column: String,
        /// New limit (omit to clear)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Delete an empty column
    Rm {
        /// Board id (or prefix)
        board: String,
        /// Column id or name
        column: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task (lands in the default column unless --column)
    New {
        /// Board id (or prefix)
        board: String,
        /// Task title
        title: String,
        /// Target column id or name
        #[arg(long)]
        column: Option<String>,
        /// Sprint id or name
        #[arg(long)]
        sprint: Option<String>,
    },

    /// List tasks on a board
    List {
        /// Board id (or prefix)
        board: String,
        /// Restrict to a sprint view (backlog tasks stay visible)
        #[arg(long)]
        sprint: Option<String>,
        /// Restrict to the backlog
        #[arg(long, conflicts_with = "sprint")]
        backlog: bool,
    },

    /// Move a task to another column (appended at the end)
    Move {
        /// Board id (or prefix)
        board: String,
        /// Task number (#n) or id
        task: String,
        /// Destination column id or name
        column: String,
    },

    /// Assign a task to a sprint, or back to the backlog
    Sprint {
        /// Board id (or prefix)
        board: String,
        /// Task number (#n) or id
        task: String,
        /// Sprint id or name
        #[arg(long)]
        sprint: Option<String>,
        /// Send the task back to the backlog
        #[arg(long, conflicts_with = "sprint")]
        backlog: bool,
    },

    /// Delete a task (its number is never reused)
    Rm {
        /// Board id (or prefix)
        board: String,
        /// Task number (#n) or id
        task: String,
    },
}

/// Sprint subcommands
#[derive(Subcommand, Debug)]
pub enum SprintCommands {
    /// Create a sprint on a board
    New {
        /// Board id (or prefix)
        board: String,
        /// Sprint name
        name: String,
    },

    /// List the sprints of a board
    List {
        /// Board id (or prefix)
        board: String,
    },
}

/// Access subcommands
#[derive(Subcommand, Debug)]
pub enum AccessCommands {
    /// Resolve a user's effective permission on a resource
    Resolve {
        /// Project or board id (or prefix)
        resource: String,
        /// User to resolve for (defaults to the acting user)
        #[arg(long)]
        r#for: Option<String>,
    },

    /// Check that the acting user holds at least a level on a resource
    Check {
        /// Project or board id (or prefix)
        resource: String,
        /// Required level: read, write, admin
        #[arg(long)]
        need: String,
    },
}

/// Everything a handler needs: stores over one data directory, the loaded
/// config, and the resolved acting user.
pub(crate) struct Context {
    pub config: Config,
    pub user: String,
    pub directory: DirectoryStore,
    pub grants: GrantStore,
    pub projects: ProjectStore,
    pub boards: BoardStore,
}

pub(crate) fn load_context(data_dir: Option<PathBuf>, user: Option<String>) -> Result<Context> {
    let storage = Storage::resolve(data_dir.as_deref())?;
    let config = Config::load_from_data_dir(storage.data_root());
    let user = actor::resolve_user(&storage, user.as_deref())?;

    Ok(Context {
        directory: DirectoryStore::new(storage.clone()),
        grants: GrantStore::new(storage.clone()),
        projects: ProjectStore::new(storage.clone()),
        boards: BoardStore::new(storage),
        config,
        user,
    })
}

impl Context {
    /// Look up a grant target by id or prefix: projects first, then boards.
    /// Absence is a not-found, reported before any permission check runs.
    pub(crate) fn find_resource(&self, input: &str) -> Result<ResourceView> {
        match self.projects.resolve_project_id(input) {
            Ok(project_id) => {
                let project = self.projects.get(&project_id)?;
                return Ok(ResourceView::from(&project));
            }
            Err(Error::ProjectNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        match self.boards.resolve_board_id(input) {
            Ok(board_id) => {
                let board = self.boards.load(&board_id)?;
                Ok(ResourceView::from(&board))
            }
            Err(Error::BoardNotFound(_)) => {
                Err(Error::ResourceNotFound(input.trim().to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Authorization for a read/mutation on an already-located resource.
    pub(crate) fn require_permission(
        &self,
        resource: &ResourceView,
        required: crate::permission::PermissionLevel,
    ) -> Result<()> {
        let directory = self.directory.snapshot()?;
        let grants = self.grants.snapshot()?;
        access::require_at_least(&directory, &grants, &self.user, resource, required)
    }

    /// Authorization for organization administration (memberships, groups,
    /// grants). Owners and org admins qualify.
    pub(crate) fn require_org_admin(&self, org_id: &str) -> Result<()> {
        let directory = self.directory.snapshot()?;
        if access::is_org_admin(&directory, org_id, &self.user) {
            return Ok(());
        }
        Err(Error::Forbidden {
            user: self.user.clone(),
            resource: org_id.to_string(),
            required: "org admin".to_string(),
        })
    }

    /// Authorization for plain membership in an organization.
    pub(crate) fn require_org_member(&self, org_id: &str) -> Result<()> {
        let directory = self.directory.snapshot()?;
        if access::is_org_member(&directory, org_id, &self.user) {
            return Ok(());
        }
        Err(Error::Forbidden {
            user: self.user.clone(),
            resource: org_id.to_string(),
            required: "org membership".to_string(),
        })
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let data_dir = self.data_dir;
        let user = self.user;
        let json = self.json;
        let quiet = self.quiet;

        match self.command {
            Commands::Init => init::run(init::InitOptions {
                data_dir,
                json,
                quiet,
            }),
            Commands::User(cmd) => match cmd {
                UserCommands::Set { name } => user::run_set(user::SetOptions {
                    name,
                    data_dir,
                    json,
                    quiet,
                }),
                UserCommands::Show => user::run_show(user::ShowOptions {
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },
            Commands::Org(cmd) => match cmd {
                OrgCommands::New { name } => org::run_new(org::NewOptions {
                    name,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                OrgCommands::List => org::run_list(org::ListOptions {
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                OrgCommands::Show { org } => org::run_show(org::ShowOptions {
                    org,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                OrgCommands::Member(cmd) => match cmd {
                    OrgMemberCommands::Add { org, member, role } => {
                        org::run_member_add(org::MemberAddOptions {
                            org,
                            member,
                            role,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                    OrgMemberCommands::SetRole { org, member, role } => {
                        org::run_member_set_role(org::MemberSetRoleOptions {
                            org,
                            member,
                            role,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                    OrgMemberCommands::Rm { org, member } => {
                        org::run_member_rm(org::MemberRmOptions {
                            org,
                            member,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                },
            },
            Commands::Group(cmd) => match cmd {
                GroupCommands::New { org, name } => group::run_new(group::NewOptions {
                    org,
                    name,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                GroupCommands::List { org } => group::run_list(group::ListOptions {
                    org,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                GroupCommands::Member(cmd) => match cmd {
                    GroupMemberCommands::Add { group, member, role } => {
                        group::run_member_add(group::MemberAddOptions {
                            group,
                            member,
                            role,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                    GroupMemberCommands::SetRole { group, member, role } => {
                        group::run_member_set_role(group::MemberSetRoleOptions {
                            group,
                            member,
                            role,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                    GroupMemberCommands::Rm { group, member } => {
                        group::run_member_rm(group::MemberRmOptions {
                            group,
                            member,
                            data_dir,
                            user,
                            json,
                            quiet,
                        })
                    }
                },
            },
            Commands::Grant(cmd) => match cmd {
                GrantCommands::Set { resource, group, level } => {
                    grant::run_set(grant::SetOptions {
                        resource,
                        group,
                        level,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                GrantCommands::Rm { resource, group } => grant::run_rm(grant::RmOptions {
                    resource,
                    group,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                GrantCommands::List { resource } => grant::run_list(grant::ListOptions {
                    resource,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },
            Commands::Project(cmd) => match cmd {
                ProjectCommands::New { org, name, description } => {
                    project::run_new(project::NewOptions {
                        org,
                        name,
                        description,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ProjectCommands::List { org, all } => project::run_list(project::ListOptions {
                    org,
                    all,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                ProjectCommands::Show { id } => project::run_show(project::ShowOptions {
                    id,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                ProjectCommands::Edit { id, name, description } => {
                    project::run_edit(project::EditOptions {
                        id,
                        name,
                        description,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ProjectCommands::Archive { id } => project::run_archive(project::ArchiveOptions {
                    id,
                    archived: true,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                ProjectCommands::Unarchive { id } => {
                    project::run_archive(project::ArchiveOptions {
                        id,
                        archived: false,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
            },
            Commands::Board(cmd) => match cmd {
                BoardCommands::New { org, name } => board::run_new(board::NewOptions {
                    org,
                    name,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                BoardCommands::List { org } => board::run_list(board::ListOptions {
                    org,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                BoardCommands::Show { board, sprint, backlog } => {
                    board::run_show(board::ShowOptions {
                        board,
                        sprint,
                        backlog,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
            },
            Commands::Column(cmd) => match cmd {
                ColumnCommands::Add { board, name, wip } => {
                    board::run_column_add(board::ColumnAddOptions {
                        board,
                        name,
                        wip,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ColumnCommands::SetDefault { board, column } => {
                    board::run_column_set_default(board::ColumnSetDefaultOptions {
                        board,
                        column,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ColumnCommands::Reorder { board, columns } => {
                    board::run_column_reorder(board::ColumnReorderOptions {
                        board,
                        columns,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ColumnCommands::SetWip { board, column, limit } => {
                    board::run_column_set_wip(board::ColumnSetWipOptions {
                        board,
                        column,
                        limit,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                ColumnCommands::Rm { board, column } => {
                    board::run_column_rm(board::ColumnRmOptions {
                        board,
                        column,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New { board, title, column, sprint } => {
                    task::run_new(task::NewOptions {
                        board,
                        title,
                        column,
                        sprint,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                TaskCommands::List { board, sprint, backlog } => {
                    task::run_list(task::ListOptions {
                        board,
                        sprint,
                        backlog,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                TaskCommands::Move { board, task: task_ref, column } => {
                    task::run_move(task::MoveOptions {
                        board,
                        task: task_ref,
                        column,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                TaskCommands::Sprint { board, task: task_ref, sprint, backlog } => {
                    task::run_sprint(task::SprintOptions {
                        board,
                        task: task_ref,
                        sprint,
                        backlog,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                TaskCommands::Rm { board, task: task_ref } => task::run_rm(task::RmOptions {
                    board,
                    task: task_ref,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },
            Commands::Sprint(cmd) => match cmd {
                SprintCommands::New { board, name } => sprint::run_new(sprint::NewOptions {
                    board,
                    name,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
                SprintCommands::List { board } => sprint::run_list(sprint::ListOptions {
                    board,
                    data_dir,
                    user,
                    json,
                    quiet,
                }),
            },
            Commands::Access(cmd) => match cmd {
                AccessCommands::Resolve { resource, r#for } => {
                    access_cmd::run_resolve(access_cmd::ResolveOptions {
                        resource,
                        target_user: r#for,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
                AccessCommands::Check { resource, need } => {
                    access_cmd::run_check(access_cmd::CheckOptions {
                        resource,
                        need,
                        data_dir,
                        user,
                        json,
                        quiet,
                    })
                }
            },
        }
    }
}
