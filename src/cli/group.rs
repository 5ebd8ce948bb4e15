//! huddle group command implementations.
//!
//! Group membership may be managed by an org admin or by an admin of the
//! group itself.

use std::path::PathBuf;

use crate::access;
use crate::cli::{load_context, Context};
use crate::directory::{GroupRecord, GroupRole};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

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

pub struct MemberAddOptions {
    pub group: String,
    pub member: String,
    pub role: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MemberSetRoleOptions {
    pub group: String,
    pub member: String,
    pub role: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MemberRmOptions {
    pub group: String,
    pub member: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct GroupCreateOutput {
    id: String,
    org: String,
    name: String,
}

#[derive(serde::Serialize)]
struct GroupListOutput {
    org: String,
    total: usize,
    groups: Vec<GroupRecord>,
}

#[derive(serde::Serialize)]
struct MemberChangeOutput {
    group: String,
    user: String,
    role: Option<String>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_admin(&org_id)?;

    let group = ctx.directory.create_group(&org_id, &options.name)?;

    let output = GroupCreateOutput {
        id: group.id.clone(),
        org: org_id.clone(),
        name: group.name.clone(),
    };
    let mut human = HumanOutput::new("Group created");
    human.push_summary("ID", group.id);
    human.push_summary("Org", org_id);
    human.push_summary("Name", group.name);
    human.push_next_step("huddle group member add <group> <user> --role admin");
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "group new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;

    let org = ctx.directory.get_org(&org_id)?;
    let output = GroupListOutput {
        org: org_id,
        total: org.groups.len(),
        groups: org.groups,
    };
    let mut human = HumanOutput::new("Groups");
    human.push_summary("Org", output.org.clone());
    human.push_summary("Total", output.total.to_string());
    for group in &output.groups {
        human.push_detail(format!(
            "{} {} ({} members)",
            group.id,
            group.name,
            group.members.len()
        ));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "group list",
        &output,
        Some(&human),
    )
}

pub fn run_member_add(options: MemberAddOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let group_id = ctx.directory.resolve_group_id(&options.group)?;
    require_group_admin(&ctx, &group_id)?;

    let role = GroupRole::parse(&options.role)?;
    ctx.directory
        .add_group_member(&group_id, &options.member, role)?;

    emit_member_change(
        options.json,
        options.quiet,
        "group member add",
        "Member added",
        &group_id,
        &options.member,
        Some(role.as_str()),
    )
}

pub fn run_member_set_role(options: MemberSetRoleOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let group_id = ctx.directory.resolve_group_id(&options.group)?;
    require_group_admin(&ctx, &group_id)?;

    let role = GroupRole::parse(&options.role)?;
    ctx.directory
        .set_group_role(&group_id, &options.member, role)?;

    emit_member_change(
        options.json,
        options.quiet,
        "group member set-role",
        "Member role changed",
        &group_id,
        &options.member,
        Some(role.as_str()),
    )
}

pub fn run_member_rm(options: MemberRmOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let group_id = ctx.directory.resolve_group_id(&options.group)?;
    // Members may leave on their own; removing anyone else takes an admin.
    if options.member != ctx.user {
        require_group_admin(&ctx, &group_id)?;
    }

    ctx.directory
        .remove_group_member(&group_id, &options.member)?;

    emit_member_change(
        options.json,
        options.quiet,
        "group member rm",
        "Member removed",
        &group_id,
        &options.member,
        None,
    )
}

fn require_group_admin(ctx: &Context, group_id: &str) -> Result<()> {
    let directory = ctx.directory.snapshot()?;
    let (org, group) = directory
        .find_group(group_id)
        .ok_or_else(|| Error::GroupNotFound(group_id.to_string()))?;

    if access::is_org_admin(&directory, &org.id, &ctx.user) {
        return Ok(());
    }
    let is_group_admin = group
        .member(&ctx.user)
        .map(|m| m.role == GroupRole::Admin)
        .unwrap_or(false);
    if is_group_admin {
        return Ok(());
    }
    Err(Error::Forbidden {
        user: ctx.user.clone(),
        resource: group_id.to_string(),
        required: "group admin".to_string(),
    })
}

fn emit_member_change(
    json: bool,
    quiet: bool,
    command: &str,
    header: &str,
    group_id: &str,
    member: &str,
    role: Option<&str>,
) -> Result<()> {
    let output = MemberChangeOutput {
        group: group_id.to_string(),
        user: member.to_string(),
        role: role.map(|r| r.to_string()),
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Group", group_id);
    human.push_summary("User", member);
    if let Some(role) = role {
        human.push_summary("Role", role);
    }
    emit_success(OutputOptions { json, quiet }, command, &output, Some(&human))
}
