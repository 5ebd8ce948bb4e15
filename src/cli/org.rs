//! huddle org command implementations.

use std::path::PathBuf;

use crate::cli::load_context;
use crate::directory::{OrgRecord, OrgRole};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct NewOptions {
    pub name: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub org: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MemberAddOptions {
    pub org: String,
    pub member: String,
    pub role: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MemberSetRoleOptions {
    pub org: String,
    pub member: String,
    pub role: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MemberRmOptions {
    pub org: String,
    pub member: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct OrgCreateOutput {
    id: String,
    name: String,
    owner: String,
}

#[derive(serde::Serialize)]
struct OrgListOutput {
    total: usize,
    orgs: Vec<OrgRecord>,
}

#[derive(serde::Serialize)]
struct MemberChangeOutput {
    org: String,
    user: String,
    role: Option<String>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org = ctx.directory.create_org(&options.name, &ctx.user)?;

    let output = OrgCreateOutput {
        id: org.id.clone(),
        name: org.name.clone(),
        owner: ctx.user.clone(),
    };
    let mut human = HumanOutput::new("Organization created");
    human.push_summary("ID", org.id);
    human.push_summary("Name", org.name);
    human.push_summary("Owner", ctx.user);
    human.push_next_step("huddle group new <org> <name>");
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "org new",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let mut orgs = ctx.directory.list_orgs()?;
    orgs.retain(|org| org.is_member(&ctx.user));

    let output = OrgListOutput {
        total: orgs.len(),
        orgs,
    };
    let mut human = HumanOutput::new("Organizations");
    human.push_summary("Total", output.total.to_string());
    for org in &output.orgs {
        let role = org
            .member(&ctx.user)
            .map(|m| m.role.as_str())
            .unwrap_or("-");
        human.push_detail(format!("{} {} [{}]", org.id, org.name, role));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "org list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_member(&org_id)?;
    let org = ctx.directory.get_org(&org_id)?;

    let mut human = HumanOutput::new(format!("Organization {}", org.id));
    human.push_summary("Name", org.name.clone());
    human.push_summary("Members", org.members.len().to_string());
    human.push_summary("Groups", org.groups.len().to_string());
    for member in &org.members {
        human.push_detail(format!("{} [{}]", member.user, member.role.as_str()));
    }
    for group in &org.groups {
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
        "org show",
        &org,
        Some(&human),
    )
}

pub fn run_member_add(options: MemberAddOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_admin(&org_id)?;

    let role = OrgRole::parse(&options.role)?;
    ctx.directory.add_org_member(&org_id, &options.member, role)?;

    emit_member_change(
        options.json,
        options.quiet,
        "org member add",
        "Member added",
        &org_id,
        &options.member,
        Some(role.as_str()),
    )
}

pub fn run_member_set_role(options: MemberSetRoleOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    ctx.require_org_admin(&org_id)?;

    let role = OrgRole::parse(&options.role)?;
    ctx.directory.set_org_role(&org_id, &options.member, role)?;

    emit_member_change(
        options.json,
        options.quiet,
        "org member set-role",
        "Member role changed",
        &org_id,
        &options.member,
        Some(role.as_str()),
    )
}

pub fn run_member_rm(options: MemberRmOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let org_id = ctx.directory.resolve_org_id(&options.org)?;
    // Members may leave on their own; removing anyone else takes org admin.
    if options.member != ctx.user {
        ctx.require_org_admin(&org_id)?;
    }

    ctx.directory.remove_org_member(&org_id, &options.member)?;

    emit_member_change(
        options.json,
        options.quiet,
        "org member rm",
        "Member removed",
        &org_id,
        &options.member,
        None,
    )
}

fn emit_member_change(
    json: bool,
    quiet: bool,
    command: &str,
    header: &str,
    org_id: &str,
    member: &str,
    role: Option<&str>,
) -> Result<()> {
    let output = MemberChangeOutput {
        org: org_id.to_string(),
        user: member.to_string(),
        role: role.map(|r| r.to_string()),
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Org", org_id);
    human.push_summary("User", member);
    if let Some(role) = role {
        human.push_summary("Role", role);
    }
    emit_success(OutputOptions { json, quiet }, command, &output, Some(&human))
}
