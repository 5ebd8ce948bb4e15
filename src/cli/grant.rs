//! huddle grant command implementations.
//!
//! Grant management requires administering the resource: effective admin on
//! it (creator or granted) or org owner/admin. The granted group must
//! belong to the same organization as the resource.

use std::path::PathBuf;

use crate::access;
use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::grant::GrantRecord;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;

pub struct SetOptions {
    pub resource: String,
    pub group: String,
    pub level: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub resource: String,
    pub group: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub resource: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct GrantChangeOutput {
    resource: String,
    group: String,
    level: Option<PermissionLevel>,
    created: Option<bool>,
}

#[derive(serde::Serialize)]
struct GrantListOutput {
    resource: String,
    total: usize,
    grants: Vec<GrantRecord>,
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let resource = ctx.find_resource(&options.resource)?;
    let group_id = ctx.directory.resolve_group_id(&options.group)?;
    let level: PermissionLevel = options.level.parse()?;

    let directory = ctx.directory.snapshot()?;
    let grants = ctx.grants.snapshot()?;
    if !access::can_administer(&directory, &grants, &ctx.user, &resource) {
        return Err(Error::Forbidden {
            user: ctx.user.clone(),
            resource: resource.id.clone(),
            required: "admin".to_string(),
        });
    }

    let (org, _) = directory
        .find_group(&group_id)
        .ok_or_else(|| Error::GroupNotFound(group_id.clone()))?;
    if org.id != resource.org_id {
        return Err(Error::InvariantViolation(format!(
            "group {} belongs to {}, resource {} to {}",
            group_id, org.id, resource.id, resource.org_id
        )));
    }

    let created = ctx
        .grants
        .set_grant(&resource.id, &group_id, level, Some(ctx.user.clone()))?;

    let output = GrantChangeOutput {
        resource: resource.id.clone(),
        group: group_id.clone(),
        level: Some(level),
        created: Some(created),
    };
    let mut human = HumanOutput::new(if created {
        "Grant created"
    } else {
        "Grant updated"
    });
    human.push_summary("Resource", resource.id);
    human.push_summary("Group", group_id);
    human.push_summary("Level", level.to_string());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "grant set",
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let resource = ctx.find_resource(&options.resource)?;
    let group_id = ctx.directory.resolve_group_id(&options.group)?;

    let directory = ctx.directory.snapshot()?;
    let grants = ctx.grants.snapshot()?;
    if !access::can_administer(&directory, &grants, &ctx.user, &resource) {
        return Err(Error::Forbidden {
            user: ctx.user.clone(),
            resource: resource.id.clone(),
            required: "admin".to_string(),
        });
    }

    ctx.grants.remove_grant(&resource.id, &group_id)?;

    let output = GrantChangeOutput {
        resource: resource.id.clone(),
        group: group_id.clone(),
        level: None,
        created: None,
    };
    let mut human = HumanOutput::new("Grant removed");
    human.push_summary("Resource", resource.id);
    human.push_summary("Group", group_id);
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "grant rm",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let resource = ctx.find_resource(&options.resource)?;

    let directory = ctx.directory.snapshot()?;
    let grants_snapshot = ctx.grants.snapshot()?;
    let readable = access::authorize_at_least(
        &directory,
        &grants_snapshot,
        &ctx.user,
        &resource,
        PermissionLevel::Read,
    ) || access::can_administer(&directory, &grants_snapshot, &ctx.user, &resource);
    if !readable {
        return Err(Error::Forbidden {
            user: ctx.user.clone(),
            resource: resource.id.clone(),
            required: "read".to_string(),
        });
    }

    let grants = ctx.grants.list_for_resource(&resource.id)?;
    let output = GrantListOutput {
        resource: resource.id.clone(),
        total: grants.len(),
        grants,
    };
    let mut human = HumanOutput::new("Grants");
    human.push_summary("Resource", resource.id);
    human.push_summary("Total", output.total.to_string());
    for grant in &output.grants {
        human.push_detail(format!("{} -> {}", grant.group_id, grant.level));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "grant list",
        &output,
        Some(&human),
    )
}
