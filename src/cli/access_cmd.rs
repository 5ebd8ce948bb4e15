//! huddle access command implementations.
//!
//! Exposes the resolver directly so operators can answer "what can this
//! user do here" without reading the grant tables by hand.

use std::path::PathBuf;

use crate::access;
use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::permission::PermissionLevel;

pub struct ResolveOptions {
    pub resource: String,
    pub target_user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CheckOptions {
    pub resource: String,
    pub need: String,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ResolveOutput {
    resource: String,
    user: String,
    level: Option<PermissionLevel>,
    creator: bool,
    org_member: bool,
}

#[derive(serde::Serialize)]
struct CheckOutput {
    resource: String,
    user: String,
    required: PermissionLevel,
    level: Option<PermissionLevel>,
    allowed: bool,
}

pub fn run_resolve(options: ResolveOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let resource = ctx.find_resource(&options.resource)?;
    let target = options.target_user.unwrap_or_else(|| ctx.user.clone());

    let directory = ctx.directory.snapshot()?;
    let grants = ctx.grants.snapshot()?;
    let level = access::resolve(&directory, &grants, &target, &resource);

    let output = ResolveOutput {
        resource: resource.id.clone(),
        user: target.clone(),
        level,
        creator: resource.creator == target,
        org_member: access::is_org_member(&directory, &resource.org_id, &target),
    };
    let mut human = HumanOutput::new("Effective permission");
    human.push_summary("Resource", resource.id);
    human.push_summary("User", target);
    human.push_summary(
        "Level",
        level.map(|l| l.to_string()).unwrap_or_else(|| "none".to_string()),
    );
    if output.creator {
        human.push_detail("creator override applies".to_string());
    }
    if !output.org_member {
        human.push_detail("not a member of the owning organization".to_string());
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "access resolve",
        &output,
        Some(&human),
    )
}

pub fn run_check(options: CheckOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user)?;
    let resource = ctx.find_resource(&options.resource)?;
    let required: PermissionLevel = options.need.parse()?;

    let directory = ctx.directory.snapshot()?;
    let grants = ctx.grants.snapshot()?;
    let level = access::resolve(&directory, &grants, &ctx.user, &resource);
    let allowed = access::authorize_at_least(&directory, &grants, &ctx.user, &resource, required);

    let output = CheckOutput {
        resource: resource.id.clone(),
        user: ctx.user.clone(),
        required,
        level,
        allowed,
    };

    if !allowed {
        // The check command's failure is the Forbidden error itself, so the
        // exit code carries the answer for scripts.
        return Err(Error::Forbidden {
            user: ctx.user.clone(),
            resource: resource.id.clone(),
            required: required.to_string(),
        });
    }

    let mut human = HumanOutput::new("Access allowed");
    human.push_summary("Resource", resource.id);
    human.push_summary("Required", required.to_string());
    human.push_summary(
        "Level",
        level.map(|l| l.to_string()).unwrap_or_else(|| "none".to_string()),
    );
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "access check",
        &output,
        Some(&human),
    )
}
