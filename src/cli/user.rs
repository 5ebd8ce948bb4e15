//! huddle user command implementations.

use std::path::PathBuf;

use crate::actor;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

pub struct SetOptions {
    pub name: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct UserOutput {
    user: String,
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let storage = Storage::resolve(options.data_dir.as_deref())?;
    actor::persist_user(&storage, &options.name)?;

    let output = UserOutput {
        user: options.name.trim().to_string(),
    };
    let mut human = HumanOutput::new("Acting user set");
    human.push_summary("User", output.user.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user set",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let storage = Storage::resolve(options.data_dir.as_deref())?;
    let user = actor::resolve_user(&storage, options.user.as_deref())?;

    let output = UserOutput { user };
    let mut human = HumanOutput::new("Acting user");
    human.push_summary("User", output.user.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user show",
        &output,
        Some(&human),
    )
}
