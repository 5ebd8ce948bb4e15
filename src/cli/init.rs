//! huddle init command implementation.
//!
//! Creates the data directory structure and a default config file.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

pub struct InitOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitOutput {
    data_dir: String,
    already_initialized: bool,
    created_config: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let storage = Storage::resolve(options.data_dir.as_deref())?;
    let already_initialized = storage.is_initialized();
    storage.init()?;

    let config_path = storage.config_file();
    let created_config = if config_path.exists() {
        false
    } else {
        Config::default().save(&config_path)?;
        true
    };

    let output = InitOutput {
        data_dir: storage.data_root().display().to_string(),
        already_initialized,
        created_config,
    };

    let mut human = HumanOutput::new("huddle initialized");
    human.push_summary("Data dir", output.data_dir.clone());
    if created_config {
        human.push_summary("Config", "huddle.toml created");
    }
    if already_initialized {
        human.push_warning("data directory already existed");
    }
    human.push_next_step("huddle user set <name>");
    human.push_next_step("huddle org new <name>");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &output,
        Some(&human),
    )
}
