//! CLTools command implementation

use crate::cli::CltoolsArgs;
use crate::error::add_pack_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use chrono::Utc;
use packinfo_core::cltools::write_cltools_modules;
use packinfo_core::load_config;
use std::env;
use std::path::PathBuf;

const VISTRAILS_DIR: &str = ".vistrails";

pub fn execute(args: &CltoolsArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let vistrails_dir = match &args.vistrails_dir {
        Some(dir) => dir.clone(),
        None => default_vistrails_dir()?,
    };

    let config = add_pack_context(load_config(&args.pack), &args.pack)?;
    if config.runs.is_empty() {
        formatter.format_warning("Pack has no recorded runs; no modules written");
    }

    let written = add_pack_context(
        write_cltools_modules(&config, &vistrails_dir, &args.command, Utc::now()),
        &args.pack,
    )?;

    formatter.format_cltools_result(&vistrails_dir, &written)
}

fn default_vistrails_dir() -> Result<PathBuf> {
    let home = env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .context("HOME is not set\nHINT: Pass --vistrails-dir explicitly.")?;
    Ok(PathBuf::from(home).join(VISTRAILS_DIR))
}
