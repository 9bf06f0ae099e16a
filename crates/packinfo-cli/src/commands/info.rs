//! Info command implementation

use crate::cli::InfoArgs;
use crate::error::add_pack_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use packinfo_core::HostEnvironment;
use packinfo_core::inspect_pack;
use packinfo_core::unpackers::builtin_registry;

pub fn execute(args: &InfoArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let host = HostEnvironment::detect();
    tracing::info!(os = %host.os, arch = %host.architecture, "detected host");

    let registry = builtin_registry(&host);
    let info = add_pack_context(inspect_pack(&args.pack, &registry, &host), &args.pack)?;

    formatter.format_pack_info(&info)
}
