//! VisTrails replay command implementation

use crate::cli::VistrailsRunArgs;
use crate::output::OutputFormatter;
use anyhow::Result;
use packinfo_core::replay::CommandLine;
use packinfo_core::replay::ReplayPlan;

pub fn execute(args: &VistrailsRunArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let plan = ReplayPlan::new(
        args.unpacker.as_str(),
        args.directory.as_path(),
        &args.input_files,
        &args.output_files,
    );
    let commands: Vec<String> = plan
        .command_lines(&args.launcher)
        .iter()
        .map(|line| CommandLine(line).to_string())
        .collect();

    if !args.dry_run {
        plan.execute(&args.launcher).map_err(|err| {
            crate::error::convert_replay_error(err, plan.directory())
        })?;
    }

    formatter.format_replay(plan.directory(), &commands, !args.dry_run)
}
