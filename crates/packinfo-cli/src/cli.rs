//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use packinfo_core::cltools::DEFAULT_COMMAND;
use packinfo_core::replay::DEFAULT_LAUNCHER;
use packinfo_core::replay::FileBinding;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packinfo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show pack statistics and unpacker compatibility
    Info(InfoArgs),
    /// Generate VisTrails CLTools modules for the pack's runs
    Cltools(CltoolsArgs),
    /// Replay a pack for a CLTools module: upload inputs, run, download outputs
    VistrailsRun(VistrailsRunArgs),
    /// Generate a shell completion script
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct InfoArgs {
    /// Path to the pack file
    #[arg(value_name = "PACK")]
    pub pack: PathBuf,
}

#[derive(clap::Args)]
pub struct CltoolsArgs {
    /// Path to the pack file
    #[arg(value_name = "PACK")]
    pub pack: PathBuf,

    /// VisTrails directory (default: ~/.vistrails)
    #[arg(long, value_name = "DIR")]
    pub vistrails_dir: Option<PathBuf>,

    /// Command the generated modules run
    #[arg(long, value_name = "CMD", default_value = DEFAULT_COMMAND)]
    pub command: String,
}

#[derive(clap::Args)]
pub struct VistrailsRunArgs {
    /// Unpacker the experiment was unpacked with
    #[arg(value_name = "UNPACKER")]
    pub unpacker: String,

    /// Directory holding the unpacked experiment
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Input file to upload before running (can be repeated)
    #[arg(long = "input-file", value_name = "NAME:PATH")]
    pub input_files: Vec<FileBinding>,

    /// Output file to download after running (can be repeated)
    #[arg(long = "output-file", value_name = "NAME:PATH")]
    pub output_files: Vec<FileBinding>,

    /// Unpacker front end to invoke
    #[arg(long, value_name = "CMD", default_value = DEFAULT_LAUNCHER)]
    pub launcher: String,

    /// Print the planned commands without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_info() {
        let cli = Cli::try_parse_from(["packinfo", "-v", "info", "run.rpz"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.json);
        match cli.command {
            Commands::Info(args) => assert_eq!(args.pack, PathBuf::from("run.rpz")),
            _ => panic!("expected info command"),
        }
    }

    #[test]
    fn test_parse_cltools_defaults() {
        let cli = Cli::try_parse_from(["packinfo", "cltools", "run.rpz"]).unwrap();
        match cli.command {
            Commands::Cltools(args) => {
                assert_eq!(args.command, DEFAULT_COMMAND);
                assert!(args.vistrails_dir.is_none());
            }
            _ => panic!("expected cltools command"),
        }
    }

    #[test]
    fn test_parse_vistrails_run() {
        let cli = Cli::try_parse_from([
            "packinfo",
            "vistrails-run",
            "docker",
            "/srv/unpacked",
            "--input-file",
            "params:/tmp/params.txt",
            "--input-file",
            "seed:/tmp/seed",
            "--output-file",
            "trace:/tmp/trace.log",
        ])
        .unwrap();
        match cli.command {
            Commands::VistrailsRun(args) => {
                assert_eq!(args.unpacker, "docker");
                assert_eq!(args.input_files.len(), 2);
                assert_eq!(args.output_files[0].name, "trace");
                assert_eq!(args.launcher, DEFAULT_LAUNCHER);
                assert!(!args.dry_run);
            }
            _ => panic!("expected vistrails-run command"),
        }
    }

    #[test]
    fn test_vistrails_run_rejects_binding_without_colon() {
        let result = Cli::try_parse_from([
            "packinfo",
            "vistrails-run",
            "docker",
            ".",
            "--input-file",
            "params",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["packinfo", "-v", "-q", "info", "run.rpz"]).is_err());
    }
}
