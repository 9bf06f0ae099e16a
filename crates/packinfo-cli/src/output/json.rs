//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use packinfo_core::PackInfo;
use packinfo_core::metadata::Run;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        Self::output_to(&mut io::stdout(), value)
    }

    fn output_to<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(out, "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct PackOutput {
    compressed_size: u64,
    unpacked_size: u64,
    total_paths: usize,
    files: usize,
    directories: usize,
    symlinks: usize,
    others: usize,
}

#[derive(Serialize)]
struct MetadataOutput {
    total_paths: usize,
    packed_paths: usize,
    packages: usize,
    packed_packages: usize,
    packed_package_files: usize,
    unpacked_package_files: usize,
}

#[derive(Serialize)]
struct RunOutput {
    argv: Vec<String>,
    input_files: Vec<String>,
    output_files: Vec<String>,
    working_dir: String,
    termination: String,
}

impl From<&Run> for RunOutput {
    fn from(run: &Run) -> Self {
        Self {
            argv: run.argv.clone(),
            input_files: run.input_files.clone(),
            output_files: run.output_files.clone(),
            working_dir: run.working_dir.display().to_string(),
            termination: run.termination.to_string(),
        }
    }
}

#[derive(Serialize)]
struct UnpackerOutput {
    name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct InfoOutput {
    pack_file: String,
    pack: PackOutput,
    metadata: MetadataOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<String>,
    current_architecture: String,
    current_distribution: String,
    runs: Vec<RunOutput>,
    unpackers: Vec<UnpackerOutput>,
    warnings: Vec<String>,
}

impl From<&PackInfo> for InfoOutput {
    fn from(info: &PackInfo) -> Self {
        let stats = &info.pack_stats;
        let meta = &info.metadata;
        Self {
            pack_file: info.pack.display().to_string(),
            pack: PackOutput {
                compressed_size: info.compressed_size,
                unpacked_size: stats.total_size,
                total_paths: stats.total_paths,
                files: stats.files,
                directories: stats.directories,
                symlinks: stats.symlinks,
                others: stats.others,
            },
            metadata: MetadataOutput {
                total_paths: meta.total_paths,
                packed_paths: meta.packed_paths,
                packages: meta.packages,
                packed_packages: meta.packed_packages,
                packed_package_files: meta.packed_package_files,
                unpacked_package_files: meta.unpacked_package_files,
            },
            architecture: info.architecture.clone(),
            distribution: info.distribution.as_ref().map(ToString::to_string),
            current_architecture: info.host.architecture.clone(),
            current_distribution: info.host.distribution_label().to_string(),
            runs: info.runs.iter().map(RunOutput::from).collect(),
            unpackers: info
                .unpackers
                .iter()
                .map(|u| UnpackerOutput {
                    name: u.name.clone(),
                    status: u.compatibility.status.label(),
                    message: u.compatibility.message.clone(),
                })
                .collect(),
            warnings: info.warnings.clone(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_pack_info(&self, info: &PackInfo) -> Result<()> {
        let output = JsonOutput::success("info", InfoOutput::from(info));
        Self::output(&output)
    }

    fn format_cltools_result(&self, vistrails_dir: &Path, written: &[PathBuf]) -> Result<()> {
        #[derive(Serialize)]
        struct CltoolsOutput {
            vistrails_dir: String,
            modules: Vec<String>,
        }

        let data = CltoolsOutput {
            vistrails_dir: vistrails_dir.display().to_string(),
            modules: written.iter().map(|p| p.display().to_string()).collect(),
        };

        let output = JsonOutput::success("cltools", data);
        Self::output(&output)
    }

    fn format_replay(&self, directory: &Path, commands: &[String], executed: bool) -> Result<()> {
        #[derive(Serialize)]
        struct ReplayOutput<'a> {
            directory: String,
            commands: &'a [String],
            executed: bool,
        }

        let data = ReplayOutput {
            directory: directory.display().to_string(),
            commands,
            executed,
        };

        let output = JsonOutput::success("vistrails-run", data);
        Self::output(&output)
    }

    /// Warnings are separate documents; they go to stderr so stdout holds
    /// exactly one result document.
    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output_to(&mut io::stderr(), &output);
    }
}
