//! VisTrails CLTools descriptors.
//!
//! VisTrails wraps command-line programs as workflow modules through small
//! JSON files in `~/.vistrails/CLTools`. One descriptor is generated per
//! recorded run; its ports are the run's logical input and output files, and
//! the wrapped command replays the pack with the chosen unpacker.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

use crate::Result;
use crate::metadata::PackConfig;
use crate::metadata::Run;

/// Subdirectory of the VisTrails directory holding descriptors.
pub const CLTOOLS_DIR: &str = "CLTools";

/// Descriptor file extension.
pub const CLTOOLS_EXTENSION: &str = "clt";

/// Command wrapped by generated descriptors unless told otherwise.
pub const DEFAULT_COMMAND: &str = "reprounzip-vistrails";

const MODULE_PREFIX: &str = "reprounzip_";
const MODULE_HASH_LEN: usize = 7;

/// Options attached to a CLTools argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArgOptions {
    /// Flag emitted before the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    /// Text prepended to the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// One CLTools argument: `[kind, name, type, options]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CltoolsArg(pub String, pub String, pub String, pub ArgOptions);

impl CltoolsArg {
    fn constant(value: &str) -> Self {
        Self(
            "constant".to_string(),
            value.to_string(),
            "flag".to_string(),
            ArgOptions::default(),
        )
    }

    fn string_input(name: &str) -> Self {
        Self(
            "input".to_string(),
            name.to_string(),
            "string".to_string(),
            ArgOptions::default(),
        )
    }

    fn file(kind: &str, name: &str, flag: &str) -> Self {
        Self(
            kind.to_string(),
            format!("{kind} {name}"),
            "file".to_string(),
            ArgOptions {
                flag: Some(flag.to_string()),
                prefix: Some(format!("{name}:")),
            },
        )
    }
}

/// `options` block of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CltoolsOptions {
    /// Routes standard streams through files; older VisTrails releases
    /// misbehave without it.
    pub std_using_files: String,
}

/// A complete CLTools module description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CltoolsDescriptor {
    /// Provenance note.
    #[serde(rename = "_comment")]
    pub comment: String,
    /// Executable to run.
    pub command: String,
    /// Arguments, in command-line order.
    pub args: Vec<CltoolsArg>,
    /// Execution options.
    pub options: CltoolsOptions,
    /// Expected return code; anything else is reported as a failure.
    pub return_code: i32,
    /// Standard output port.
    pub stdout: (String, String, ArgOptions),
}

impl CltoolsDescriptor {
    /// Describes `run`, wrapped by `command`.
    ///
    /// `command` is split on whitespace: the first word is the executable and
    /// the rest become constant arguments.
    #[must_use]
    pub fn for_run(run: &Run, command: &str, generated_at: DateTime<Utc>) -> Self {
        let mut words = command.split_whitespace();
        let executable = words.next().unwrap_or(DEFAULT_COMMAND).to_string();

        let mut args: Vec<CltoolsArg> = words.map(CltoolsArg::constant).collect();
        args.push(CltoolsArg::string_input("unpacker"));
        args.push(CltoolsArg::string_input("directory"));
        args.extend(
            run.input_files
                .iter()
                .map(|name| CltoolsArg::file("input", name, "--input-file")),
        );
        args.extend(
            run.output_files
                .iter()
                .map(|name| CltoolsArg::file("output", name, "--output-file")),
        );

        Self {
            comment: format!(
                "This file was generated by packinfo {} at {}",
                env!("CARGO_PKG_VERSION"),
                generated_at.to_rfc3339()
            ),
            command: executable,
            args,
            options: CltoolsOptions {
                std_using_files: String::new(),
            },
            return_code: 0,
            stdout: (
                "stdout".to_string(),
                "file".to_string(),
                ArgOptions::default(),
            ),
        }
    }

    /// Serializes the descriptor as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        json.push('\n');
        Ok(json)
    }
}

/// Stable module name for `run`, derived from its sorted input and output
/// names only.
///
/// # Examples
///
/// ```
/// use packinfo_core::cltools::module_name;
/// # use packinfo_core::metadata::{Distribution, Run, Termination};
/// # let run = Run {
/// #     id: None,
/// #     architecture: "x86_64".into(),
/// #     distribution: Distribution::default(),
/// #     argv: vec!["./sim".into()],
/// #     working_dir: "/".into(),
/// #     input_files: vec!["params".into()],
/// #     output_files: vec!["result".into()],
/// #     termination: Termination::ExitCode(0),
/// # };
/// let name = module_name(&run);
/// assert!(name.starts_with("reprounzip_"));
/// assert_eq!(name.len(), "reprounzip_".len() + 7);
/// ```
#[must_use]
pub fn module_name(run: &Run) -> String {
    let mut inputs: Vec<&str> = run.input_files.iter().map(String::as_str).collect();
    let mut outputs: Vec<&str> = run.output_files.iter().map(String::as_str).collect();
    inputs.sort_unstable();
    outputs.sort_unstable();

    let mut hasher = Sha1::new();
    for name in inputs {
        hasher.update(format!("input {name}\n"));
    }
    for name in outputs {
        hasher.update(format!("output {name}\n"));
    }

    let encoded: String = STANDARD
        .encode(hasher.finalize())
        .chars()
        .map(|c| match c {
            '+' => '@',
            '/' => '$',
            other => other,
        })
        .take(MODULE_HASH_LEN)
        .collect();
    format!("{MODULE_PREFIX}{encoded}")
}

/// Writes one descriptor per run of `config` under
/// `<vistrails_dir>/CLTools/`, returning the written paths in run order.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub fn write_cltools_modules(
    config: &PackConfig,
    vistrails_dir: &Path,
    command: &str,
    generated_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    let dir = vistrails_dir.join(CLTOOLS_DIR);
    fs::create_dir_all(&dir)?;

    let mut written = Vec::with_capacity(config.runs.len());
    for run in &config.runs {
        let path = dir
            .join(module_name(run))
            .with_extension(CLTOOLS_EXTENSION);
        tracing::info!(path = %path.display(), "writing CLTools definition");
        let descriptor = CltoolsDescriptor::for_run(run, command, generated_at);
        fs::write(&path, descriptor.to_json()?)?;
        written.push(path);
    }
    Ok(written)
}
