//! Replaying a pack on behalf of a CLTools module.
//!
//! Descriptors written by [`crate::cltools`] invoke a runner with
//! `UNPACKER DIRECTORY [--input-file NAME:PATH]... [--output-file NAME:PATH]...`.
//! The runner uploads every input into the unpacked experiment, runs it, and
//! downloads every output, each step being one call to the unpacker front end
//! from inside `DIRECTORY`.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

use crate::InspectError;
use crate::Result;

/// Environment variable telling the unpacker front end not to prompt.
pub const NON_INTERACTIVE_ENV: &str = "REPROUNZIP_NON_INTERACTIVE";

/// Front end invoked for every step unless told otherwise.
pub const DEFAULT_LAUNCHER: &str = "reprounzip";

/// A logical file name bound to a path on the host, written `NAME:PATH`.
///
/// Only the first `:` separates the two halves, so paths may contain colons.
///
/// # Examples
///
/// ```
/// use packinfo_core::replay::FileBinding;
///
/// let binding: FileBinding = "params:/tmp/a:b.txt".parse()?;
/// assert_eq!(binding.name, "params");
/// assert_eq!(binding.path.to_str(), Some("/tmp/a:b.txt"));
/// assert!("params".parse::<FileBinding>().is_err());
/// # Ok::<(), packinfo_core::InspectError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBinding {
    /// Logical file name recorded in the pack.
    pub name: String,
    /// Host path.
    pub path: PathBuf,
}

impl FromStr for FileBinding {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(Self {
                name: name.to_string(),
                path: PathBuf::from(path),
            }),
            _ => Err(InspectError::InvalidBinding(s.to_string())),
        }
    }
}

/// Ordered unpacker calls replaying one run: uploads, run, downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPlan {
    unpacker: String,
    directory: PathBuf,
    steps: Vec<Vec<String>>,
}

impl ReplayPlan {
    /// Plans the replay of the experiment unpacked in `directory`.
    #[must_use]
    pub fn new(
        unpacker: impl Into<String>,
        directory: impl Into<PathBuf>,
        inputs: &[FileBinding],
        outputs: &[FileBinding],
    ) -> Self {
        let mut steps = Vec::with_capacity(inputs.len() + outputs.len() + 1);
        for input in inputs {
            steps.push(vec![
                "upload".to_string(),
                ".".to_string(),
                format!("{}:{}", input.path.display(), input.name),
            ]);
        }
        steps.push(vec!["run".to_string(), ".".to_string()]);
        for output in outputs {
            steps.push(vec![
                "download".to_string(),
                ".".to_string(),
                format!("{}:{}", output.name, output.path.display()),
            ]);
        }

        Self {
            unpacker: unpacker.into(),
            directory: directory.into(),
            steps,
        }
    }

    /// Directory every step runs in.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full argument vectors of every step, launcher words first.
    ///
    /// `launcher` is split on whitespace, so `python -m reprounzip.main`
    /// works as well as a plain executable.
    #[must_use]
    pub fn command_lines(&self, launcher: &str) -> Vec<Vec<String>> {
        let mut prefix: Vec<String> = launcher.split_whitespace().map(str::to_string).collect();
        if prefix.is_empty() {
            prefix.push(DEFAULT_LAUNCHER.to_string());
        }
        prefix.push(self.unpacker.clone());

        self.steps
            .iter()
            .map(|step| prefix.iter().chain(step).cloned().collect())
            .collect()
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::Io`] if a step cannot be started and
    /// [`InspectError::Replay`] if one exits unsuccessfully.
    pub fn execute(&self, launcher: &str) -> Result<()> {
        tracing::info!(directory = %self.directory.display(), "replaying pack");
        for line in self.command_lines(launcher) {
            let rendered = CommandLine(&line).to_string();
            tracing::info!(command = %rendered, "running replay step");

            let Some((program, args)) = line.split_first() else {
                continue;
            };
            let status = Command::new(program)
                .args(args)
                .current_dir(&self.directory)
                .env(NON_INTERACTIVE_ENV, "y")
                .status()?;
            if !status.success() {
                return Err(InspectError::Replay {
                    command: rendered,
                    status,
                });
            }
        }
        Ok(())
    }
}

/// Space-joined rendering of an argument vector.
pub struct CommandLine<'a>(pub &'a [String]);

impl fmt::Display for CommandLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
