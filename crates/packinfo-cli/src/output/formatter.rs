//! Output formatter trait for CLI results.

use anyhow::Result;
use packinfo_core::PackInfo;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the pack information report
    fn format_pack_info(&self, info: &PackInfo) -> Result<()>;

    /// Format the list of generated CLTools modules
    fn format_cltools_result(&self, vistrails_dir: &Path, written: &[PathBuf]) -> Result<()>;

    /// Format the command lines of a replay, run or only planned
    fn format_replay(&self, directory: &Path, commands: &[String], executed: bool) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data,
        }
    }
}
