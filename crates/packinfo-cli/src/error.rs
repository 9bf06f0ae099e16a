//! Error conversion utilities for CLI.
//!
//! Converts packinfo-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use packinfo_core::InspectError;
use std::path::Path;

/// Converts `InspectError` to user-friendly anyhow error with context
pub fn convert_inspect_error(err: InspectError, pack: &Path) -> anyhow::Error {
    match err {
        InspectError::Config(reason) => {
            anyhow!(
                "Invalid pack metadata in '{}': {}\n\
                 HINT: The pack may have been created by an incompatible packer version.",
                pack.display(),
                reason
            )
        }
        InspectError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid pack '{}': {}\n\
                 HINT: The pack may be truncated or corrupted.",
                pack.display(),
                reason
            )
        }
        InspectError::Io(io_err) => {
            anyhow!("I/O error while reading '{}': {}", pack.display(), io_err)
        }
        InspectError::Probe { unpacker, source } => {
            anyhow!(
                "Compatibility check of unpacker '{}' failed for '{}': {}",
                unpacker,
                pack.display(),
                source
            )
        }
        err @ (InspectError::NegativeSize(_)
        | InspectError::InvalidBinding(_)
        | InspectError::Replay { .. }) => anyhow::Error::from(err)
            .context(format!("Error inspecting pack '{}'", pack.display())),
    }
}

/// Converts an error raised while replaying the experiment in `directory`
pub fn convert_replay_error(err: InspectError, directory: &Path) -> anyhow::Error {
    match err {
        InspectError::Replay { command, status } => {
            anyhow!(
                "Replay in '{}' failed at `{}` ({})\n\
                 HINT: Check that DIRECTORY was set up with the same unpacker.",
                directory.display(),
                command,
                status
            )
        }
        InspectError::Io(io_err) => {
            anyhow!(
                "Could not start replay step in '{}': {}\n\
                 HINT: Use --launcher to point at the unpacker front end.",
                directory.display(),
                io_err
            )
        }
        other => convert_inspect_error(other, directory),
    }
}

/// Adds pack context to a core result
pub fn add_pack_context<T>(
    result: Result<T, InspectError>,
    pack: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_inspect_error(e, pack))
}
