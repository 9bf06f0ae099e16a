//! Pack metadata reconciliation and unpacker compatibility reporting.
//!
//! `packinfo-core` reads packs produced by a reproducible-execution packer (a
//! tar container with a `DATA/` tree and a `METADATA/config.yml` document),
//! cross-checks the metadata against the archive contents, and asks a set of
//! unpacker backends whether they can replay the pack on this machine.
//!
//! # Examples
//!
//! ```no_run
//! use packinfo_core::HostEnvironment;
//! use packinfo_core::inspect_pack;
//! use packinfo_core::unpackers::builtin_registry;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = HostEnvironment::detect();
//! let registry = builtin_registry(&host);
//! let info = inspect_pack(Path::new("experiment.rpz"), &registry, &host)?;
//! println!("{} packed paths", info.pack_stats.total_paths);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cltools;
pub mod error;
pub mod formats;
pub mod host;
pub mod metadata;
pub mod replay;
pub mod report;
pub mod size;
pub mod stats;
#[doc(hidden)]
pub mod test_utils;
pub mod unpackers;

pub use error::InspectError;
pub use error::Result;
pub use host::HostEnvironment;
pub use metadata::PackConfig;
pub use metadata::load_config;
pub use report::PackInfo;
pub use report::inspect_pack;
pub use size::hsize;
pub use size::hsize_signed;
pub use stats::MetadataStats;
pub use stats::PackStats;
pub use unpackers::CompatStatus;
pub use unpackers::Compatibility;
pub use unpackers::UnpackerRegistry;
