//! Unpacker backends and their compatibility probes.
//!
//! An unpacker is a replay target for a pack (plain directory, chroot,
//! container, virtual machine, ...). Some of them can tell in advance whether
//! a given pack will work on this machine; those expose a
//! [`CompatibilityProbe`]. The registry itself is filled by the caller.
//!
//! # Examples
//!
//! ```
//! use packinfo_core::unpackers::{Unpacker, UnpackerRegistry};
//!
//! struct Graph;
//! impl Unpacker for Graph {}
//!
//! let mut registry = UnpackerRegistry::new();
//! registry.register("graph", Graph);
//! assert_eq!(registry.len(), 1);
//! ```

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ProbeFailure;
use crate::metadata::PackConfig;

pub use builtin::builtin_registry;

/// Three-way compatibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatStatus {
    /// The unpacker should work.
    Compatible,
    /// The unpacker may or may not work.
    Unknown,
    /// The unpacker will not work.
    Incompatible,
}

impl CompatStatus {
    /// Section order used in reports.
    pub const ALL: [Self; 3] = [Self::Compatible, Self::Unknown, Self::Incompatible];

    /// Heading used for this group in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compatible => "Compatible",
            Self::Unknown => "Unknown",
            Self::Incompatible => "Incompatible",
        }
    }
}

impl fmt::Display for CompatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a compatibility probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibility {
    /// Classification.
    pub status: CompatStatus,
    /// Optional diagnostic shown next to the unpacker name.
    pub message: Option<String>,
}

impl Compatibility {
    /// The unpacker should work.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: CompatStatus::Compatible,
            message: None,
        }
    }

    /// The unpacker may work; `message` explains the doubt.
    pub fn maybe(message: impl Into<String>) -> Self {
        Self {
            status: CompatStatus::Unknown,
            message: Some(message.into()),
        }
    }

    /// The unpacker will not work; `message` explains why.
    pub fn no(message: impl Into<String>) -> Self {
        Self {
            status: CompatStatus::Incompatible,
            message: Some(message.into()),
        }
    }
}

impl From<CompatStatus> for Compatibility {
    fn from(status: CompatStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }
}

/// Outcome of running a probe.
pub type ProbeResult = std::result::Result<Compatibility, ProbeFailure>;

/// Judges whether a pack can be replayed by an unpacker.
pub trait CompatibilityProbe {
    /// Classifies the pack at `pack` with the parsed `config`.
    ///
    /// # Errors
    ///
    /// An error aborts the whole report.
    fn test_compatibility(&self, pack: &Path, config: &PackConfig) -> ProbeResult;
}

/// A registered replay backend.
pub trait Unpacker {
    /// Compatibility probe, if this unpacker has one.
    fn probe(&self) -> Option<&dyn CompatibilityProbe> {
        None
    }
}

/// Name-ordered collection of unpackers.
#[derive(Default)]
pub struct UnpackerRegistry {
    unpackers: BTreeMap<String, Box<dyn Unpacker>>,
}

impl UnpackerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `unpacker` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, unpacker: impl Unpacker + 'static) {
        self.unpackers.insert(name.into(), Box::new(unpacker));
    }

    /// Iterates over the unpackers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Unpacker)> {
        self.unpackers
            .iter()
            .map(|(name, unpacker)| (name.as_str(), unpacker.as_ref()))
    }

    /// Number of registered unpackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unpackers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unpackers.is_empty()
    }
}

impl fmt::Debug for UnpackerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.unpackers.keys()).finish()
    }
}
