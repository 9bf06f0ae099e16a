//! Compatibility probes for the standard unpackers.

use std::path::Path;

use super::Compatibility;
use super::CompatibilityProbe;
use super::ProbeResult;
use super::Unpacker;
use super::UnpackerRegistry;
use crate::host::HostEnvironment;
use crate::metadata::PackConfig;
use crate::metadata::Run;

const NOT_LINUX: &str = "This machine is not running Linux";
const NO_RUNS: &str = "Pack has no recorded runs";

/// Builds the registry of standard unpackers for `host`.
///
/// # Examples
///
/// ```
/// use packinfo_core::HostEnvironment;
/// use packinfo_core::unpackers::builtin_registry;
///
/// let registry = builtin_registry(&HostEnvironment::detect());
/// assert!(registry.iter().any(|(name, _)| name == "directory"));
/// ```
#[must_use]
pub fn builtin_registry(host: &HostEnvironment) -> UnpackerRegistry {
    let mut registry = UnpackerRegistry::new();
    registry.register("directory", SameArchitecture::new(host));
    registry.register("chroot", SameArchitecture::new(host));
    registry.register("installpkgs", SamePackageManager::new(host));
    registry.register("docker", ToolOnPath::new("docker"));
    registry.register("vagrant", ToolOnPath::new("vagrant"));
    registry.register("graph", NoProbe);
    registry
}

/// Unpacker that runs the pack natively: needs Linux on a compatible CPU.
#[derive(Debug, Clone)]
pub struct SameArchitecture {
    host: HostEnvironment,
}

impl SameArchitecture {
    /// Creates the probe for `host`.
    #[must_use]
    pub fn new(host: &HostEnvironment) -> Self {
        Self { host: host.clone() }
    }
}

impl CompatibilityProbe for SameArchitecture {
    fn test_compatibility(&self, _pack: &Path, config: &PackConfig) -> ProbeResult {
        let Some(run) = config.runs.first() else {
            return Ok(Compatibility::maybe(NO_RUNS));
        };

        if !self.host.is_linux() {
            return Ok(Compatibility::no(NOT_LINUX));
        }

        let current = self.host.architecture.as_str();
        let recorded = run.architecture.as_str();
        let i386_on_amd64 = matches!(recorded, "i386" | "i486" | "i586" | "i686")
            && matches!(current, "x86_64" | "amd64");

        if recorded == current || i386_on_amd64 {
            Ok(Compatibility::ok())
        } else {
            Ok(Compatibility::no("Different architecture"))
        }
    }
}

impl Unpacker for SameArchitecture {
    fn probe(&self) -> Option<&dyn CompatibilityProbe> {
        Some(self)
    }
}

/// Unpacker that installs the pack's software packages with the host's
/// package manager.
#[derive(Debug, Clone)]
pub struct SamePackageManager {
    host: HostEnvironment,
}

impl SamePackageManager {
    /// Creates the probe for `host`.
    #[must_use]
    pub fn new(host: &HostEnvironment) -> Self {
        Self { host: host.clone() }
    }
}

impl CompatibilityProbe for SamePackageManager {
    fn test_compatibility(&self, _pack: &Path, config: &PackConfig) -> ProbeResult {
        let Some(run) = config.runs.first() else {
            return Ok(Compatibility::maybe(NO_RUNS));
        };
        let Some(current) = &self.host.distribution else {
            return Ok(Compatibility::no(NOT_LINUX));
        };

        let recorded = recorded_distribution(run);
        let current = current.name.to_lowercase();
        if recorded == current {
            return Ok(Compatibility::ok());
        }

        match (package_manager(&recorded), package_manager(&current)) {
            (Some(a), Some(b)) if a == b => Ok(Compatibility::maybe(
                "Different distributions. Then again, it might work",
            )),
            _ => Ok(Compatibility::no("Different package managers")),
        }
    }
}

impl Unpacker for SamePackageManager {
    fn probe(&self) -> Option<&dyn CompatibilityProbe> {
        Some(self)
    }
}

/// Unpacker driven by an external tool that must be installed.
#[derive(Debug, Clone)]
pub struct ToolOnPath {
    tool: String,
}

impl ToolOnPath {
    /// Creates a probe looking for `tool` on `PATH`.
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl CompatibilityProbe for ToolOnPath {
    fn test_compatibility(&self, _pack: &Path, _config: &PackConfig) -> ProbeResult {
        match which::which(&self.tool) {
            Ok(path) => {
                tracing::debug!(tool = %self.tool, path = %path.display(), "found unpacker tool");
                Ok(Compatibility::ok())
            }
            Err(_) => Ok(Compatibility::maybe(format!("{} not found in PATH", self.tool))),
        }
    }
}

impl Unpacker for ToolOnPath {
    fn probe(&self) -> Option<&dyn CompatibilityProbe> {
        Some(self)
    }
}

/// Unpacker without a compatibility probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl Unpacker for NoProbe {}

fn recorded_distribution(run: &Run) -> String {
    run.distribution.name.to_lowercase()
}

fn package_manager(distribution: &str) -> Option<&'static str> {
    match distribution {
        "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some("dpkg"),
        "fedora" | "centos" | "rhel" | "rocky" | "almalinux" | "opensuse" | "opensuse-leap"
        | "sles" => Some("rpm"),
        "arch" | "manjaro" | "endeavouros" => Some("pacman"),
        _ => None,
    }
}
