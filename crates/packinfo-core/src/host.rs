//! Description of the machine running the report.

use std::fmt;

use crate::metadata::Distribution;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Operating system, architecture and distribution of the current host.
///
/// Captured once per invocation and passed explicitly, so reports and
/// compatibility probes stay deterministic under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Operating system family, as in `std::env::consts::OS`.
    pub os: String,
    /// Machine architecture, e.g. `x86_64`.
    pub architecture: String,
    /// Linux distribution; `None` on other systems.
    pub distribution: Option<Distribution>,
}

impl HostEnvironment {
    /// Describes the current host.
    #[must_use]
    pub fn detect() -> Self {
        let os = std::env::consts::OS.to_string();
        let distribution = (os == "linux").then(read_os_release);
        Self {
            os,
            architecture: machine_architecture(std::env::consts::ARCH).to_string(),
            distribution,
        }
    }

    /// Describes a Linux host.
    pub fn linux(architecture: impl Into<String>, distribution: Distribution) -> Self {
        Self {
            os: "linux".to_string(),
            architecture: architecture.into(),
            distribution: Some(distribution),
        }
    }

    /// Returns `true` on Linux hosts.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    /// Displayable distribution, distinguishing "not Linux" from "unknown".
    #[must_use]
    pub const fn distribution_label(&self) -> DistributionLabel<'_> {
        DistributionLabel(self.distribution.as_ref())
    }
}

/// Display adapter for an optional host distribution.
pub struct DistributionLabel<'a>(Option<&'a Distribution>);

impl fmt::Display for DistributionLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(distribution) => fmt::Display::fmt(distribution, f),
            None => f.write_str("(not Linux)"),
        }
    }
}

/// Maps Rust's architecture names to the kernel's `uname -m` spelling.
fn machine_architecture(arch: &str) -> &str {
    match arch {
        "x86" => "i686",
        "powerpc64" => "ppc64",
        other => other,
    }
}

fn read_os_release() -> Distribution {
    OS_RELEASE_PATHS
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
        .map(|content| parse_os_release(&content))
        .unwrap_or_default()
}

/// Extracts `ID` and `VERSION_ID` from an os-release document.
#[must_use]
pub fn parse_os_release(content: &str) -> Distribution {
    let mut distribution = Distribution::default();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match key {
            "ID" => distribution.name = value.to_string(),
            "VERSION_ID" => distribution.version = value.to_string(),
            _ => {}
        }
    }
    distribution
}
