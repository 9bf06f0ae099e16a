//! Pack information report.
//!
//! [`inspect_pack`] reconciles a pack's metadata with its archive contents and
//! asks every registered unpacker whether it can replay the pack.
//! [`PackInfo::render`] turns the result into the plain-text report.

use std::fmt;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::InspectError;
use crate::Result;
use crate::host::HostEnvironment;
use crate::metadata::Distribution;
use crate::metadata::PackConfig;
use crate::metadata::Run;
use crate::metadata::load_config;
use crate::size::hsize;
use crate::stats::MetadataStats;
use crate::stats::PackStats;
use crate::stats::scan_pack;
use crate::unpackers::CompatStatus;
use crate::unpackers::Compatibility;
use crate::unpackers::UnpackerRegistry;

/// Compatibility verdict for one registered unpacker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackerStatus {
    /// Registry name.
    pub name: String,
    /// Probe outcome, or `Unknown` when the unpacker has no probe.
    pub compatibility: Compatibility,
}

/// Everything known about a pack, ready to be rendered.
#[derive(Debug, Clone)]
pub struct PackInfo {
    /// Path of the pack file.
    pub pack: PathBuf,
    /// Size of the pack file on disk, in bytes.
    pub compressed_size: u64,
    /// Counts of the `DATA/` entries.
    pub pack_stats: PackStats,
    /// Aggregates from the metadata document.
    pub metadata: MetadataStats,
    /// Recorded runs.
    pub runs: Vec<Run>,
    /// Architecture of the first run.
    pub architecture: Option<String>,
    /// Distribution of the first run.
    pub distribution: Option<Distribution>,
    /// Machine the report was produced on.
    pub host: HostEnvironment,
    /// Unpacker verdicts, in registry order.
    pub unpackers: Vec<UnpackerStatus>,
    /// Non-fatal inconsistencies found in the metadata.
    pub warnings: Vec<String>,
}

/// Inspects the pack at `pack`.
///
/// The metadata document is loaded first; nothing else is looked at if it is
/// missing or malformed.
///
/// # Errors
///
/// Returns [`InspectError::Config`] for a bad metadata document,
/// [`InspectError::Io`] or [`InspectError::InvalidArchive`] if the pack cannot
/// be read, and [`InspectError::Probe`] if any compatibility probe fails.
///
/// # Examples
///
/// ```no_run
/// use packinfo_core::HostEnvironment;
/// use packinfo_core::inspect_pack;
/// use packinfo_core::unpackers::builtin_registry;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = HostEnvironment::detect();
/// let registry = builtin_registry(&host);
/// let info = inspect_pack(Path::new("experiment.rpz"), &registry, &host)?;
/// info.render(&mut std::io::stdout())?;
/// # Ok(())
/// # }
/// ```
pub fn inspect_pack(
    pack: &Path,
    registry: &UnpackerRegistry,
    host: &HostEnvironment,
) -> Result<PackInfo> {
    let config = load_config(pack)?;
    let pack_stats = scan_pack(pack)?;
    let compressed_size = std::fs::metadata(pack)?.len();
    let metadata = MetadataStats::from_config(&config);

    let mut warnings = Vec::new();
    let (architecture, distribution) = match config.runs.split_first() {
        Some((first, rest)) => {
            if rest.iter().any(|r| r.architecture != first.architecture) {
                warnings.push("Runs have different architectures".to_string());
            }
            if rest.iter().any(|r| r.distribution != first.distribution) {
                warnings.push("Runs have different distributions".to_string());
            }
            (
                Some(first.architecture.clone()),
                Some(first.distribution.clone()),
            )
        }
        None => (None, None),
    };
    for warning in &warnings {
        tracing::warn!(pack = %pack.display(), "{warning}");
    }

    let unpackers = probe_unpackers(pack, &config, registry)?;

    Ok(PackInfo {
        pack: pack.to_path_buf(),
        compressed_size,
        pack_stats,
        metadata,
        runs: config.runs,
        architecture,
        distribution,
        host: host.clone(),
        unpackers,
        warnings,
    })
}

fn probe_unpackers(
    pack: &Path,
    config: &PackConfig,
    registry: &UnpackerRegistry,
) -> Result<Vec<UnpackerStatus>> {
    registry
        .iter()
        .map(|(name, unpacker)| -> Result<UnpackerStatus> {
            let compatibility = match unpacker.probe() {
                Some(probe) => probe.test_compatibility(pack, config).map_err(|source| {
                    InspectError::Probe {
                        unpacker: name.to_string(),
                        source,
                    }
                })?,
                None => CompatStatus::Unknown.into(),
            };
            tracing::debug!(unpacker = name, status = %compatibility.status, "probed unpacker");
            Ok(UnpackerStatus {
                name: name.to_string(),
                compatibility,
            })
        })
        .collect()
}

impl PackInfo {
    /// Unpackers classified as `status`, in registry order.
    pub fn unpackers_with(&self, status: CompatStatus) -> impl Iterator<Item = &UnpackerStatus> {
        self.unpackers
            .iter()
            .filter(move |u| u.compatibility.status == status)
    }

    /// Writes the plain-text report.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn render<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let stats = &self.pack_stats;
        writeln!(out, "Pack file: {}", self.pack.display())?;
        writeln!(out, "----- Pack information -----")?;
        writeln!(out, "Compressed size: {}", hsize(self.compressed_size))?;
        writeln!(out, "Unpacked size: {}", hsize(stats.total_size))?;
        writeln!(out, "Total packed paths: {}", stats.total_paths)?;
        writeln!(out, "    Files: {}", stats.files)?;
        writeln!(out, "    Directories: {}", stats.directories)?;
        writeln!(out, "    Symbolic links: {}", stats.symlinks)?;
        if stats.others > 0 {
            writeln!(out, "    Other: {}", stats.others)?;
        }

        let meta = &self.metadata;
        writeln!(out, "----- Metadata -----")?;
        writeln!(out, "Total paths: {}", meta.total_paths)?;
        writeln!(out, "Listed packed paths: {}", meta.packed_paths)?;
        if meta.packages > 0 {
            writeln!(out, "Total software packages: {}", meta.packages)?;
            writeln!(out, "Packed software packages: {}", meta.packed_packages)?;
            writeln!(
                out,
                "    Files from packed software packages: {}",
                meta.packed_package_files
            )?;
            writeln!(
                out,
                "    Files from unpacked software packages: {}",
                meta.unpacked_package_files
            )?;
        }

        if let (Some(architecture), Some(distribution)) = (&self.architecture, &self.distribution)
        {
            writeln!(
                out,
                "Architecture: {architecture} (current: {})",
                self.host.architecture
            )?;
            writeln!(
                out,
                "Distribution: {distribution} (current: {})",
                self.host.distribution_label()
            )?;
            writeln!(out, "Executions ({}):", self.runs.len())?;
            for run in &self.runs {
                writeln!(out, "    {}", run.argv.join(" "))?;
                writeln!(out, "        input files: {}", run.input_files.join(", "))?;
                writeln!(out, "        output files: {}", run.output_files.join(", "))?;
                writeln!(out, "        wd: {}", run.working_dir.display())?;
                writeln!(out, "        {}", run.termination)?;
            }
        }

        writeln!(out, "----- Unpackers -----")?;
        for status in CompatStatus::ALL {
            let group: Vec<&UnpackerStatus> = self.unpackers_with(status).collect();
            if group.is_empty() {
                continue;
            }
            writeln!(out, "{status} ({}):", group.len())?;
            for unpacker in group {
                match &unpacker.compatibility.message {
                    Some(message) => writeln!(out, "    {} ({message})", unpacker.name)?,
                    None => writeln!(out, "    {}", unpacker.name)?,
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for PackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = Vec::new();
        self.render(&mut buffer).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buffer))
    }
}
