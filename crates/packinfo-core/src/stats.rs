//! Archive-side and metadata-side pack statistics.

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::GzDecoder;

use crate::InspectError;
use crate::Result;
use crate::formats::open_pack;
use crate::metadata::PackConfig;

/// Namespace holding the packed file tree.
pub const DATA_PREFIX: &str = "DATA";

/// Nested data archive used by format-2 packs.
pub const NESTED_DATA_MEMBER: &str = "DATA.tar.gz";

/// Kind of a pack entry, as far as the report cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Hard link, device node, FIFO or anything else.
    Other,
}

impl From<tar::EntryType> for EntryKind {
    fn from(entry_type: tar::EntryType) -> Self {
        match entry_type {
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => {
                Self::File
            }
            tar::EntryType::Directory => Self::Directory,
            tar::EntryType::Symlink => Self::Symlink,
            _ => Self::Other,
        }
    }
}

/// Counts of the `DATA/` entries found in a pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Sum of entry sizes, in bytes.
    pub total_size: u64,
    /// Number of entries under `DATA/`.
    pub total_paths: usize,
    /// Regular files.
    pub files: usize,
    /// Directories.
    pub directories: usize,
    /// Symbolic links.
    pub symlinks: usize,
    /// Everything else.
    pub others: usize,
}

impl PackStats {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one `DATA/` entry.
    pub fn record(&mut self, kind: EntryKind, size: u64) {
        self.total_size = self.total_size.saturating_add(size);
        self.total_paths += 1;
        match kind {
            EntryKind::File => self.files += 1,
            EntryKind::Directory => self.directories += 1,
            EntryKind::Symlink => self.symlinks += 1,
            EntryKind::Other => self.others += 1,
        }
    }
}

/// Aggregates computed from the metadata document alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataStats {
    /// All paths listed by packages and other files.
    pub total_paths: usize,
    /// Paths whose content is embedded in the pack.
    pub packed_paths: usize,
    /// Number of packages.
    pub packages: usize,
    /// Number of packages whose files were packed.
    pub packed_packages: usize,
    /// Files belonging to packed packages.
    pub packed_package_files: usize,
    /// Files belonging to packages left to the target system.
    pub unpacked_package_files: usize,
}

impl MetadataStats {
    /// Computes the metadata aggregates of `config`.
    ///
    /// Other files are always counted as packed.
    #[must_use]
    pub fn from_config(config: &PackConfig) -> Self {
        let mut stats = Self {
            packages: config.packages.len(),
            ..Self::default()
        };

        for package in &config.packages {
            let count = package.files.len();
            if package.packfiles {
                stats.packed_package_files += count;
                stats.packed_packages += 1;
            } else {
                stats.unpacked_package_files += count;
            }
        }

        let other = config.other_files.len();
        stats.total_paths = stats.packed_package_files + stats.unpacked_package_files + other;
        stats.packed_paths = stats.packed_package_files + other;
        stats
    }
}

/// Walks the pack's entry index and counts the `DATA/` entries.
///
/// File contents are never read, except for the nested `DATA.tar.gz` of
/// format-2 packs, which has to be decompressed to reach its index.
///
/// # Errors
///
/// Returns an error if the pack cannot be opened or its tar structure is
/// corrupt.
pub fn scan_pack(pack: &Path) -> Result<PackStats> {
    let mut archive = open_pack(pack)?;
    let mut stats = PackStats::new();

    let entries = archive
        .entries()
        .map_err(|e| InspectError::InvalidArchive(format!("failed to read pack entries: {e}")))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| InspectError::InvalidArchive(format!("failed to read pack entry: {e}")))?;
        let path = member_path(&entry)?;

        if path == Path::new(NESTED_DATA_MEMBER) {
            tracing::debug!("scanning nested data archive");
            let mut nested = tar::Archive::new(GzDecoder::new(entry));
            count_data_entries(&mut nested, &mut stats)?;
        } else if is_data_path(&path) {
            stats.record(entry.header().entry_type().into(), entry.size());
        }
    }

    tracing::debug!(entries = stats.total_paths, bytes = stats.total_size, "scanned pack");
    Ok(stats)
}

fn count_data_entries<R: Read>(archive: &mut tar::Archive<R>, stats: &mut PackStats) -> Result<()> {
    let entries = archive.entries().map_err(|e| {
        InspectError::InvalidArchive(format!("failed to read nested data entries: {e}"))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            InspectError::InvalidArchive(format!("failed to read nested data entry: {e}"))
        })?;
        if is_data_path(&member_path(&entry)?) {
            stats.record(entry.header().entry_type().into(), entry.size());
        }
    }
    Ok(())
}

/// Returns the entry's path with any leading `./` removed.
pub(crate) fn member_path<R: Read>(entry: &tar::Entry<'_, R>) -> Result<PathBuf> {
    let path = entry
        .path()
        .map_err(|e| InspectError::InvalidArchive(format!("invalid entry path: {e}")))?;
    Ok(path.strip_prefix(".").unwrap_or(&*path).to_path_buf())
}

/// `DATA/...` entries count; the `DATA` directory itself does not.
fn is_data_path(path: &Path) -> bool {
    path.strip_prefix(DATA_PREFIX)
        .is_ok_and(|rest| !rest.as_os_str().is_empty())
}
