//! Pack container formats.

pub mod detect;

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

pub use detect::Compression;
pub use detect::detect_compression;

use crate::Result;

/// Tar reader over a pack, with any compression layer already removed.
pub type PackArchive = tar::Archive<Box<dyn Read>>;

/// Opens the pack at `path` as a tar stream.
///
/// The returned archive owns the file handle; dropping it closes the pack.
///
/// # Errors
///
/// Returns an error if the pack cannot be opened or its compression header
/// is invalid.
pub fn open_pack(path: &Path) -> Result<PackArchive> {
    let compression = detect_compression(path)?;
    let reader = BufReader::new(File::open(path)?);

    let stream: Box<dyn Read> = match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(GzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
    };

    tracing::debug!(pack = %path.display(), ?compression, "opened pack");
    Ok(tar::Archive::new(stream))
}
