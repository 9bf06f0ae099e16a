//! Pack compression detection.
//!
//! Packs are usually shipped with a `.rpz` extension regardless of the codec,
//! so detection looks at magic bytes rather than the file name.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::Result;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";
const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression wrapping the pack's tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain tar.
    None,
    /// Gzip-compressed tar.
    Gzip,
    /// Bzip2-compressed tar.
    Bzip2,
    /// XZ-compressed tar.
    Xz,
    /// Zstd-compressed tar.
    Zstd,
}

impl Compression {
    /// Classifies the leading bytes of a stream.
    ///
    /// Anything unrecognized is treated as plain tar; the tar reader reports
    /// a corrupt header if that guess is wrong.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(&XZ_MAGIC) {
            Self::Xz
        } else if head.starts_with(&ZSTD_MAGIC) {
            Self::Zstd
        } else if head.starts_with(&BZIP2_MAGIC) {
            Self::Bzip2
        } else if head.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else {
            Self::None
        }
    }
}

/// Detects the compression of the pack at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn detect_compression(path: &Path) -> Result<Compression> {
    let mut file = File::open(path)?;
    let mut head = [0u8; 6];
    let mut filled = 0;
    while filled < head.len() {
        let n = file.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(Compression::from_magic(&head[..filled]))
}
