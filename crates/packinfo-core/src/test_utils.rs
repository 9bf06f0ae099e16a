//! Test utilities for building packs in memory.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::metadata::CONFIG_MEMBER;
use crate::stats::NESTED_DATA_MEMBER;

/// Builder for test packs with a metadata document and a `DATA/` tree.
///
/// # Examples
///
/// ```
/// use packinfo_core::test_utils::PackBuilder;
///
/// let pack = PackBuilder::new()
///     .config("version: '0.8'\n")
///     .add_directory("DATA/bin")
///     .add_file("DATA/bin/tool", b"#!/bin/sh\n")
///     .add_symlink("DATA/bin/alias", "tool")
///     .build_gz();
/// assert!(!pack.is_empty());
/// ```
pub struct PackBuilder {
    config: Option<String>,
    nested: bool,
    data: tar::Builder<Vec<u8>>,
    extra: Vec<(String, Vec<u8>)>,
}

impl PackBuilder {
    /// Creates an empty pack builder without a metadata document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            nested: false,
            data: tar::Builder::new(Vec::new()),
            extra: Vec::new(),
        }
    }

    /// Sets the YAML metadata document stored at `METADATA/config.yml`.
    #[must_use]
    pub fn config(mut self, document: &str) -> Self {
        self.config = Some(document.to_string());
        self
    }

    /// Stores the data entries in a nested `DATA.tar.gz`, like format-2 packs.
    #[must_use]
    pub fn nested_data(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Adds a regular file.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        if self.nested && !path.starts_with("DATA") {
            self.extra.push((path.to_string(), data.to_vec()));
            return self;
        }
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.data.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.data
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a symlink.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        self.append_link(tar::EntryType::Symlink, path, target);
        self
    }

    /// Adds a hardlink.
    #[must_use]
    pub fn add_hardlink(mut self, path: &str, target: &str) -> Self {
        self.append_link(tar::EntryType::Link, path, target);
        self
    }

    fn append_link(&mut self, entry_type: tar::EntryType, path: &str, target: &str) {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(entry_type);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.data
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
    }

    /// Builds the pack as an uncompressed tar.
    #[must_use]
    pub fn build_plain(self) -> Vec<u8> {
        let data = self.data.into_inner().unwrap();
        let mut outer = tar::Builder::new(Vec::new());

        if let Some(config) = &self.config {
            append_bytes(&mut outer, CONFIG_MEMBER, config.as_bytes());
        }
        for (path, bytes) in &self.extra {
            append_bytes(&mut outer, path, bytes);
        }

        if self.nested {
            append_bytes(&mut outer, NESTED_DATA_MEMBER, &gzip(&data));
        } else {
            // `data` is a complete tar stream; splice its entries in.
            let mut inner = tar::Archive::new(data.as_slice());
            for entry in inner.entries().unwrap() {
                let mut entry = entry.unwrap();
                let mut header = entry.header().clone();
                let path = entry.path().unwrap().into_owned();
                outer.append_data(&mut header, path, &mut entry).unwrap();
            }
        }

        outer.into_inner().unwrap()
    }

    /// Builds the pack as a gzip-compressed tar.
    #[must_use]
    pub fn build_gz(self) -> Vec<u8> {
        gzip(&self.build_plain())
    }
}

impl Default for PackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn append_bytes(builder: &mut tar::Builder<Vec<u8>>, path: &str, bytes: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, bytes).unwrap();
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Writes pack bytes to a temporary file that lives as long as the handle.
#[cfg(test)]
pub(crate) fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(".rpz").unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
