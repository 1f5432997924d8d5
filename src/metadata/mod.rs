//! Entry metadata
//!
//! The record describing one locked entry, and the codec that turns its
//! public part (size and name) into header bytes.

mod codec;

pub use codec::{
    decode_metadata, metadata_to_bytes, metadata_to_tuple, METADATA_HEADER_SIZE,
    METADATA_PREFIX_SIZE,
};

use crate::compression::Compression;
use crate::crypto::InternalKey;
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;

/// Metadata of one locked entry
///
/// `name_length` is always derived from `name`, so the two can never
/// disagree. Every constructor draws a fresh internal key.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Plaintext content length before compression and padding
    pub size: u64,
    name: Vec<u8>,
    /// Compression applied to the content
    pub compression: Compression,
    /// Whether the content is an archive of several files
    pub archive: bool,
    internal_key: InternalKey,
}

impl EntryMetadata {
    /// Create metadata for content of `size` bytes named `name`
    pub fn new(size: u64, name: impl Into<Vec<u8>>) -> Result<Self> {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(Error::InvalidInput(format!(
                "Name is {} bytes, limit is {}",
                name.len(),
                u16::MAX
            )));
        }

        Ok(EntryMetadata {
            size,
            name,
            compression: Compression::default(),
            archive: false,
            internal_key: InternalKey::generate(),
        })
    }

    /// Build metadata from a file on disk (its size and basename)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let stat = std::fs::metadata(path)?;
        if !stat.is_file() {
            return Err(Error::InvalidInput(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }

        let name = path.file_name().ok_or_else(|| {
            Error::InvalidInput(format!("Path has no file name: {}", path.display()))
        })?;

        EntryMetadata::new(stat.len(), name_bytes(name))
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Mark the content as an archive bundle
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    pub(crate) fn with_internal_key(mut self, internal_key: InternalKey) -> Self {
        self.internal_key = internal_key;
        self
    }

    /// Raw name bytes
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Byte length of the name
    pub fn name_length(&self) -> u16 {
        // Bounded by the constructor
        self.name.len() as u16
    }

    /// Name for display
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Key that encrypts this entry's content
    pub fn internal_key(&self) -> &InternalKey {
        &self.internal_key
    }
}

/// Raw bytes of a file name
#[cfg(unix)]
fn name_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}
