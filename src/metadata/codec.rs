//! Header codec for entry metadata
//!
//! Layout (big-endian):
//!
//! ```text
//! [size: u64][name_length: u16][name: name_length bytes]
//! ```

use crate::error::{Error, Result};
use crate::metadata::EntryMetadata;

/// Width of the fixed part of the encoded metadata
pub const METADATA_HEADER_SIZE: usize = 8 + 2;

/// Opaque prefix skipped by [`metadata_to_tuple`]
pub const METADATA_PREFIX_SIZE: usize = 32;

/// Encode the persisted part of `metadata`
pub fn metadata_to_bytes(metadata: &EntryMetadata) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(METADATA_HEADER_SIZE + metadata.name().len());
    bytes.extend_from_slice(&metadata.size.to_be_bytes());
    bytes.extend_from_slice(&metadata.name_length().to_be_bytes());
    bytes.extend_from_slice(metadata.name());
    bytes
}

/// Decode metadata from the start of `buffer`
///
/// Returns the record and the number of bytes it occupied. Fields that are
/// not part of the header get their defaults and a fresh internal key.
pub fn decode_metadata(buffer: &[u8]) -> Result<(EntryMetadata, usize)> {
    if buffer.len() < METADATA_HEADER_SIZE {
        return Err(Error::MalformedMetadata(format!(
            "Header needs {} bytes, got {}",
            METADATA_HEADER_SIZE,
            buffer.len()
        )));
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&buffer[..8]);
    let size = u64::from_be_bytes(size_bytes);

    let name_length = u16::from_be_bytes([buffer[8], buffer[9]]) as usize;
    let end = METADATA_HEADER_SIZE + name_length;
    if buffer.len() < end {
        return Err(Error::MalformedMetadata(format!(
            "Name length {} runs past end of buffer ({} bytes available)",
            name_length,
            buffer.len() - METADATA_HEADER_SIZE
        )));
    }

    let metadata = EntryMetadata::new(size, &buffer[METADATA_HEADER_SIZE..end])?;
    Ok((metadata, end))
}

/// Decode metadata that follows a [`METADATA_PREFIX_SIZE`]-byte opaque prefix
///
/// The result is a complete in-memory record: compression defaults to gzip,
/// the archive flag to false, and the internal key is freshly generated.
pub fn metadata_to_tuple(buffer: &[u8]) -> Result<EntryMetadata> {
    if buffer.len() < METADATA_PREFIX_SIZE + METADATA_HEADER_SIZE {
        return Err(Error::MalformedMetadata(format!(
            "Buffer too short for metadata: {} bytes",
            buffer.len()
        )));
    }

    decode_metadata(&buffer[METADATA_PREFIX_SIZE..]).map(|(metadata, _)| metadata)
}
