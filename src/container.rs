//! On-disk container format
//!
//! ```text
//! [salt: 32]
//! [magic: "SLSHLOCK"][version: 1][filler: 23 random bytes]
//! [size: u64 BE][name_length: u16 BE][name]
//! [wrapped key envelope: nonce 12 + 42 + tag 16]
//! [ciphertext: nonce 12 + padded body + tag 16]
//! ```
//!
//! Everything before the wrapped key is the clear header. It is passed as
//! associated data to both AEAD operations, so changing any header byte makes
//! unlocking fail. A buffer without the magic marker is never treated as a
//! container.

use crate::crypto::{EncryptedData, NONCE_SIZE, SALT_SIZE, TAG_SIZE, WRAPPED_ENVELOPE_SIZE};
use crate::error::{Error, Result};
use crate::metadata::{
    decode_metadata, metadata_to_bytes, metadata_to_tuple, EntryMetadata, METADATA_HEADER_SIZE,
    METADATA_PREFIX_SIZE,
};
use rand::RngCore;

/// Format marker at the start of the metadata prefix
pub const MAGIC: &[u8; 8] = b"SLSHLOCK";

/// Current container format version
pub const FORMAT_VERSION: u8 = 1;

/// Size of the random filler after magic and version
pub const FILLER_SIZE: usize = METADATA_PREFIX_SIZE - MAGIC.len() - 1;

/// Smallest buffer that can be a container (empty name, empty body)
pub const MIN_CONTAINER_SIZE: usize = SALT_SIZE
    + METADATA_PREFIX_SIZE
    + METADATA_HEADER_SIZE
    + WRAPPED_ENVELOPE_SIZE
    + NONCE_SIZE
    + TAG_SIZE;

/// Clear header of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    salt: [u8; SALT_SIZE],
    filler: [u8; FILLER_SIZE],
    metadata: Vec<u8>,
}

impl Header {
    /// Build a header for `metadata` with fresh random filler
    pub fn new(salt: [u8; SALT_SIZE], metadata: &EntryMetadata) -> Self {
        let mut filler = [0u8; FILLER_SIZE];
        rand::thread_rng().fill_bytes(&mut filler);

        Header {
            salt,
            filler,
            metadata: metadata_to_bytes(metadata),
        }
    }

    /// Master key salt
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    /// Header bytes, also used as associated data
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&self.filler);
        bytes.extend_from_slice(&self.metadata);
        bytes
    }

    /// Encoded length
    pub fn len(&self) -> usize {
        SALT_SIZE + METADATA_PREFIX_SIZE + self.metadata.len()
    }

    /// Always false; a header carries at least salt and filler
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Decode the public metadata (size and name)
    ///
    /// Compression, archive flag and internal key are placeholders until
    /// the key envelope has been opened.
    pub fn metadata(&self) -> Result<EntryMetadata> {
        metadata_to_tuple(&self.to_bytes()[SALT_SIZE..])
    }
}

/// A complete locked entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    header: Header,
    wrapped_key: EncryptedData,
    ciphertext: EncryptedData,
}

impl Container {
    /// Assemble a container from its parts
    pub fn new(header: Header, wrapped_key: EncryptedData, ciphertext: EncryptedData) -> Self {
        Container {
            header,
            wrapped_key,
            ciphertext,
        }
    }

    /// Clear header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Master key salt
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        self.header.salt()
    }

    /// Key envelope sealed under the master key
    pub fn wrapped_key(&self) -> &EncryptedData {
        &self.wrapped_key
    }

    /// Body sealed under the internal key
    pub fn ciphertext(&self) -> &EncryptedData {
        &self.ciphertext
    }

    /// Total serialized size
    pub fn len(&self) -> usize {
        self.header.len() + self.wrapped_key.size() + self.ciphertext.size()
    }

    /// Always false; see [`MIN_CONTAINER_SIZE`]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.wrapped_key.to_bytes());
        bytes.extend_from_slice(&self.ciphertext.to_bytes());
        bytes
    }

    /// Parse a stored container
    ///
    /// Fails with [`Error::MalformedMetadata`] when the buffer lacks the
    /// format marker or does not have container structure. Nothing is
    /// authenticated here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_CONTAINER_SIZE {
            return Err(Error::MalformedMetadata(format!(
                "Container needs at least {} bytes, got {}",
                MIN_CONTAINER_SIZE,
                bytes.len()
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[..SALT_SIZE]);

        let magic_end = SALT_SIZE + MAGIC.len();
        if bytes[SALT_SIZE..magic_end] != MAGIC[..] {
            return Err(Error::MalformedMetadata("Missing container marker".to_string()));
        }
        if bytes[magic_end] != FORMAT_VERSION {
            return Err(Error::MalformedMetadata(format!(
                "Unsupported container version {}",
                bytes[magic_end]
            )));
        }

        let metadata_start = SALT_SIZE + METADATA_PREFIX_SIZE;
        let mut filler = [0u8; FILLER_SIZE];
        filler.copy_from_slice(&bytes[magic_end + 1..metadata_start]);

        let (_, metadata_len) = decode_metadata(&bytes[metadata_start..])?;
        let wrapped_start = metadata_start + metadata_len;
        let ciphertext_start = wrapped_start + WRAPPED_ENVELOPE_SIZE;

        if bytes.len() < ciphertext_start + NONCE_SIZE + TAG_SIZE {
            return Err(Error::MalformedMetadata(format!(
                "Container truncated after header: {} bytes",
                bytes.len()
            )));
        }

        Ok(Container {
            header: Header {
                salt,
                filler,
                metadata: bytes[metadata_start..wrapped_start].to_vec(),
            },
            wrapped_key: EncryptedData::from_bytes(&bytes[wrapped_start..ciphertext_start])?,
            ciphertext: EncryptedData::from_bytes(&bytes[ciphertext_start..])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encrypt;

    fn test_container(name: &[u8], body_len: usize) -> Container {
        let metadata = EntryMetadata::new(body_len as u64, name.to_vec()).unwrap();
        let header = Header::new([9u8; SALT_SIZE], &metadata);
        let key = [1u8; 32];
        let wrapped = encrypt(&key, &[0u8; 42], &header.to_bytes()).unwrap();
        let ciphertext = encrypt(&key, &vec![0u8; body_len], &header.to_bytes()).unwrap();
        Container::new(header, wrapped, ciphertext)
    }

    #[test]
    fn test_serialize_parse() {
        let container = test_container(b"test.txt", 100);
        let bytes = container.to_bytes();

        assert_eq!(bytes.len(), container.len());
        assert_eq!(&bytes[..SALT_SIZE], &[9u8; SALT_SIZE]);
        assert_eq!(&bytes[SALT_SIZE..SALT_SIZE + 8], MAGIC);
        assert_eq!(bytes[SALT_SIZE + 8], FORMAT_VERSION);

        let parsed = Container::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, container);
    }

    #[test]
    fn test_header_metadata() {
        let container = test_container(b"test.txt", 100);
        let metadata = container.header().metadata().unwrap();

        assert_eq!(metadata.size, 100);
        assert_eq!(metadata.name(), b"test.txt");
    }

    #[test]
    fn test_minimum_size() {
        let container = test_container(b"", 0);
        assert_eq!(container.len(), MIN_CONTAINER_SIZE);
        assert!(Container::from_bytes(&container.to_bytes()).is_ok());
    }

    #[test]
    fn test_too_short() {
        let result = Container::from_bytes(&[0u8; MIN_CONTAINER_SIZE - 1]);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    #[test]
    fn test_truncated() {
        let bytes = test_container(b"test.txt", 0).to_bytes();
        let result = Container::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    #[test]
    fn test_missing_marker() {
        let mut bytes = test_container(b"test.txt", 100).to_bytes();
        bytes[SALT_SIZE] ^= 0xff;
        let result = Container::from_bytes(&bytes);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    #[test]
    fn test_unknown_version() {
        let mut bytes = test_container(b"test.txt", 100).to_bytes();
        bytes[SALT_SIZE + MAGIC.len()] = FORMAT_VERSION + 1;
        let result = Container::from_bytes(&bytes);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    #[test]
    fn test_zeros_are_not_a_container() {
        let result = Container::from_bytes(&[0u8; 500]);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    #[test]
    fn test_plain_text_is_not_a_container() {
        // 'a' = 0x61, so the name length field reads 0x6161
        let result = Container::from_bytes("a".repeat(500).as_bytes());
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }
}
