//! Internal keys and key wrapping
//!
//! Every locked entry gets its own random internal key. That key, together
//! with the entry parameters needed to decode the body, is sealed under the
//! master key as a fixed-size key envelope:
//!
//! ```text
//! [internal_key: 32][compression: 1][archive: 1][body_len: u64 BE]
//! ```

use crate::compression::Compression;
use crate::crypto::{decrypt, encrypt, EncryptedData, MasterKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

/// Plaintext size of a key envelope
pub const ENVELOPE_SIZE: usize = KEY_SIZE + 1 + 1 + 8;

/// Stored size of a wrapped key envelope (nonce + envelope + tag)
pub const WRAPPED_ENVELOPE_SIZE: usize = NONCE_SIZE + ENVELOPE_SIZE + TAG_SIZE;

/// Per-entry content encryption key
#[derive(Clone)]
pub struct InternalKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl InternalKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        rand::thread_rng().fill_bytes(&mut key[..]);
        InternalKey { key }
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    fn from_slice(bytes: &[u8]) -> Self {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(bytes);
        InternalKey { key }
    }
}

impl std::fmt::Debug for InternalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InternalKey([REDACTED])")
    }
}

/// Secret parameters of one entry, sealed under the master key
#[derive(Debug, Clone)]
pub struct KeyEnvelope {
    /// Key that encrypts the entry body
    pub internal_key: InternalKey,
    /// Compression applied to the content before padding
    pub compression: Compression,
    /// Whether the content is an archive bundle
    pub archive: bool,
    /// Length of the (compressed) body before padding
    pub body_len: u64,
}

impl KeyEnvelope {
    fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(ENVELOPE_SIZE));
        bytes.extend_from_slice(self.internal_key.as_bytes());
        bytes.push(self.compression.as_byte());
        bytes.push(u8::from(self.archive));
        bytes.extend_from_slice(&self.body_len.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENVELOPE_SIZE {
            return Err(Error::MalformedMetadata(format!(
                "Key envelope has wrong size: {} bytes (expected {})",
                bytes.len(),
                ENVELOPE_SIZE
            )));
        }

        let compression = Compression::from_byte(bytes[KEY_SIZE])?;
        let archive = match bytes[KEY_SIZE + 1] {
            0 => false,
            1 => true,
            other => {
                return Err(Error::MalformedMetadata(format!(
                    "Invalid archive flag: {}",
                    other
                )))
            }
        };

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[KEY_SIZE + 2..]);

        Ok(KeyEnvelope {
            internal_key: InternalKey::from_slice(&bytes[..KEY_SIZE]),
            compression,
            archive,
            body_len: u64::from_be_bytes(len_bytes),
        })
    }
}

/// Wrap a key envelope under the master key
///
/// `aad` binds the wrapped key to the clear container header.
pub fn wrap_key(master: &MasterKey, envelope: &KeyEnvelope, aad: &[u8]) -> Result<EncryptedData> {
    let plaintext = envelope.to_bytes();
    encrypt(master.hash(), &plaintext, aad)
}

/// Unwrap a key envelope with the master key
///
/// Fails with [`Error::AuthenticationFailure`] when the master key is wrong
/// or the header has been modified.
pub fn unwrap_key(master: &MasterKey, wrapped: &EncryptedData, aad: &[u8]) -> Result<KeyEnvelope> {
    let mut plaintext = decrypt(master.hash(), wrapped, aad)?;
    let envelope = KeyEnvelope::from_bytes(&plaintext);
    plaintext.zeroize();
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_master_key, KdfParams};

    fn test_envelope() -> KeyEnvelope {
        KeyEnvelope {
            internal_key: InternalKey::generate(),
            compression: Compression::Gzip,
            archive: true,
            body_len: 1234,
        }
    }

    #[test]
    fn test_internal_keys_differ() {
        let k1 = InternalKey::generate();
        let k2 = InternalKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_wrap_unwrap() {
        let master = derive_master_key("password", None, &KdfParams::fast()).unwrap();
        let envelope = test_envelope();

        let wrapped = wrap_key(&master, &envelope, b"header").unwrap();
        assert_eq!(wrapped.size(), WRAPPED_ENVELOPE_SIZE);

        let unwrapped = unwrap_key(&master, &wrapped, b"header").unwrap();
        assert_eq!(unwrapped.internal_key.as_bytes(), envelope.internal_key.as_bytes());
        assert_eq!(unwrapped.compression, Compression::Gzip);
        assert!(unwrapped.archive);
        assert_eq!(unwrapped.body_len, 1234);
    }

    #[test]
    fn test_unwrap_wrong_master() {
        let master1 = derive_master_key("password", None, &KdfParams::fast()).unwrap();
        let master2 = derive_master_key("password", None, &KdfParams::fast()).unwrap();

        let wrapped = wrap_key(&master1, &test_envelope(), b"header").unwrap();
        let result = unwrap_key(&master2, &wrapped, b"header");

        assert!(matches!(result, Err(Error::AuthenticationFailure)));
    }

    #[test]
    fn test_unwrap_wrong_header() {
        let master = derive_master_key("password", None, &KdfParams::fast()).unwrap();

        let wrapped = wrap_key(&master, &test_envelope(), b"header").unwrap();
        let result = unwrap_key(&master, &wrapped, b"HEADER");

        assert!(matches!(result, Err(Error::AuthenticationFailure)));
    }

    #[test]
    fn test_envelope_rejects_bad_flags() {
        let mut bytes = test_envelope().to_bytes().to_vec();
        bytes[KEY_SIZE + 1] = 7;
        assert!(matches!(
            KeyEnvelope::from_bytes(&bytes),
            Err(Error::MalformedMetadata(_))
        ));
    }
}
