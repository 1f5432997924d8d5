//! AES-256-GCM Encryption Implementation
//!
//! Both the wrapped key envelope and the entry body are sealed with
//! AES-256-GCM. A failed tag check never yields plaintext; it surfaces as
//! [`Error::AuthenticationFailure`] so a wrong passphrase and a tampered
//! container look the same to the caller.

use crate::crypto::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

/// Encrypted data with its nonce and authentication tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Nonce used for encryption (unique per encryption)
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with appended authentication tag
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Get the total size of encrypted data
    pub fn size(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Serialize to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::MalformedMetadata(format!(
                "Encrypted region too short: {} bytes",
                bytes.len()
            )));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);

        Ok(EncryptedData {
            nonce,
            ciphertext: bytes[NONCE_SIZE..].to_vec(),
        })
    }
}

/// Encrypt data using AES-256-GCM
///
/// # Arguments
/// * `key` - 256-bit encryption key
/// * `plaintext` - Data to encrypt
/// * `aad` - Additional authenticated data (authenticated but not encrypted)
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<EncryptedData> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Encryption("Failed to create encryption key".to_string()))?;
    let sealing_key = LessSafeKey::new(unbound_key);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    in_out.reserve(TAG_SIZE);

    sealing_key
        .seal_in_place_append_tag(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| Error::Encryption("Encryption failed".to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext: in_out,
    })
}

/// Decrypt data using AES-256-GCM
///
/// `aad` must match the value given to [`encrypt`].
pub fn decrypt(key: &[u8; KEY_SIZE], encrypted: &EncryptedData, aad: &[u8]) -> Result<Vec<u8>> {
    if encrypted.ciphertext.len() < TAG_SIZE {
        return Err(Error::MalformedMetadata("Ciphertext too short".to_string()));
    }

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Encryption("Failed to create decryption key".to_string()))?;
    let opening_key = LessSafeKey::new(unbound_key);

    let nonce = Nonce::assume_unique_for_key(encrypted.nonce);

    let mut in_out = encrypted.ciphertext.clone();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| Error::AuthenticationFailure)?;

    Ok(plaintext.to_vec())
}
