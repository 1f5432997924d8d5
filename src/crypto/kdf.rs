//! Key derivation: Argon2id passphrase → master key

use crate::config::EncryptionConfig;
use crate::crypto::{KEY_SIZE, SALT_SIZE};
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Time cost (iterations)
    pub iterations: u32,
    /// Parallelism
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams::from(&EncryptionConfig::default())
    }
}

impl From<&EncryptionConfig> for KdfParams {
    fn from(config: &EncryptionConfig) -> Self {
        KdfParams {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

#[cfg(test)]
impl KdfParams {
    /// Cheap parameters so tests don't spend seconds per derivation
    pub(crate) fn fast() -> Self {
        KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Master key derived from a passphrase
///
/// Only ever used to wrap and unwrap internal keys. The hash is zeroized on
/// drop; the salt is public and is stored at the front of every container.
pub struct MasterKey {
    hash: Zeroizing<[u8; KEY_SIZE]>,
    salt: [u8; SALT_SIZE],
}

impl MasterKey {
    /// Get the derived key bytes
    pub fn hash(&self) -> &[u8; KEY_SIZE] {
        &self.hash
    }

    /// Get the salt
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("hash", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish()
    }
}

/// Derive a master key from a passphrase using Argon2id.
///
/// When `salt` is `None` a fresh 32-byte random salt is generated, which is
/// what a new lock wants. Unlocking passes the salt read from the container.
pub fn derive_master_key(
    passphrase: &str,
    salt: Option<&[u8]>,
    params: &KdfParams,
) -> Result<MasterKey> {
    if passphrase.is_empty() {
        return Err(Error::InvalidInput("Passphrase must not be empty".to_string()));
    }

    let mut salt_bytes = [0u8; SALT_SIZE];
    match salt {
        Some(s) if s.len() != SALT_SIZE => {
            return Err(Error::InvalidInput(format!(
                "Salt must be {} bytes, got {}",
                SALT_SIZE,
                s.len()
            )));
        }
        Some(s) => salt_bytes.copy_from_slice(s),
        None => rand::thread_rng().fill_bytes(&mut salt_bytes),
    }

    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| Error::KeyDerivation(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut hash = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(passphrase.as_bytes(), &salt_bytes, &mut hash[..])
        .map_err(|e| Error::KeyDerivation(format!("Argon2id failed: {}", e)))?;

    Ok(MasterKey {
        hash,
        salt: salt_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_lengths() {
        let key = derive_master_key("passphrase length test", None, &KdfParams::fast()).unwrap();
        assert_eq!(key.hash().len(), 32);
        assert_eq!(key.salt().len(), 32);
    }

    #[test]
    fn test_master_key_repeatable() {
        let params = KdfParams::fast();
        let key1 = derive_master_key("test-passphrase !!", None, &params).unwrap();
        let key2 = derive_master_key("test-passphrase !!", Some(key1.salt()), &params).unwrap();

        assert_eq!(key1.hash(), key2.hash());
        assert_eq!(key1.salt(), key2.salt());

        // Fresh salt, different key
        let key3 = derive_master_key("test-passphrase !!", None, &params).unwrap();
        assert_ne!(key1.salt(), key3.salt());
        assert_ne!(key1.hash(), key3.hash());
    }

    #[test]
    fn test_different_passphrases() {
        let params = KdfParams::fast();
        let salt = [7u8; SALT_SIZE];

        let key1 = derive_master_key("passphrase-a", Some(&salt), &params).unwrap();
        let key2 = derive_master_key("passphrase-b", Some(&salt), &params).unwrap();

        assert_ne!(key1.hash(), key2.hash());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = derive_master_key("", None, &KdfParams::fast());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_bad_salt_length_rejected() {
        let result = derive_master_key("passphrase", Some(&[0u8; 16]), &KdfParams::fast());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_bad_params_rejected() {
        let params = KdfParams {
            memory_kib: 1024,
            iterations: 0,
            parallelism: 1,
        };
        let result = derive_master_key("passphrase", None, &params);
        assert!(matches!(result, Err(Error::KeyDerivation(_))));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let key = derive_master_key("passphrase", None, &KdfParams::fast()).unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("[REDACTED]"));
    }
}
