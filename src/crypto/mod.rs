//! Cryptography module for slashlock
//!
//! Provides AES-256-GCM encryption with Argon2id key derivation and
//! per-entry internal keys wrapped under the passphrase-derived master key.

mod encryption;
mod kdf;
mod keys;

pub use encryption::{decrypt, encrypt, EncryptedData};
pub use kdf::{derive_master_key, KdfParams, MasterKey};
pub use keys::{
    unwrap_key, wrap_key, InternalKey, KeyEnvelope, ENVELOPE_SIZE, WRAPPED_ENVELOPE_SIZE,
};

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of salt for key derivation
pub const SALT_SIZE: usize = 32;
