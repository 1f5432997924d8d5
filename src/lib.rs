//! slashlock - Lock files behind a passphrase
//!
//! Each locked file becomes a self-contained container. The content is
//! encrypted under a random per-entry key, and that key is encrypted under a
//! master key derived from the passphrase with Argon2id.

pub mod compression;
pub mod config;
pub mod container;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod locker;
pub mod metadata;
pub mod padding;

pub use config::Config;
pub use error::{Error, Result};
pub use locker::{Locker, Unlockability};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::compression::Compression;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::locker::{Locker, Unlockability};
    pub use crate::metadata::EntryMetadata;
}
