//! Lock/unlock orchestration
//!
//! Ties the filesystem to the envelope engine. Containers and plaintexts are
//! assembled fully in memory and written with a temp file + rename, so a
//! failed operation never leaves a half-written file behind.

use crate::config::Config;
use crate::container::Container;
use crate::crypto::{derive_master_key, KdfParams};
use crate::envelope::{lock_entry, open_envelope, unlock_entry};
use crate::error::{Error, Result};
use crate::metadata::EntryMetadata;
use std::fs::{self, File, Permissions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of probing a file with a passphrase
#[derive(Debug, Clone)]
pub enum Unlockability {
    /// Locked, and the passphrase opens it
    Unlockable(EntryMetadata),
    /// Not a container
    NotLocked,
    /// A container the passphrase does not open
    WrongPassphrase,
}

/// Locks and unlocks files according to a [`Config`]
#[derive(Debug, Clone)]
pub struct Locker {
    config: Config,
}

impl Locker {
    /// Create a locker, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Locker { config })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn kdf_params(&self) -> KdfParams {
        KdfParams::from(&self.config.encryption)
    }

    /// Lock the file at `path` in place
    pub fn lock<P: AsRef<Path>>(&self, path: P, passphrase: &str) -> Result<Container> {
        let path = path.as_ref();
        self.lock_file(path, path, passphrase)
    }

    /// Lock the file at `input` and write the container to `output`
    pub fn lock_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        passphrase: &str,
    ) -> Result<Container> {
        let input = input.as_ref();
        let content = fs::read(input)?;
        let permissions = fs::metadata(input)?.permissions();

        let mut metadata =
            EntryMetadata::from_path(input)?.with_compression(self.config.lock.compression);
        metadata.size = content.len() as u64;

        let container = self.lock_entry(&content, &metadata, passphrase)?;
        write_atomic(output.as_ref(), &container.to_bytes(), permissions)?;

        info!(
            "Locked {} ({} bytes -> {} bytes)",
            input.display(),
            content.len(),
            container.len()
        );
        Ok(container)
    }

    /// Lock an in-memory buffer, e.g. an archive built by the caller
    pub fn lock_bytes(
        &self,
        content: &[u8],
        name: &str,
        archive: bool,
        passphrase: &str,
    ) -> Result<Container> {
        let metadata = EntryMetadata::new(content.len() as u64, name)?
            .with_compression(self.config.lock.compression)
            .with_archive(archive);

        self.lock_entry(content, &metadata, passphrase)
    }

    fn lock_entry(
        &self,
        content: &[u8],
        metadata: &EntryMetadata,
        passphrase: &str,
    ) -> Result<Container> {
        let master_key = derive_master_key(passphrase, None, &self.kdf_params())?;
        lock_entry(content, metadata, &master_key, self.config.lock.chunk_size)
    }

    /// Unlock the container at `path`, returning metadata and content
    ///
    /// The file is left untouched.
    pub fn unlock<P: AsRef<Path>>(
        &self,
        path: P,
        passphrase: &str,
    ) -> Result<(EntryMetadata, Vec<u8>)> {
        let container = read_container(path.as_ref())?;
        unlock_entry(&container, passphrase, &self.kdf_params())
    }

    /// Unlock the container at `path` and replace it with the plaintext
    pub fn unlock_in_place<P: AsRef<Path>>(
        &self,
        path: P,
        passphrase: &str,
    ) -> Result<EntryMetadata> {
        let path = path.as_ref();
        self.unlock_file(path, path, passphrase)
    }

    /// Unlock the container at `input` and write the plaintext to `output`
    pub fn unlock_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        passphrase: &str,
    ) -> Result<EntryMetadata> {
        let input = input.as_ref();
        let permissions = fs::metadata(input)?.permissions();
        let (metadata, content) = self.unlock(input, passphrase)?;
        write_atomic(output.as_ref(), &content, permissions)?;

        info!(
            "Unlocked {} ({} bytes)",
            metadata.display_name(),
            content.len()
        );
        Ok(metadata)
    }

    /// Probe whether `passphrase` unlocks the file at `path`
    ///
    /// Only the key envelope is opened; the content is never decrypted and
    /// the file is never written. I/O failures are the only errors.
    pub fn is_unlockable<P: AsRef<Path>>(
        &self,
        path: P,
        passphrase: &str,
    ) -> Result<Unlockability> {
        let path = path.as_ref();

        let container = match read_container(path) {
            Ok(container) => container,
            Err(Error::NotLocked) => return Ok(Unlockability::NotLocked),
            Err(e) => return Err(e),
        };

        let master_key = derive_master_key(passphrase, Some(container.salt()), &self.kdf_params())?;

        match open_envelope(&container, &master_key) {
            Ok(metadata) => Ok(Unlockability::Unlockable(metadata)),
            Err(Error::AuthenticationFailure) => {
                warn!("Passphrase does not open {}", path.display());
                Ok(Unlockability::WrongPassphrase)
            }
            Err(e) => Err(e),
        }
    }
}

/// Read and parse a container, mapping structural mismatch to `NotLocked`
fn read_container(path: &Path) -> Result<Container> {
    let bytes = fs::read(path)?;

    Container::from_bytes(&bytes).map_err(|e| match e {
        Error::MalformedMetadata(reason) => {
            debug!("{} is not a container: {}", path.display(), reason);
            Error::NotLocked
        }
        other => other,
    })
}

/// Write a file atomically (write to temp, then rename)
///
/// The temp file gets `permissions` before any content is written, so the
/// result never has a wider mode than the file it came from.
fn write_atomic(path: &Path, bytes: &[u8], permissions: Permissions) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Path has no file name: {}", path.display())))?;

    let mut temp_name = file_name.to_os_string();
    temp_name.push(".slashlock.tmp");
    let temp_path = path.with_file_name(temp_name);

    let result = (|| -> Result<()> {
        let mut file = File::create(&temp_path)?;
        file.set_permissions(permissions)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
