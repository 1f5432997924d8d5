//! Envelope encryption of a single entry
//!
//! Content is compressed, padded and sealed under the entry's internal key.
//! The internal key is sealed under the master key together with the entry
//! parameters needed to reverse the pipeline (see [`KeyEnvelope`]).

use crate::container::{Container, Header};
use crate::crypto::{
    decrypt, derive_master_key, encrypt, unwrap_key, wrap_key, KdfParams, KeyEnvelope, MasterKey,
};
use crate::error::{Error, Result};
use crate::metadata::EntryMetadata;
use crate::padding::{pad, unpad};
use tracing::debug;

/// Lock `content` described by `metadata` under `master_key`
pub fn lock_entry(
    content: &[u8],
    metadata: &EntryMetadata,
    master_key: &MasterKey,
    chunk_size: usize,
) -> Result<Container> {
    if content.len() as u64 != metadata.size {
        return Err(Error::InvalidInput(format!(
            "Content is {} bytes but metadata records {}",
            content.len(),
            metadata.size
        )));
    }

    let body = metadata.compression.compress(content)?;
    let padded = pad(&body, chunk_size)?;

    let header = Header::new(*master_key.salt(), metadata);
    let aad = header.to_bytes();

    let envelope = KeyEnvelope {
        internal_key: metadata.internal_key().clone(),
        compression: metadata.compression,
        archive: metadata.archive,
        body_len: body.len() as u64,
    };
    let wrapped_key = wrap_key(master_key, &envelope, &aad)?;
    let ciphertext = encrypt(metadata.internal_key().as_bytes(), &padded, &aad)?;

    debug!(
        "Locked entry {}: {} bytes, {} after {}, {} padded",
        metadata.display_name(),
        content.len(),
        body.len(),
        metadata.compression,
        padded.len()
    );

    Ok(Container::new(header, wrapped_key, ciphertext))
}

/// Unlock a container with `passphrase`
///
/// Wrong passphrase and tampered container both yield
/// [`Error::AuthenticationFailure`].
pub fn unlock_entry(
    container: &Container,
    passphrase: &str,
    params: &KdfParams,
) -> Result<(EntryMetadata, Vec<u8>)> {
    let master_key = derive_master_key(passphrase, Some(container.salt()), params)?;
    unlock_entry_with_key(container, &master_key)
}

/// Unlock a container with an already derived master key
pub fn unlock_entry_with_key(
    container: &Container,
    master_key: &MasterKey,
) -> Result<(EntryMetadata, Vec<u8>)> {
    let (metadata, body_len) = open(container, master_key)?;
    let aad = container.header().to_bytes();

    let padded = decrypt(
        metadata.internal_key().as_bytes(),
        container.ciphertext(),
        &aad,
    )?;
    let body_len = usize::try_from(body_len)
        .map_err(|_| Error::MalformedMetadata(format!("Body length {} too large", body_len)))?;
    let body = unpad(padded, body_len)?;
    let content = metadata.compression.decompress(&body)?;

    if content.len() as u64 != metadata.size {
        return Err(Error::MalformedMetadata(format!(
            "Recovered {} bytes but header records {}",
            content.len(),
            metadata.size
        )));
    }

    debug!(
        "Unlocked entry {}: {} bytes",
        metadata.display_name(),
        content.len()
    );

    Ok((metadata, content))
}

/// Recover the full metadata without decrypting the content
pub fn open_envelope(container: &Container, master_key: &MasterKey) -> Result<EntryMetadata> {
    open(container, master_key).map(|(metadata, _)| metadata)
}

fn open(container: &Container, master_key: &MasterKey) -> Result<(EntryMetadata, u64)> {
    let aad = container.header().to_bytes();
    let envelope = unwrap_key(master_key, container.wrapped_key(), &aad)?;

    let metadata = container
        .header()
        .metadata()?
        .with_compression(envelope.compression)
        .with_archive(envelope.archive)
        .with_internal_key(envelope.internal_key);

    Ok((metadata, envelope.body_len))
}
