//! Size padding
//!
//! Buffers shorter than the chunk size are zero-padded up to exactly the
//! chunk size, so every small file produces the same ciphertext length.
//! Larger buffers are left alone and their length stays visible. Padding is
//! not self-describing: the true length is sealed in the key envelope.

use crate::error::{Error, Result};

/// Pad `data` with zero bytes up to `chunk_size`
pub fn pad(data: &[u8], chunk_size: usize) -> Result<Vec<u8>> {
    if chunk_size == 0 {
        return Err(Error::InvalidInput("Chunk size must be greater than 0".to_string()));
    }

    let mut padded = data.to_vec();
    if padded.len() < chunk_size {
        padded.resize(chunk_size, 0);
    }
    Ok(padded)
}

/// Strip padding, keeping the first `original_len` bytes
pub fn unpad(mut data: Vec<u8>, original_len: usize) -> Result<Vec<u8>> {
    if original_len > data.len() {
        return Err(Error::MalformedMetadata(format!(
            "Recorded length {} exceeds padded length {}",
            original_len,
            data.len()
        )));
    }

    data.truncate(original_len);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pad_short_data() {
        let data = b"test-data";
        let padded = pad(data, 32).unwrap();

        assert_eq!(padded.len(), 32);
        assert_eq!(&padded[..data.len()], data);
        assert!(padded[data.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pad_long_data_unchanged() {
        let data = b"test-data".repeat(50);
        assert_eq!(pad(&data, 32).unwrap(), data);
    }

    #[test]
    fn test_pad_empty() {
        assert_eq!(pad(b"", 16).unwrap(), vec![0u8; 16]);
    }

    #[test]
    fn test_zero_chunk_size() {
        assert!(matches!(pad(b"abc", 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unpad_too_long() {
        let result = unpad(vec![0u8; 8], 9);
        assert!(matches!(result, Err(Error::MalformedMetadata(_))));
    }

    proptest! {
        #[test]
        fn short_data_fills_chunk(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            extra in 1usize..256,
        ) {
            let chunk_size = data.len() + extra;
            let padded = pad(&data, chunk_size).unwrap();
            prop_assert_eq!(padded.len(), chunk_size);
            prop_assert_eq!(unpad(padded, data.len()).unwrap(), data);
        }

        #[test]
        fn long_data_is_untouched(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            seed in any::<usize>(),
        ) {
            let chunk_size = 1 + seed % data.len();
            prop_assert_eq!(pad(&data, chunk_size).unwrap(), data);
        }
    }
}
