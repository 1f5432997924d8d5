//! Content compression
//!
//! The container only records which algorithm was applied; the codecs come
//! from `flate2` (gzip) and `lz4_flex` (lz4).

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Compression algorithm applied to entry content before padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Stored as-is
    None,
    /// gzip (DEFLATE)
    #[default]
    Gzip,
    /// LZ4 block format with a length prefix
    Lz4,
}

impl Compression {
    /// Stable on-disk identifier
    pub fn as_byte(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Gzip => 1,
            Compression::Lz4 => 2,
        }
    }

    /// Parse an on-disk identifier
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Lz4),
            other => Err(Error::MalformedMetadata(format!(
                "Unknown compression identifier: {}",
                other
            ))),
        }
    }

    /// Compress `data` with this algorithm
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder
                    .write_all(data)
                    .map_err(|e| Error::Compression(format!("gzip failed: {}", e)))?;
                encoder
                    .finish()
                    .map_err(|e| Error::Compression(format!("gzip failed: {}", e)))
            }
            Compression::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        }
    }

    /// Reverse [`Compression::compress`]
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut decoder = GzDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Compression(format!("gunzip failed: {}", e)))?;
                Ok(out)
            }
            Compression::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::Compression(format!("lz4 decompression failed: {}", e))),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "lz4" => Ok(Compression::Lz4),
            other => Err(Error::InvalidInput(format!(
                "Unknown compression algorithm: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Lz4 => "lz4",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let data = b"Hello, world! ".repeat(100);

        for algorithm in [Compression::None, Compression::Gzip, Compression::Lz4] {
            let compressed = algorithm.compress(&data).unwrap();
            let decompressed = algorithm.decompress(&compressed).unwrap();
            assert_eq!(decompressed, data, "{} must round trip", algorithm);
        }
    }

    #[test]
    fn test_repetitive_data_shrinks() {
        let data = vec![b'a'; 10_000];
        assert!(Compression::Gzip.compress(&data).unwrap().len() < data.len());
        assert!(Compression::Lz4.compress(&data).unwrap().len() < data.len());
    }

    #[test]
    fn test_empty_input() {
        let compressed = Compression::Gzip.compress(b"").unwrap();
        assert!(Compression::Gzip.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_gzip_fails() {
        let result = Compression::Gzip.decompress(b"definitely not gzip");
        assert!(matches!(result, Err(Error::Compression(_))));
    }

    #[test]
    fn test_identifiers() {
        for algorithm in [Compression::None, Compression::Gzip, Compression::Lz4] {
            assert_eq!(Compression::from_byte(algorithm.as_byte()).unwrap(), algorithm);
        }
        assert!(Compression::from_byte(9).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("GZIP".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert!("zip".parse::<Compression>().is_err());
        assert_eq!(Compression::default(), Compression::Gzip);
    }
}
