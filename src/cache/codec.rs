//! Compression Codec Module
//!
//! Reversible gzip transform applied to a value's serialized form before it
//! is held in a colder tier.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{CacheError, Result};

// == Compress ==
/// Compresses serialized bytes with gzip at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Compression(e.to_string()))
}

// == Decompress ==
/// Reverses [`compress`], recovering the original serialized bytes.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Compression(e.to_string()))?;
    Ok(out)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress_roundtrip() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(50);

        let compressed = compress(&original).unwrap();
        let restored = decompress(&compressed).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_compression_shrinks_repetitive_data() {
        let original = vec![b'x'; 10_000];

        let compressed = compress(&original).unwrap();

        assert!(compressed.len() < original.len());
    }

    #[test]
    fn test_decompress_garbage_fails() {
        let result = decompress(b"definitely not gzip");

        assert!(matches!(result, Err(CacheError::Compression(_))));
    }

    #[test]
    fn test_compress_empty_input() {
        let compressed = compress(b"").unwrap();
        let restored = decompress(&compressed).unwrap();

        assert!(restored.is_empty());
    }
}
