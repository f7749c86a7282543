//! Gzip framing.
//!
//! Compressed streams are recognized by their leading bytes but never
//! inflated on the synchronous path. Decompression goes through the
//! [`Decompressor`] seam, awaited by [`crate::reader::Reader::open_async`].

use std::io::{Read, Write};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::binary::GZIP_MAGIC;
use crate::util::{Error, Result};

/// Check for the gzip member header.
#[inline]
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// External stream decompression facility.
#[async_trait]
pub trait Decompressor: Send + Sync {
    /// Inflate a complete gzip stream.
    async fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>>;
}

/// [`Decompressor`] backed by flate2, inflating in place on the awaiting
/// task.
#[derive(Clone, Copy, Debug, Default)]
pub struct GzipDecompressor;

#[async_trait]
impl Decompressor for GzipDecompressor {
    async fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(compressed.len().saturating_mul(4));
        GzDecoder::new(compressed)
            .read_to_end(&mut out)
            .map_err(|e| Error::Decompression(e.to_string()))?;
        Ok(out)
    }
}

/// Gzip-compress a stream.
///
/// `level` ranges 0-9; out-of-range values use the default level.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let level = if level <= 9 {
        Compression::new(level)
    } else {
        Compression::default()
    };
    let mut encoder = GzEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_gzip_detection() {
        assert!(is_gzip(&[0x1f, 0x8b, 8, 0]));
        assert!(!is_gzip(&[0x1f]));
        assert!(!is_gzip(b"GTOa (4)"));
    }

    #[test]
    fn test_inflate_compressed() {
        let data = b"GTOa (4)\n".repeat(100);
        let packed = compress(&data, 6).unwrap();
        assert!(is_gzip(&packed));
        assert!(packed.len() < data.len());
        let back = block_on(GzipDecompressor.decompress(&packed)).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_corrupt_stream() {
        let result = block_on(GzipDecompressor.decompress(&[0x1f, 0x8b, 0xff, 0xff]));
        assert!(matches!(result, Err(Error::Decompression(_))));
    }
}
