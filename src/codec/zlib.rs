// Zlib codec (flate2).
//
// Uses the zlib format (deflate + zlib header), not raw deflate, so each
// section is self-delimiting and carries an Adler-32 trailer.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use super::{CodecId, Compressor, Decompressor, expect_len};
use crate::error::EngineError;

/// Zlib section codec.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    level: u32,
}

impl ZlibCodec {
    pub const DEFAULT: Self = Self { level: 6 };

    /// Create a codec with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Compressor for ZlibCodec {
    fn codec(&self) -> CodecId {
        CodecId::Zlib
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data)?;
        encoder.finish()
    }
}

impl Decompressor for ZlibCodec {
    fn codec(&self) -> CodecId {
        CodecId::Zlib
    }

    fn decompress(&self, data: &[u8], raw_len: usize) -> Result<Vec<u8>, EngineError> {
        let mut output = Vec::with_capacity(raw_len);
        // One extra byte so an over-long stream is detected, not truncated.
        ZlibDecoder::new(data)
            .take(raw_len as u64 + 1)
            .read_to_end(&mut output)
            .map_err(|e| EngineError::Decompress {
                codec: "zlib",
                msg: e.to_string(),
            })?;
        expect_len(CodecId::Zlib, output, raw_len)
    }
}
