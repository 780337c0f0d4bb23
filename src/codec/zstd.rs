// Zstd codec (zstd bulk API).

use std::io;

use super::{CodecId, Compressor, Decompressor, expect_len};
use crate::error::EngineError;

/// Zstd section codec.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    pub const DEFAULT: Self = Self { level: 19 };

    /// Create a codec with the given compression level.
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Compressor for ZstdCodec {
    fn codec(&self) -> CodecId {
        CodecId::Zstd
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        ::zstd::bulk::compress(data, self.level)
    }
}

impl Decompressor for ZstdCodec {
    fn codec(&self) -> CodecId {
        CodecId::Zstd
    }

    fn decompress(&self, data: &[u8], raw_len: usize) -> Result<Vec<u8>, EngineError> {
        // The capacity bounds the output; a larger frame is an error.
        let output =
            ::zstd::bulk::decompress(data, raw_len).map_err(|e| EngineError::Decompress {
                codec: "zstd",
                msg: e.to_string(),
            })?;
        expect_len(CodecId::Zstd, output, raw_len)
    }
}
