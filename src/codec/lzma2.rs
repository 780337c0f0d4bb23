// LZMA2 codec (lzma-rs).

use std::io::{self, Write};

use super::{CodecId, Compressor, Decompressor, expect_len};
use crate::error::EngineError;

/// LZMA2 section codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lzma2Codec;

impl Compressor for Lzma2Codec {
    fn codec(&self) -> CodecId {
        CodecId::Lzma2
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut input = io::Cursor::new(data);
        let mut output = Vec::new();
        lzma_rs::lzma2_compress(&mut input, &mut output)?;
        Ok(output)
    }
}

impl Decompressor for Lzma2Codec {
    fn codec(&self) -> CodecId {
        CodecId::Lzma2
    }

    fn decompress(&self, data: &[u8], raw_len: usize) -> Result<Vec<u8>, EngineError> {
        let mut input = io::BufReader::new(io::Cursor::new(data));
        let mut sink = BoundedSink::new(raw_len);
        lzma_rs::lzma2_decompress(&mut input, &mut sink).map_err(|e| {
            EngineError::Decompress {
                codec: "lzma2",
                msg: e.to_string(),
            }
        })?;
        expect_len(CodecId::Lzma2, sink.buf, raw_len)
    }
}

/// Write sink that refuses to grow past a fixed limit.
struct BoundedSink {
    buf: Vec<u8>,
    limit: usize,
}

impl BoundedSink {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit),
            limit,
        }
    }
}

impl Write for BoundedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "decompressed section exceeds declared length",
            ));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_decompress_roundtrip() {
        let data: Vec<u8> = (0..2048u32).map(|i| (i % 17) as u8).collect();
        let packed = Lzma2Codec.compress(&data).unwrap();
        assert_eq!(Lzma2Codec.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn output_is_capped_at_declared_length() {
        let data = vec![b'z'; 500];
        let packed = Lzma2Codec.compress(&data).unwrap();
        assert!(Lzma2Codec.decompress(&packed, 100).is_err());
        assert!(Lzma2Codec.decompress(&packed, 501).is_err());
    }

    #[test]
    fn sink_rejects_overflow() {
        let mut sink = BoundedSink::new(4);
        sink.write_all(b"abcd").unwrap();
        assert!(sink.write_all(b"e").is_err());
        assert_eq!(sink.buf, b"abcd");
    }
}
