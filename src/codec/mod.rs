// Compression codecs for diff sections.
//
// - `CodecId`: the ABI-stable codec enumeration
// - `Compressor`: compress one section when building
// - `Decompressor`: open one section of a named type when checking
// - `registry`: compiled-in codec lookup
//
// Built-in backends, each behind its own feature:
//   - zlib  (flate2, `codec-zlib`)
//   - zstd  (zstd, `codec-zstd`)
//   - lzma2 (lzma-rs, `codec-lzma2`)

use std::fmt;
use std::io;

use crate::error::EngineError;

#[cfg(feature = "codec-lzma2")]
pub mod lzma2;
pub mod registry;
#[cfg(feature = "codec-zlib")]
pub mod zlib;
#[cfg(feature = "codec-zstd")]
pub mod zstd;

pub use registry::{available_decompressors, compiled_codecs, resolve_compressor};

/// Minimum section size worth compressing.
const MIN_COMPRESS_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// CodecId
// ---------------------------------------------------------------------------

/// Compression scheme identifier.
///
/// The discriminants are part of the C ABI and must never be renumbered.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecId {
    #[default]
    None = 0,
    Zlib = 1,
    Zstd = 2,
    Lzma2 = 3,
}

impl CodecId {
    pub const ALL: [CodecId; 4] = [Self::None, Self::Zlib, Self::Zstd, Self::Lzma2];

    /// Map a raw ABI value. Unknown values yield `None` (the Rust option).
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Zlib),
            2 => Some(Self::Zstd),
            3 => Some(Self::Lzma2),
            _ => None,
        }
    }

    /// Map a raw ABI value, degrading unknown values to `CodecId::None`.
    pub fn from_raw_lossy(raw: i32) -> Self {
        Self::from_raw(raw).unwrap_or(Self::None)
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Type name written into compressed diffs.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Zstd => "zstd",
            Self::Lzma2 => "lzma2",
        }
    }

    /// Whether this codec is compiled into the build. `None` always is.
    pub fn is_available(self) -> bool {
        self == Self::None || resolve_compressor(self).is_some()
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Compressor / Decompressor
// ---------------------------------------------------------------------------

/// Construction-side codec handle.
pub trait Compressor: Send + Sync {
    fn codec(&self) -> CodecId;

    /// Type name recorded in the diff header.
    fn type_name(&self) -> &'static str {
        self.codec().name()
    }

    /// Compress a whole section.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Whether this section is worth compressing. Default: skip if < 32 bytes.
    fn should_compress(&self, data: &[u8]) -> bool {
        data.len() >= MIN_COMPRESS_SIZE
    }
}

/// Verification-side codec handle.
pub trait Decompressor: Send + Sync {
    fn codec(&self) -> CodecId;

    /// Whether this decompressor understands sections of `type_name`.
    fn can_open(&self, type_name: &str) -> bool {
        type_name == self.codec().name()
    }

    /// Decompress a section that must expand to exactly `raw_len` bytes.
    ///
    /// Implementations must not produce more than `raw_len` bytes of output
    /// regardless of what the compressed stream claims.
    fn decompress(&self, data: &[u8], raw_len: usize) -> Result<Vec<u8>, EngineError>;
}

impl fmt::Debug for dyn Compressor + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compressor({})", self.type_name())
    }
}

impl fmt::Debug for dyn Decompressor + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decompressor({})", self.codec())
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

/// Compress a section, or return `None` when it should be stored raw
/// (too small, or compression did not shrink it).
pub fn compress_section(compressor: &dyn Compressor, data: &[u8]) -> io::Result<Option<Vec<u8>>> {
    if !compressor.should_compress(data) {
        return Ok(None);
    }
    let packed = compressor.compress(data)?;
    Ok((packed.len() < data.len()).then_some(packed))
}

/// Check a decompressed section against its declared length.
pub(crate) fn expect_len(
    codec: CodecId,
    out: Vec<u8>,
    raw_len: usize,
) -> Result<Vec<u8>, EngineError> {
    if out.len() != raw_len {
        return Err(EngineError::Decompress {
            codec: codec.name(),
            msg: format!("expected {raw_len} bytes, got {}", out.len()),
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Reverse;

    impl Compressor for Reverse {
        fn codec(&self) -> CodecId {
            CodecId::None
        }
        fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
            Ok(data.iter().rev().skip(1).copied().collect())
        }
    }

    struct Inflating;

    impl Compressor for Inflating {
        fn codec(&self) -> CodecId {
            CodecId::None
        }
        fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
            let mut out = data.to_vec();
            out.push(0);
            Ok(out)
        }
    }

    #[test]
    fn raw_values_are_stable() {
        assert_eq!(CodecId::None.as_raw(), 0);
        assert_eq!(CodecId::Zlib.as_raw(), 1);
        assert_eq!(CodecId::Zstd.as_raw(), 2);
        assert_eq!(CodecId::Lzma2.as_raw(), 3);
        for id in CodecId::ALL {
            assert_eq!(CodecId::from_raw(id.as_raw()), Some(id));
        }
    }

    #[test]
    fn unknown_raw_values_degrade_to_none() {
        assert_eq!(CodecId::from_raw(4), None);
        assert_eq!(CodecId::from_raw(-1), None);
        assert_eq!(CodecId::from_raw_lossy(99), CodecId::None);
        assert!(CodecId::None.is_available());
    }

    #[test]
    fn small_sections_stay_raw() {
        assert_eq!(compress_section(&Reverse, b"tiny").unwrap(), None);
    }

    #[test]
    fn section_kept_only_when_smaller() {
        let data = vec![7u8; 64];
        assert_eq!(compress_section(&Reverse, &data).unwrap().map(|v| v.len()), Some(63));
        assert_eq!(compress_section(&Inflating, &data).unwrap(), None);
    }

    #[test]
    fn length_check_rejects_short_output() {
        assert!(expect_len(CodecId::Zlib, vec![1, 2], 2).is_ok());
        let err = expect_len(CodecId::Zlib, vec![1], 2).unwrap_err();
        assert!(matches!(err, EngineError::Decompress { codec: "zlib", .. }));
    }
}
