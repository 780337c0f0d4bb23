// Compiled-in codec lookup.
//
// The codec set is fixed at build time by cargo features. Lookups are
// read-only over statics, so concurrent callers need no locking.

use std::sync::LazyLock;

use super::{CodecId, Compressor, Decompressor};

#[cfg(feature = "codec-lzma2")]
use super::lzma2::Lzma2Codec;
#[cfg(feature = "codec-zlib")]
use super::zlib::ZlibCodec;
#[cfg(feature = "codec-zstd")]
use super::zstd::ZstdCodec;

#[cfg(feature = "codec-zlib")]
static ZLIB: ZlibCodec = ZlibCodec::DEFAULT;
#[cfg(feature = "codec-zstd")]
static ZSTD: ZstdCodec = ZstdCodec::DEFAULT;
#[cfg(feature = "codec-lzma2")]
static LZMA2: Lzma2Codec = Lzma2Codec;

/// Decompressors in verification preference order: zlib, zstd, lzma2.
static DECOMPRESSORS: LazyLock<Vec<&'static dyn Decompressor>> = LazyLock::new(|| {
    let mut list: Vec<&'static dyn Decompressor> = Vec::with_capacity(3);
    #[cfg(feature = "codec-zlib")]
    list.push(&ZLIB);
    #[cfg(feature = "codec-zstd")]
    list.push(&ZSTD);
    #[cfg(feature = "codec-lzma2")]
    list.push(&LZMA2);
    list
});

/// Compressor for `id`, or `None` for `CodecId::None` and codecs that are
/// not compiled in.
pub fn resolve_compressor(id: CodecId) -> Option<&'static dyn Compressor> {
    match id {
        #[cfg(feature = "codec-zlib")]
        CodecId::Zlib => Some(&ZLIB),
        #[cfg(feature = "codec-zstd")]
        CodecId::Zstd => Some(&ZSTD),
        #[cfg(feature = "codec-lzma2")]
        CodecId::Lzma2 => Some(&LZMA2),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// All compiled-in decompressors, in a fixed order. May be empty.
pub fn available_decompressors() -> &'static [&'static dyn Decompressor] {
    DECOMPRESSORS.as_slice()
}

/// Codec ids with a compiled-in backend (excluding `CodecId::None`).
pub fn compiled_codecs() -> impl Iterator<Item = CodecId> {
    CodecId::ALL
        .into_iter()
        .filter(|id| *id != CodecId::None && resolve_compressor(*id).is_some())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
