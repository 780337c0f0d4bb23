// Compressed diff container.
//
// Layout:
//
//   magic        "HDZ" 0x01
//   flags        u8 (HeaderFlags)
//   type_len     u8, then type_len bytes of compressor type name (0 = none)
//   old_len      varint
//   new_len      varint
//   cover_count  varint
//   [adler32]    u32 BE of new data, if HeaderFlags::ADLER32
//   covers       section
//   literals     section
//
// A section is `raw_len varint, packed_len varint, bytes`, where
// packed_len == 0 means the raw bytes are stored as-is.
//
// A cover record is `gap, zigzag(old_pos - prev_old_end), len`, all
// varints; `gap` counts the literal bytes of new before the cover.

use std::borrow::Cow;

use bitflags::bitflags;

use super::matcher::Cover;
use super::varint::{self, MAX_VARINT_LEN, Reader};
use crate::codec::{self, Compressor, Decompressor};
use crate::error::EngineError;

pub const MAGIC: [u8; 4] = *b"HDZ\x01";

/// Upper bound on the encoded size of one cover record.
pub const MAX_COVER_RECORD_LEN: usize = 3 * MAX_VARINT_LEN;

bitflags! {
    /// Header indicator bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u8 {
        /// An Adler-32 of the new data follows the counts.
        const ADLER32 = 1 << 0;
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Decoded container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    pub flags: HeaderFlags,
    /// Compressor type name; empty for an uncompressed diff.
    pub type_name: &'a str,
    pub old_len: usize,
    pub new_len: usize,
    pub cover_count: usize,
    pub adler32: Option<u32>,
}

impl<'a> Header<'a> {
    pub fn is_compressed(&self) -> bool {
        !self.type_name.is_empty()
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), EngineError> {
        let type_len = u8::try_from(self.type_name.len())
            .map_err(|_| EngineError::InvalidParameter("compressor type name longer than 255 bytes"))?;

        out.extend_from_slice(&MAGIC);
        out.push(self.flags.bits());
        out.push(type_len);
        out.extend_from_slice(self.type_name.as_bytes());
        varint::push_usize(out, self.old_len);
        varint::push_usize(out, self.new_len);
        varint::push_usize(out, self.cover_count);
        if self.flags.contains(HeaderFlags::ADLER32) {
            let sum = self.adler32.unwrap_or_default();
            out.extend_from_slice(&sum.to_be_bytes());
        }
        Ok(())
    }

    pub fn read(r: &mut Reader<'a>) -> Result<Self, EngineError> {
        if r.bytes(MAGIC.len()).ok() != Some(&MAGIC[..]) {
            return Err(EngineError::Corrupt("bad magic".into()));
        }
        let raw_flags = r.byte()?;
        let flags = HeaderFlags::from_bits(raw_flags)
            .ok_or_else(|| EngineError::Corrupt(format!("unknown header flags {raw_flags:#04x}")))?;

        let type_len = r.byte()? as usize;
        let type_name = std::str::from_utf8(r.bytes(type_len)?)
            .map_err(|_| EngineError::Corrupt("compressor type name is not utf-8".into()))?;

        let old_len = r.usize()?;
        let new_len = r.usize()?;
        let cover_count = r.usize()?;

        let adler32 = if flags.contains(HeaderFlags::ADLER32) {
            let b = r.bytes(4)?;
            Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        } else {
            None
        };

        Ok(Self {
            flags,
            type_name,
            old_len,
            new_len,
            cover_count,
            adler32,
        })
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Append a section, compressing it when that helps.
pub fn write_section(
    out: &mut Vec<u8>,
    raw: &[u8],
    compressor: Option<&dyn Compressor>,
) -> Result<(), EngineError> {
    let packed = match compressor {
        Some(c) => codec::compress_section(c, raw)?,
        None => None,
    };
    varint::push_usize(out, raw.len());
    match packed {
        Some(packed) => {
            varint::push_usize(out, packed.len());
            out.extend_from_slice(&packed);
        }
        None => {
            varint::push_usize(out, 0);
            out.extend_from_slice(raw);
        }
    }
    Ok(())
}

/// A section as it appears in the container.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub raw_len: usize,
    /// Compressed payload, or `None` when stored raw.
    pub packed: Option<&'a [u8]>,
    stored: &'a [u8],
}

impl<'a> Section<'a> {
    /// Read a section header and payload. `raw_len` above `max_raw_len`
    /// is rejected before anything is allocated.
    pub fn read(r: &mut Reader<'a>, max_raw_len: usize) -> Result<Self, EngineError> {
        let raw_len = r.usize()?;
        if raw_len > max_raw_len {
            return Err(EngineError::Corrupt(format!(
                "section of {raw_len} bytes exceeds limit {max_raw_len}"
            )));
        }
        let packed_len = r.usize()?;
        if packed_len == 0 {
            Ok(Self {
                raw_len,
                packed: None,
                stored: r.bytes(raw_len)?,
            })
        } else {
            Ok(Self {
                raw_len,
                packed: Some(r.bytes(packed_len)?),
                stored: &[],
            })
        }
    }

    /// Raw section bytes, decompressing if needed.
    pub fn open(&self, decompressor: Option<&dyn Decompressor>) -> Result<Cow<'a, [u8]>, EngineError> {
        match (self.packed, decompressor) {
            (None, _) => Ok(Cow::Borrowed(self.stored)),
            (Some(packed), Some(d)) => d.decompress(packed, self.raw_len).map(Cow::Owned),
            (Some(_), None) => Err(EngineError::Corrupt(
                "compressed section in an uncompressed diff".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Cover and literal streams
// ---------------------------------------------------------------------------

/// Encode covers (ascending, non-overlapping in new) as records.
pub fn encode_covers(covers: &[Cover]) -> Vec<u8> {
    let mut out = Vec::with_capacity(covers.len() * 6);
    let mut last_new_end = 0usize;
    let mut last_old_end = 0usize;
    for c in covers {
        varint::push_usize(&mut out, c.new_pos - last_new_end);
        varint::push_i64(&mut out, c.old_pos as i64 - last_old_end as i64);
        varint::push_usize(&mut out, c.len);
        last_new_end = c.new_end();
        last_old_end = c.old_end();
    }
    out
}

/// New-data bytes not covered by any cover, in order.
pub fn collect_literals(new: &[u8], covers: &[Cover]) -> Vec<u8> {
    let covered: usize = covers.iter().map(|c| c.len).sum();
    let mut out = Vec::with_capacity(new.len() - covered);
    let mut pos = 0usize;
    for c in covers {
        out.extend_from_slice(&new[pos..c.new_pos]);
        pos = c.new_end();
    }
    out.extend_from_slice(&new[pos..]);
    out
}

/// One decoded cover record, positions still relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverRecord {
    pub gap: usize,
    pub old_delta: i64,
    pub len: usize,
}

pub fn read_cover(r: &mut Reader<'_>) -> Result<CoverRecord, EngineError> {
    Ok(CoverRecord {
        gap: r.usize()?,
        old_delta: r.i64()?,
        len: r.usize()?,
    })
}

// ---------------------------------------------------------------------------
// Adler-32
// ---------------------------------------------------------------------------

pub fn adler32(data: &[u8]) -> u32 {
    #[cfg(feature = "adler32")]
    {
        let mut hasher = simd_adler32::Adler32::new();
        hasher.write(data);
        hasher.finish()
    }
    #[cfg(not(feature = "adler32"))]
    {
        adler32_simple(data)
    }
}

#[cfg(any(test, not(feature = "adler32")))]
fn adler32_simple(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    // Largest n with 255n(n+1)/2 + (n+1)(MOD_ADLER-1) < 2^32.
    const NMAX: usize = 5552;
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for chunk in data.chunks(NMAX) {
        for &byte in chunk {
            a += u32::from(byte);
            b += a;
        }
        a %= MOD_ADLER;
        b %= MOD_ADLER;
    }
    (b << 16) | a
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
