// Compressed diff verification.
//
// Walks the cover records and the literal stream in lockstep, comparing
// each produced range against `new` in place. The reconstructed output is
// never materialised.

use log::trace;

use super::format::{self, Header, MAX_COVER_RECORD_LEN, Section};
use super::varint::Reader;
use crate::codec::Decompressor;
use crate::error::EngineError;

/// Whether `diff` turns `old` into exactly `new`.
///
/// Returns `Ok(false)` for a well-formed diff that produces something else,
/// and `Err` when the diff is malformed or cannot be opened with
/// `decompressor` (a typed diff needs a decompressor that can open its
/// type; an uncompressed diff must be checked without one).
pub fn check_compressed_diff(
    new: &[u8],
    old: &[u8],
    diff: &[u8],
    decompressor: Option<&dyn Decompressor>,
) -> Result<bool, EngineError> {
    let mut r = Reader::new(diff);
    let header = Header::read(&mut r)?;

    match decompressor {
        None if header.is_compressed() => {
            return Err(EngineError::MissingDecompressor(header.type_name.to_string()));
        }
        Some(d) if !d.can_open(header.type_name) => {
            return Err(EngineError::DecompressorMismatch {
                expected: header.type_name.to_string(),
                got: d.codec().name(),
            });
        }
        _ => {}
    }

    if header.old_len != old.len() || header.new_len != new.len() {
        trace!(
            "check: size mismatch old {}/{} new {}/{}",
            header.old_len,
            old.len(),
            header.new_len,
            new.len()
        );
        return Ok(false);
    }
    if header.cover_count > header.new_len {
        return Err(EngineError::Corrupt(format!(
            "{} covers for {} bytes of new data",
            header.cover_count, header.new_len
        )));
    }
    if let Some(expected) = header.adler32
        && expected != format::adler32(new)
    {
        trace!("check: adler32 mismatch");
        return Ok(false);
    }

    let cover_limit = header.cover_count.saturating_mul(MAX_COVER_RECORD_LEN);
    let cover_section = Section::read(&mut r, cover_limit)?;
    let literal_section = Section::read(&mut r, header.new_len)?;
    if !r.is_empty() {
        return Err(EngineError::Corrupt(format!(
            "{} trailing bytes after literal section",
            r.remaining()
        )));
    }

    let cover_bytes = cover_section.open(decompressor)?;
    let literals = literal_section.open(decompressor)?;

    let mut covers = Reader::new(&cover_bytes);
    let mut lit = Reader::new(&literals);
    let mut new_pos = 0usize;
    let mut last_old_end = 0usize;

    for i in 0..header.cover_count {
        let rec = format::read_cover(&mut covers)?;
        if rec.len == 0 {
            return Err(EngineError::Corrupt(format!("cover {i} has zero length")));
        }

        let old_pos = i64::try_from(last_old_end)
            .ok()
            .and_then(|end| end.checked_add(rec.old_delta))
            .and_then(|p| usize::try_from(p).ok())
            .filter(|p| p.checked_add(rec.len).is_some_and(|e| e <= old.len()))
            .ok_or_else(|| EngineError::Corrupt(format!("cover {i} reads outside old data")))?;
        let copy_start = new_pos
            .checked_add(rec.gap)
            .filter(|s| s.checked_add(rec.len).is_some_and(|e| e <= new.len()))
            .ok_or_else(|| EngineError::Corrupt(format!("cover {i} writes past new data")))?;

        if lit.bytes(rec.gap)? != &new[new_pos..copy_start] {
            return Ok(false);
        }
        if old[old_pos..old_pos + rec.len] != new[copy_start..copy_start + rec.len] {
            return Ok(false);
        }

        new_pos = copy_start + rec.len;
        last_old_end = old_pos + rec.len;
    }

    if !covers.is_empty() {
        return Err(EngineError::Corrupt("unused bytes in cover section".into()));
    }
    if lit.remaining() != new.len() - new_pos {
        return Err(EngineError::Corrupt(format!(
            "literal section has {} bytes left for {} bytes of new data",
            lit.remaining(),
            new.len() - new_pos
        )));
    }
    Ok(lit.bytes(lit.remaining())? == &new[new_pos..])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
