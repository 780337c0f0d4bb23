// Compressed diff construction.
//
// 1. Index old in `block_size` blocks.
// 2. Find covers of new (per segment, on a thread pool when enabled).
// 3. Write header, covers section and literals section.

use std::time::Instant;

use log::debug;

use super::ConstructParams;
use super::format::{self, Header, HeaderFlags};
use super::matcher::{Cover, MatchConfig, Matcher, split_segments};
use super::rolling::RollingHash;
use super::table::BlockIndex;
use crate::error::EngineError;

/// Append a compressed diff from `old` to `new` onto `out`.
pub fn create_compressed_diff(
    new: &[u8],
    old: &[u8],
    out: &mut Vec<u8>,
    params: &ConstructParams<'_>,
) -> Result<(), EngineError> {
    if params.block_size == 0 {
        return Err(EngineError::InvalidParameter("block size must be non-zero"));
    }
    if params.threads == 0 {
        return Err(EngineError::InvalidParameter("thread count must be non-zero"));
    }

    let started = Instant::now();
    let covers = find_covers(new, old, params)?;
    let cover_bytes = format::encode_covers(&covers);
    let literals = format::collect_literals(new, &covers);

    let header = Header {
        flags: HeaderFlags::ADLER32,
        type_name: params.compressor.map_or("", |c| c.type_name()),
        old_len: old.len(),
        new_len: new.len(),
        cover_count: covers.len(),
        adler32: Some(format::adler32(new)),
    };

    let start_len = out.len();
    header.write(out)?;
    format::write_section(out, &cover_bytes, params.compressor)?;
    format::write_section(out, &literals, params.compressor)?;

    debug!(
        "diff: old={} new={} covers={} literals={} out={} codec={} in {:?}",
        old.len(),
        new.len(),
        covers.len(),
        literals.len(),
        out.len() - start_len,
        if header.type_name.is_empty() { "none" } else { header.type_name },
        started.elapsed()
    );
    Ok(())
}

/// All covers of `new`, ascending by position.
fn find_covers(
    new: &[u8],
    old: &[u8],
    params: &ConstructParams<'_>,
) -> Result<Vec<Cover>, EngineError> {
    // No block of old can match: skip indexing entirely.
    if params.block_size > old.len() || params.block_size > new.len() {
        return Ok(Vec::new());
    }

    let hasher = RollingHash::new(params.block_size);
    let index = BlockIndex::build(old, &hasher)?;
    let config = MatchConfig {
        min_match_score: params.min_match_score,
        stop_early: params.stop_early,
    };
    let matcher = Matcher::new(old, new, &index, hasher, config);

    let segments = split_segments(new.len(), params.threads);
    if segments.len() <= 1 {
        return Ok(matcher.find_covers(0..new.len()));
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        // At most one worker per segment.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(segments.len())
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
        let per_segment: Vec<Vec<Cover>> = pool.install(|| {
            segments
                .into_par_iter()
                .map(|seg| matcher.find_covers(seg))
                .collect()
        });
        Ok(per_segment.into_iter().flatten().collect())
    }

    #[cfg(not(feature = "parallel"))]
    {
        Ok(segments
            .into_iter()
            .flat_map(|seg| matcher.find_covers(seg))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
