// Block matching: find covers of `new` inside `old`.
//
// A cover is a range of `new` that equals a range of `old`. Candidates come
// from the block index (hash of a block-aligned window of old equal to the
// rolling hash at the current position of new). Each verified candidate is
// extended forward and backward, then scored by its length minus the cost
// of encoding it; covers below the minimum score are dropped and their bytes
// stay literal.
//
// `new` may be split into independent segments, one per worker thread.
// Covers never cross a segment boundary.

use std::ops::Range;

use super::rolling::RollingHash;
use super::table::BlockIndex;
use super::varint;

/// Chain entries examined per probe before giving up on a better candidate.
const MAX_CHAIN_WALK: usize = 64;

/// Smallest segment worth handing to its own thread.
pub const MIN_SEGMENT_LEN: usize = 1 << 16;

/// A range of `new` copied from `old`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cover {
    pub old_pos: usize,
    pub new_pos: usize,
    pub len: usize,
}

impl Cover {
    #[inline]
    pub fn new_end(&self) -> usize {
        self.new_pos + self.len
    }

    #[inline]
    pub fn old_end(&self) -> usize {
        self.old_pos + self.len
    }
}

/// Tuning for one matching pass.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub min_match_score: usize,
    /// Accept the first verified candidate instead of the longest one.
    pub stop_early: bool,
}

/// Matching context shared by all segments.
pub struct Matcher<'a> {
    old: &'a [u8],
    new: &'a [u8],
    index: &'a BlockIndex,
    hasher: RollingHash,
    config: MatchConfig,
}

impl<'a> Matcher<'a> {
    pub fn new(
        old: &'a [u8],
        new: &'a [u8],
        index: &'a BlockIndex,
        hasher: RollingHash,
        config: MatchConfig,
    ) -> Self {
        Self {
            old,
            new,
            index,
            hasher,
            config,
        }
    }

    /// Find covers for `new[segment]`, in ascending `new_pos` order.
    pub fn find_covers(&self, segment: Range<usize>) -> Vec<Cover> {
        let bs = self.hasher.look();
        let Range { start, end } = segment;
        let mut covers = Vec::new();

        if self.index.is_empty() || end - start < bs {
            return covers;
        }

        let new = self.new;
        let mut pos = start;
        let mut last_end = start;
        let mut last_old_end = 0usize;
        let mut cksum = self.hasher.checksum(&new[pos..]);

        while pos + bs <= end {
            if let Some(cover) = self.best_match(cksum, pos, last_end, end)
                && self.score(&cover, last_end, last_old_end) >= self.config.min_match_score as i64
            {
                pos = cover.new_end();
                last_end = pos;
                last_old_end = cover.old_end();
                covers.push(cover);
                if pos + bs > end {
                    break;
                }
                cksum = self.hasher.checksum(&new[pos..]);
                continue;
            }

            if pos + bs >= end {
                break;
            }
            cksum = self.hasher.roll(cksum, new[pos], new[pos + bs]);
            pos += 1;
        }

        covers
    }

    /// Longest verified match at `pos` (or the first, with `stop_early`).
    fn best_match(&self, cksum: u64, pos: usize, floor: usize, end: usize) -> Option<Cover> {
        let bs = self.hasher.look();
        let window = &self.new[pos..pos + bs];
        let mut best: Option<Cover> = None;

        for old_pos in self.index.candidates(cksum).take(MAX_CHAIN_WALK) {
            if &self.old[old_pos..old_pos + bs] != window {
                continue;
            }
            let cover = self.extend(old_pos, pos, floor, end);
            if best.is_none_or(|b| cover.len > b.len) {
                best = Some(cover);
            }
            if self.config.stop_early {
                break;
            }
        }
        best
    }

    /// Grow a verified block match in both directions.
    ///
    /// Backward growth stops at `floor` (end of the previous cover or the
    /// segment start); forward growth stops at the segment `end`.
    fn extend(&self, old_pos: usize, new_pos: usize, floor: usize, end: usize) -> Cover {
        let (old, new) = (self.old, self.new);
        let bs = self.hasher.look();

        let max_fwd = (old.len() - old_pos).min(end - new_pos);
        let fwd = bs + old[old_pos + bs..old_pos + max_fwd]
            .iter()
            .zip(&new[new_pos + bs..new_pos + max_fwd])
            .take_while(|(a, b)| a == b)
            .count();

        let max_back = old_pos.min(new_pos - floor);
        let back = old[old_pos - max_back..old_pos]
            .iter()
            .rev()
            .zip(new[new_pos - max_back..new_pos].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        Cover {
            old_pos: old_pos - back,
            new_pos: new_pos - back,
            len: back + fwd,
        }
    }

    /// Bytes saved by emitting `cover` instead of literals.
    fn score(&self, cover: &Cover, last_end: usize, last_old_end: usize) -> i64 {
        cover.len as i64 - cover_cost(cover, last_end, last_old_end) as i64
    }
}

/// Encoded size of one cover record (see `format::encode_covers`).
pub fn cover_cost(cover: &Cover, last_new_end: usize, last_old_end: usize) -> usize {
    let gap = (cover.new_pos - last_new_end) as u64;
    let delta = cover.old_pos as i64 - last_old_end as i64;
    varint::sizeof_u64(gap)
        + varint::sizeof_u64(varint::zigzag(delta))
        + varint::sizeof_u64(cover.len as u64)
}

/// Split `0..len` into at most `threads` contiguous segments of at least
/// `MIN_SEGMENT_LEN` bytes each.
pub fn split_segments(len: usize, threads: usize) -> Vec<Range<usize>> {
    let count = threads.min(len / MIN_SEGMENT_LEN).max(1);
    let step = len.div_ceil(count).max(1);
    (0..count)
        .map(|i| (i * step).min(len)..((i + 1) * step).min(len))
        .filter(|r| !r.is_empty() || len == 0)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
