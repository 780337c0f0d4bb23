// Block index over the old data.
//
// Every block-aligned window `old[i*bs .. (i+1)*bs]` is hashed once and
// inserted into a bucket table with a `next` chain per block (the same
// head/prev layout as a chained hash table, stored value 0 = empty).
// Blocks are inserted last-to-first so a chain walk yields the earliest
// block first.

use super::rolling::RollingHash;
use crate::error::EngineError;

/// Offset added to stored block numbers so 0 means "empty".
const HASH_CKOFFSET: u32 = 1;

/// Hash index of the block-aligned windows of `old`.
pub struct BlockIndex {
    /// `heads[bucket] = block + HASH_CKOFFSET` or 0.
    heads: Vec<u32>,
    /// `next[block] = older_block + HASH_CKOFFSET` or 0.
    next: Vec<u32>,
    mask: usize,
    block_size: usize,
}

impl BlockIndex {
    /// Index all complete blocks of `old`.
    pub fn build(old: &[u8], hasher: &RollingHash) -> Result<Self, EngineError> {
        let block_size = hasher.look();
        let blocks = old.len() / block_size;
        if blocks >= u32::MAX as usize {
            return Err(EngineError::TooLarge(format!(
                "{blocks} blocks of {block_size} bytes exceed the block index"
            )));
        }

        let buckets = blocks.max(8).next_power_of_two();
        let mut index = Self {
            heads: vec![0u32; buckets],
            next: vec![0u32; blocks],
            mask: buckets - 1,
            block_size,
        };

        for block in (0..blocks).rev() {
            let start = block * block_size;
            let cksum = hasher.checksum(&old[start..]);
            index.insert(cksum, block);
        }
        Ok(index)
    }

    #[inline(always)]
    fn bucket(&self, cksum: u64) -> usize {
        ((cksum >> 32) ^ cksum) as usize & self.mask
    }

    fn insert(&mut self, cksum: u64, block: usize) {
        let bucket = self.bucket(cksum);
        self.next[block] = self.heads[bucket];
        self.heads[bucket] = block as u32 + HASH_CKOFFSET;
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Old-data offsets of blocks whose bucket matches `cksum`, earliest first.
    ///
    /// Bucket collisions are possible; callers compare the bytes.
    pub fn candidates(&self, cksum: u64) -> Candidates<'_> {
        Candidates {
            index: self,
            cursor: self.heads[self.bucket(cksum)],
        }
    }
}

/// Iterator over one bucket chain.
pub struct Candidates<'a> {
    index: &'a BlockIndex,
    cursor: u32,
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cursor == 0 {
            return None;
        }
        let block = (self.cursor - HASH_CKOFFSET) as usize;
        self.cursor = self.index.next[block];
        Some(block * self.index.block_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_complete_blocks_only() {
        let h = RollingHash::new(4);
        let idx = BlockIndex::build(b"AAAABBBBCC", &h).unwrap();
        assert_eq!(idx.len(), 2);
        assert!(idx.candidates(h.checksum(b"AAAA")).any(|p| p == 0));
        assert!(idx.candidates(h.checksum(b"BBBB")).any(|p| p == 4));
    }

    #[test]
    fn repeated_blocks_chain_earliest_first() {
        let h = RollingHash::new(4);
        let idx = BlockIndex::build(b"ABCDxxxxABCDyyyyABCD", &h).unwrap();
        let hits: Vec<usize> = idx
            .candidates(h.checksum(b"ABCD"))
            .filter(|&p| p % 8 == 0)
            .collect();
        assert_eq!(hits, vec![0, 8, 16]);
    }

    #[test]
    fn empty_old_has_no_candidates() {
        let h = RollingHash::new(64);
        let idx = BlockIndex::build(b"short", &h).unwrap();
        assert!(idx.is_empty());
        assert_eq!(idx.candidates(h.checksum(&[0u8; 64])).count(), 0);
    }
}
