// Rolling hash over a fixed-width window.
//
// Polynomial (Rabin-Karp) hash in the ring Z/2^64: a window `b[0..look]`
// hashes to sum((b[i] + 1) * BASE^(look-1-i)). Sliding one byte forward
// removes the outgoing term and appends the incoming one in O(1), so the
// target can be probed at every offset against block-aligned source hashes.

/// Odd multiplier (FNV-64 prime); odd keeps the map a bijection mod 2^64.
const BASE: u64 = 0x0000_0100_0000_01B3;

/// Rolling hash state for a window of `look` bytes.
#[derive(Debug, Clone, Copy)]
pub struct RollingHash {
    look: usize,
    /// `BASE^(look-1)`: weight of the byte leaving the window.
    out_weight: u64,
}

impl RollingHash {
    /// Build hash state for the given window width (must be non-zero).
    pub fn new(look: usize) -> Self {
        debug_assert!(look > 0);
        let mut out_weight = 1u64;
        for _ in 1..look {
            out_weight = out_weight.wrapping_mul(BASE);
        }
        Self { look, out_weight }
    }

    /// Window width.
    pub fn look(&self) -> usize {
        self.look
    }

    /// Full hash of the first `look` bytes of `base`.
    #[inline]
    pub fn checksum(&self, base: &[u8]) -> u64 {
        debug_assert!(base.len() >= self.look);
        base[..self.look]
            .iter()
            .fold(0u64, |h, &b| h.wrapping_mul(BASE).wrapping_add(weight(b)))
    }

    /// Slide the window one byte: drop `out`, append `inp`.
    #[inline(always)]
    pub fn roll(&self, hash: u64, out: u8, inp: u8) -> u64 {
        hash.wrapping_sub(weight(out).wrapping_mul(self.out_weight))
            .wrapping_mul(BASE)
            .wrapping_add(weight(inp))
    }
}

/// Byte weight; offset by one so runs of zero bytes still mix.
#[inline(always)]
fn weight(b: u8) -> u64 {
    u64::from(b) + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_matches_full_checksum() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for look in [1, 4, 9, 64] {
            let h = RollingHash::new(look);
            let mut cksum = h.checksum(&data);
            for pos in 1..=(data.len() - look) {
                cksum = h.roll(cksum, data[pos - 1], data[pos + look - 1]);
                assert_eq!(cksum, h.checksum(&data[pos..]), "look={look} pos={pos}");
            }
        }
    }

    #[test]
    fn zero_runs_of_different_length_differ() {
        let h4 = RollingHash::new(4);
        let h8 = RollingHash::new(8);
        assert_ne!(h4.checksum(&[0; 4]), h8.checksum(&[0; 8]));
        assert_ne!(h4.checksum(&[0; 4]), 0);
    }

    #[test]
    fn equal_windows_hash_equal() {
        let h = RollingHash::new(4);
        assert_eq!(h.checksum(b"ABCDxxxx"), h.checksum(b"ABCDyyyy"));
        assert_ne!(h.checksum(b"ABCD"), h.checksum(b"ABCE"));
        assert_eq!(h.look(), 4);
    }
}
