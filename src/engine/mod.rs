// Diff engine: block matching plus the compressed diff container.
//
// Orchestrates:
//   - Block index + rolling hash over old data (`table`, `rolling`)
//   - Cover search over new data, optionally on a thread pool (`matcher`)
//   - Container encoding with per-section compression (`format`, `construct`)
//   - Verification of a container against old/new data (`check`)
//
// The delta boundary only sees the `DiffEngine` trait.

pub mod check;
pub mod construct;
pub mod format;
pub mod matcher;
pub mod rolling;
pub mod table;
pub mod varint;

use crate::codec::{Compressor, Decompressor};
use crate::error::EngineError;

/// Block size used when the caller passes 0.
pub const DEFAULT_MATCH_BLOCK_SIZE: usize = 64;

/// Minimum bytes a cover must save over its encoding to be kept.
pub const MIN_SINGLE_MATCH_SCORE_DEFAULT: usize = 6;

// ---------------------------------------------------------------------------
// Construction parameters
// ---------------------------------------------------------------------------

/// Everything the construction engine needs besides the buffers.
#[derive(Debug, Clone, Copy)]
pub struct ConstructParams<'c> {
    /// Section compressor; `None` writes an uncompressed diff.
    pub compressor: Option<&'c dyn Compressor>,
    pub min_match_score: usize,
    /// Take the first verified match instead of searching for the longest.
    pub stop_early: bool,
    /// Must be non-zero.
    pub block_size: usize,
    /// Must be non-zero.
    pub threads: usize,
}

impl Default for ConstructParams<'_> {
    fn default() -> Self {
        Self {
            compressor: None,
            min_match_score: MIN_SINGLE_MATCH_SCORE_DEFAULT,
            stop_early: false,
            block_size: DEFAULT_MATCH_BLOCK_SIZE,
            threads: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine trait
// ---------------------------------------------------------------------------

/// Diff construction and verification.
///
/// Argument order is new-before-old on both operations.
pub trait DiffEngine {
    /// Append a compressed diff turning `old` into `new` to `out`.
    fn construct(
        &self,
        new: &[u8],
        old: &[u8],
        out: &mut Vec<u8>,
        params: &ConstructParams<'_>,
    ) -> Result<(), EngineError>;

    /// Whether `diff` applied to `old` reproduces `new` exactly.
    ///
    /// `Ok(false)` is a clean mismatch; `Err` means the diff could not be
    /// read with the given decompressor.
    fn check(
        &self,
        new: &[u8],
        old: &[u8],
        diff: &[u8],
        decompressor: Option<&dyn Decompressor>,
    ) -> Result<bool, EngineError>;
}

impl<E: DiffEngine + ?Sized> DiffEngine for &E {
    fn construct(
        &self,
        new: &[u8],
        old: &[u8],
        out: &mut Vec<u8>,
        params: &ConstructParams<'_>,
    ) -> Result<(), EngineError> {
        (**self).construct(new, old, out, params)
    }

    fn check(
        &self,
        new: &[u8],
        old: &[u8],
        diff: &[u8],
        decompressor: Option<&dyn Decompressor>,
    ) -> Result<bool, EngineError> {
        (**self).check(new, old, diff, decompressor)
    }
}

/// The built-in block-matching engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockDiffEngine;

impl DiffEngine for BlockDiffEngine {
    fn construct(
        &self,
        new: &[u8],
        old: &[u8],
        out: &mut Vec<u8>,
        params: &ConstructParams<'_>,
    ) -> Result<(), EngineError> {
        construct::create_compressed_diff(new, old, out, params)
    }

    fn check(
        &self,
        new: &[u8],
        old: &[u8],
        diff: &[u8],
        decompressor: Option<&dyn Decompressor>,
    ) -> Result<bool, EngineError> {
        check::check_compressed_diff(new, old, diff, decompressor)
    }
}
