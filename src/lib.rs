//! hdiffz: construction and verification of compressed binary diffs.
//!
//! The crate provides:
//! - The delta boundary (`delta`): build a diff, verify a diff, own the result
//! - A codec registry (`codec`) for zlib, zstd and LZMA2 section compression
//! - A block-matching diff engine (`engine`) behind the `DiffEngine` trait
//! - A C ABI (`ffi`, header in `include/hdiffz.h`)
//! - An optional CLI (`cli` feature)
//!
//! Failures never escape the boundary: [`build_delta`] returns `None` and
//! [`verify_delta`] returns `false`. The `try_*` variants report why.
//!
//! # Quick Start
//!
//! ```
//! use hdiffz::{CodecId, build_delta, verify_delta};
//!
//! let old = b"AAAABBBBCCCC";
//! let new = b"AAAABBBBCCCCDDDD";
//!
//! let diff = build_delta(old, new, CodecId::Zlib, 0, 0).unwrap();
//! assert!(verify_delta(old, new, diff.as_bytes()));
//! assert!(!verify_delta(old, b"AAAABBBBCCCCDDDE", diff.as_bytes()));
//! ```

pub mod codec;
pub mod delta;
pub mod engine;
pub mod error;
pub mod ffi;

#[cfg(feature = "cli")]
pub mod cli;

pub use codec::CodecId;
pub use delta::{
    BuildParameters, DeltaBuilder, DeltaResult, DeltaVerifier, Verification, build_delta,
    result_data, result_release, result_size, try_build_delta, try_verify_delta, verify_delta,
};
pub use engine::{DEFAULT_MATCH_BLOCK_SIZE, DiffEngine, MIN_SINGLE_MATCH_SCORE_DEFAULT};
pub use error::{DeltaError, EngineError};
