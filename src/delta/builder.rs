// Delta builder: parameter normalization, compressor selection, and
// translation of every engine failure into "no result".

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, warn};

use super::DeltaResult;
use crate::codec::{CodecId, resolve_compressor};
use crate::engine::{
    BlockDiffEngine, ConstructParams, DEFAULT_MATCH_BLOCK_SIZE, DiffEngine,
    MIN_SINGLE_MATCH_SCORE_DEFAULT,
};
use crate::error::{DeltaError, panic_message};

/// Caller-facing build parameters. Zero means "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildParameters {
    pub codec: CodecId,
    /// Match block size in bytes; 0 selects `DEFAULT_MATCH_BLOCK_SIZE`.
    pub block_size: usize,
    /// Worker threads; 0 selects 1.
    pub threads: usize,
}

impl BuildParameters {
    pub fn new(codec: CodecId, block_size: usize, threads: usize) -> Self {
        Self {
            codec,
            block_size,
            threads,
        }
    }

    /// Replace zero values with their defaults.
    pub fn normalized(self) -> Self {
        Self {
            codec: self.codec,
            block_size: if self.block_size == 0 {
                DEFAULT_MATCH_BLOCK_SIZE
            } else {
                self.block_size
            },
            threads: self.threads.max(1),
        }
    }
}

/// Builds diffs with a given engine.
#[derive(Debug, Clone, Default)]
pub struct DeltaBuilder<E = BlockDiffEngine> {
    engine: E,
}

impl DeltaBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: DiffEngine> DeltaBuilder<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Build a diff from `old` to `new`, reporting why it failed.
    ///
    /// Engine panics are caught and returned as `DeltaError::EngineFault`.
    pub fn try_build(
        &self,
        old: &[u8],
        new: &[u8],
        params: BuildParameters,
    ) -> Result<DeltaResult, DeltaError> {
        let params = params.normalized();
        let compressor = resolve_compressor(params.codec);
        if compressor.is_none() && params.codec != CodecId::None {
            debug!("codec {} not compiled in, building uncompressed", params.codec);
        }

        let construct = ConstructParams {
            compressor,
            min_match_score: MIN_SINGLE_MATCH_SCORE_DEFAULT,
            stop_early: false,
            block_size: params.block_size,
            threads: params.threads,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Vec<u8>, DeltaError> {
            let mut out = Vec::new();
            out.try_reserve(initial_capacity(new.len()))?;
            self.engine.construct(new, old, &mut out, &construct)?;
            Ok(out)
        }));

        match outcome {
            Ok(Ok(out)) => Ok(DeltaResult::new(out)),
            Ok(Err(e)) => {
                debug!("diff construction failed: {e}");
                Err(e)
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!("diff engine panicked: {msg}");
                Err(DeltaError::EngineFault(msg))
            }
        }
    }

    /// Build a diff from `old` to `new`; `None` on any failure.
    pub fn build(&self, old: &[u8], new: &[u8], params: BuildParameters) -> Option<DeltaResult> {
        self.try_build(old, new, params).ok()
    }
}

/// First reservation for the output buffer: header plus a slice of new.
fn initial_capacity(new_len: usize) -> usize {
    64 + new_len / 8
}

/// Build a diff with the built-in engine.
///
/// `block_size == 0` and `threads == 0` select the defaults; a codec that is
/// not compiled in produces an uncompressed diff.
pub fn build_delta(
    old: &[u8],
    new: &[u8],
    codec: CodecId,
    block_size: usize,
    threads: usize,
) -> Option<DeltaResult> {
    DeltaBuilder::new().build(old, new, BuildParameters::new(codec, block_size, threads))
}

/// Like [`build_delta`], but returns the failure reason.
pub fn try_build_delta(
    old: &[u8],
    new: &[u8],
    codec: CodecId,
    block_size: usize,
    threads: usize,
) -> Result<DeltaResult, DeltaError> {
    DeltaBuilder::new().try_build(old, new, BuildParameters::new(codec, block_size, threads))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
