// Delta verifier: brute-force over every compiled-in decompressor, then
// no decompressor. A failing or panicking attempt only moves on to the next
// candidate.

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, warn};

use crate::codec::{CodecId, Decompressor, available_decompressors};
use crate::engine::{BlockDiffEngine, DiffEngine};
use crate::error::{DeltaError, panic_message};

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Decompressor that matched, or `None` for the uncompressed attempt.
    pub decompressor: Option<CodecId>,
    /// Attempts made, including the successful one.
    pub attempts: usize,
}

/// Verifies diffs with a given engine.
#[derive(Debug, Clone, Default)]
pub struct DeltaVerifier<E = BlockDiffEngine> {
    engine: E,
}

impl DeltaVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: DiffEngine> DeltaVerifier<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Check `diff` against `old`/`new` with the registry's decompressors.
    pub fn try_verify(&self, old: &[u8], new: &[u8], diff: &[u8]) -> Result<Verification, DeltaError> {
        self.try_verify_with(available_decompressors(), old, new, diff)
    }

    /// Check `diff` with each of `decompressors` in order, then with none.
    pub fn try_verify_with(
        &self,
        decompressors: &[&dyn Decompressor],
        old: &[u8],
        new: &[u8],
        diff: &[u8],
    ) -> Result<Verification, DeltaError> {
        let candidates = decompressors.iter().map(|d| Some(*d)).chain([None]);
        for (i, decompressor) in candidates.enumerate() {
            if self.attempt(old, new, diff, decompressor) {
                return Ok(Verification {
                    decompressor: decompressor.map(|d| d.codec()),
                    attempts: i + 1,
                });
            }
        }
        Err(DeltaError::Exhausted {
            attempts: decompressors.len() + 1,
        })
    }

    /// Whether `diff` turns `old` into exactly `new`.
    pub fn verify(&self, old: &[u8], new: &[u8], diff: &[u8]) -> bool {
        self.try_verify(old, new, diff).is_ok()
    }

    /// One isolated attempt; errors and panics count as "no match".
    fn attempt(
        &self,
        old: &[u8],
        new: &[u8],
        diff: &[u8],
        decompressor: Option<&dyn Decompressor>,
    ) -> bool {
        let label = decompressor.map_or("none", |d| d.codec().name());
        match catch_unwind(AssertUnwindSafe(|| {
            self.engine.check(new, old, diff, decompressor)
        })) {
            Ok(Ok(matched)) => {
                debug!("verify[{label}]: matched={matched}");
                matched
            }
            Ok(Err(e)) => {
                debug!("verify[{label}]: {e}");
                false
            }
            Err(payload) => {
                warn!("verify[{label}]: engine panicked: {}", panic_message(payload.as_ref()));
                false
            }
        }
    }
}

/// Verify a diff with the built-in engine.
pub fn verify_delta(old: &[u8], new: &[u8], diff: &[u8]) -> bool {
    DeltaVerifier::new().verify(old, new, diff)
}

/// Like [`verify_delta`], but reports which candidate matched.
pub fn try_verify_delta(old: &[u8], new: &[u8], diff: &[u8]) -> Result<Verification, DeltaError> {
    DeltaVerifier::new().try_verify(old, new, diff)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
