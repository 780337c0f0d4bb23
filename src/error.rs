// Error types for the diff engine and the delta boundary.
//
// The boundary itself only ever reports `None`/`false`; these types carry
// the reason so callers of the `try_*` functions (and the logs) can tell
// the failure modes apart.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::engine::varint::VarIntError;

/// Faults raised by the diff-construction and diff-verification engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed integer: {0}")]
    VarInt(#[from] VarIntError),

    #[error("corrupt diff: {0}")]
    Corrupt(String),

    /// The diff was compressed but no decompressor was supplied.
    #[error("diff is compressed with `{0}` but no decompressor was given")]
    MissingDecompressor(String),

    /// The supplied decompressor cannot open the diff's compression type.
    #[error("decompressor `{got}` cannot open `{expected}` sections")]
    DecompressorMismatch { expected: String, got: &'static str },

    #[error("{codec} decompression failed: {msg}")]
    Decompress { codec: &'static str, msg: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("input too large: {0}")]
    TooLarge(String),

    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Failures surfaced by the delta builder and verifier.
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to allocate result buffer: {0}")]
    Allocation(#[from] TryReserveError),

    /// The engine panicked; the payload message is preserved when it is a string.
    #[error("diff engine fault: {0}")]
    EngineFault(String),

    #[error("no candidate reproduced the new data ({attempts} attempts)")]
    Exhausted { attempts: usize },
}

impl DeltaError {
    /// Whether this error came from a caught engine panic.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::EngineFault(_))
    }
}

/// Render a `catch_unwind` payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_extracts_str_and_string() {
        let p: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(p.as_ref()), "bang");
        let p: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(p.as_ref()), "non-string panic payload");
    }

    #[test]
    fn engine_error_converts_into_delta_error() {
        let err: DeltaError = EngineError::Corrupt("bad cover".into()).into();
        assert!(matches!(err, DeltaError::Engine(EngineError::Corrupt(_))));
        assert_eq!(err.to_string(), "corrupt diff: bad cover");
        assert!(!err.is_fault());
        assert!(DeltaError::EngineFault("x".into()).is_fault());
    }
}
