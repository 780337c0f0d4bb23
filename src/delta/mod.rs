// The delta-construction and verification boundary.
//
// - `builder`: normalize parameters, pick the compressor, run the engine
// - `verifier`: try every decompressor, then none
// - `result`: owned diff bytes and null-safe accessors
//
// Nothing below this module lets an engine error or panic escape: the
// `build`/`verify` entry points report failure as `None`/`false`, and the
// `try_*` variants return a `DeltaError` instead.

pub mod builder;
pub mod result;
pub mod verifier;

pub use builder::{BuildParameters, DeltaBuilder, build_delta, try_build_delta};
pub use result::{DeltaResult, result_data, result_release, result_size};
pub use verifier::{DeltaVerifier, Verification, try_verify_delta, verify_delta};
