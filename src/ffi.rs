// C ABI over the delta boundary (see `include/hdiffz.h`).
//
// Every entry point catches panics; nothing unwinds into the caller.
// A result handle is a `Box<DeltaResult>` turned into a raw pointer.

use std::ffi::c_int;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::{ptr, slice};

use crate::codec::CodecId;
use crate::delta::{self, DeltaResult};

/// Opaque diff result handle; null means "no result".
pub type HdiffzResult = *mut DeltaResult;

/// Borrow a caller buffer. Null with length 0 is an empty slice; null with
/// any other length is rejected.
///
/// # Safety
/// A non-null `data` must point to `len` readable bytes that stay valid and
/// unmodified for `'a`.
unsafe fn borrow_input<'a>(data: *const u8, len: usize) -> Option<&'a [u8]> {
    if data.is_null() {
        return (len == 0).then_some(&[][..]);
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { slice::from_raw_parts(data, len) })
}

/// Build a compressed diff. Returns null on failure.
///
/// `match_block_size == 0` selects the default block size, `thread_num == 0`
/// selects one thread, and an unknown `compress_type` builds an uncompressed
/// diff.
///
/// # Safety
/// `old_data`/`new_data` must be null or point to `old_size`/`new_size`
/// readable bytes for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hdiffz_diff(
    old_data: *const u8,
    old_size: usize,
    new_data: *const u8,
    new_size: usize,
    compress_type: c_int,
    match_block_size: usize,
    thread_num: usize,
) -> HdiffzResult {
    // SAFETY: forwarded caller guarantees.
    let inputs = unsafe {
        (
            borrow_input(old_data, old_size),
            borrow_input(new_data, new_size),
        )
    };
    let (Some(old), Some(new)) = inputs else {
        return ptr::null_mut();
    };
    let codec = CodecId::from_raw_lossy(compress_type);

    catch_unwind(AssertUnwindSafe(|| {
        delta::build_delta(old, new, codec, match_block_size, thread_num)
    }))
    .ok()
    .flatten()
    .map_or(ptr::null_mut(), |result| Box::into_raw(Box::new(result)))
}

/// Pointer to the diff bytes, or null for a null handle.
///
/// # Safety
/// `result` must be null or a live handle from `hdiffz_diff`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hdiffz_result_data(result: HdiffzResult) -> *const u8 {
    // SAFETY: null or live per the caller contract.
    delta::result_data(unsafe { result.as_ref() })
}

/// Diff size in bytes, or 0 for a null handle.
///
/// # Safety
/// `result` must be null or a live handle from `hdiffz_diff`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hdiffz_result_size(result: HdiffzResult) -> usize {
    // SAFETY: null or live per the caller contract.
    delta::result_size(unsafe { result.as_ref() })
}

/// Release a handle. Null is a no-op.
///
/// # Safety
/// `result` must be null or a live handle from `hdiffz_diff`, and must not be
/// used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hdiffz_result_free(result: HdiffzResult) {
    if result.is_null() {
        return;
    }
    // SAFETY: produced by `Box::into_raw` in `hdiffz_diff`, released once.
    let owned = unsafe { Box::from_raw(result) };
    delta::result_release(Some(*owned));
}

/// 1 if `diff_data` turns `old_data` into exactly `new_data`, else 0.
///
/// # Safety
/// Each pointer must be null or point to its size in readable bytes for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hdiffz_check(
    old_data: *const u8,
    old_size: usize,
    new_data: *const u8,
    new_size: usize,
    diff_data: *const u8,
    diff_size: usize,
) -> c_int {
    // SAFETY: forwarded caller guarantees.
    let inputs = unsafe {
        (
            borrow_input(old_data, old_size),
            borrow_input(new_data, new_size),
            borrow_input(diff_data, diff_size),
        )
    };
    let (Some(old), Some(new), Some(diff)) = inputs else {
        return 0;
    };

    catch_unwind(AssertUnwindSafe(|| delta::verify_delta(old, new, diff))).unwrap_or(false) as c_int
}

/// 1 if `compress_type` is compiled into this library (NONE always is).
#[unsafe(no_mangle)]
pub extern "C" fn hdiffz_compress_type_available(compress_type: c_int) -> c_int {
    CodecId::from_raw(compress_type).is_some_and(CodecId::is_available) as c_int
}
