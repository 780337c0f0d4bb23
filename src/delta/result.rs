// Owned diff result and its null-safe accessors.

use std::fmt;
use std::ptr;

/// An owned, immutable diff produced by the builder.
///
/// Moving the value transfers ownership; dropping it releases the buffer.
pub struct DeltaResult {
    data: Vec<u8>,
}

impl DeltaResult {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for DeltaResult {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<DeltaResult> for Vec<u8> {
    fn from(result: DeltaResult) -> Self {
        result.data
    }
}

impl fmt::Debug for DeltaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaResult")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Pointer to the diff bytes, or null for an absent result.
///
/// The pointer is valid until the result is released.
pub fn result_data(result: Option<&DeltaResult>) -> *const u8 {
    result.map_or(ptr::null(), DeltaResult::as_ptr)
}

/// Diff size in bytes; 0 for an absent result.
pub fn result_size(result: Option<&DeltaResult>) -> usize {
    result.map_or(0, DeltaResult::len)
}

/// Release a result. Releasing an absent result does nothing.
pub fn result_release(result: Option<DeltaResult>) {
    drop(result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_on_absent_result() {
        assert!(result_data(None).is_null());
        assert_eq!(result_size(None), 0);
        result_release(None);
    }

    #[test]
    fn accessors_on_present_result() {
        let r = DeltaResult::new(vec![1, 2, 3]);
        assert_eq!(result_size(Some(&r)), 3);
        let p = result_data(Some(&r));
        assert!(!p.is_null());
        // SAFETY: `p` points at the 3 live bytes owned by `r`.
        let bytes = unsafe { std::slice::from_raw_parts(p, 3) };
        assert_eq!(bytes, &[1, 2, 3]);
        assert_eq!(format!("{r:?}"), "DeltaResult { len: 3 }");
        result_release(Some(r));
    }

    #[test]
    fn into_vec_hands_over_the_buffer() {
        let r = DeltaResult::new(b"abc".to_vec());
        assert_eq!(r.as_ref(), b"abc");
        assert!(!r.is_empty());
        let v: Vec<u8> = r.into();
        assert_eq!(v, b"abc");
    }

    #[test]
    fn result_is_move_only() {
        // Resolves only while `DeltaResult` has no `Clone` impl.
        trait AmbiguousIfClone<A> {
            fn check() {}
        }
        impl<T: ?Sized> AmbiguousIfClone<()> for T {}
        #[allow(dead_code)]
        struct IsClone;
        impl<T: ?Sized + Clone> AmbiguousIfClone<IsClone> for T {}
        <DeltaResult as AmbiguousIfClone<_>>::check();

        let r = DeltaResult::new(vec![9; 4]);
        let moved = r;
        assert_eq!(moved.len(), 4);
    }
}
