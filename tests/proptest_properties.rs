use hdiffz::codec::{self, CodecId};
use hdiffz::{DEFAULT_MATCH_BLOCK_SIZE, build_delta, try_verify_delta, verify_delta};
use proptest::prelude::*;

fn codec_strategy() -> impl Strategy<Value = CodecId> {
    let ids: Vec<CodecId> = std::iter::once(CodecId::None)
        .chain(codec::compiled_codecs())
        .collect();
    proptest::sample::select(ids)
}

proptest! {
    #[test]
    fn prop_build_verify_roundtrip(
        old in proptest::collection::vec(any::<u8>(), 0..4096),
        new in proptest::collection::vec(any::<u8>(), 0..4096),
        codec in codec_strategy(),
        block_size in 0usize..96,
        threads in 0usize..4,
    ) {
        let diff = build_delta(&old, &new, codec, block_size, threads).unwrap();
        prop_assert!(verify_delta(&old, &new, diff.as_bytes()));
    }

    #[test]
    fn prop_edited_copy_roundtrip(
        old in proptest::collection::vec(any::<u8>(), 1024..8192),
        edits in proptest::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 0..4),
        codec in codec_strategy(),
    ) {
        let mut new = old.clone();
        for (at, byte) in &edits {
            let i = at.index(new.len());
            new[i] = *byte;
        }
        let diff = build_delta(&old, &new, codec, 16, 1).unwrap();
        prop_assert!(verify_delta(&old, &new, diff.as_bytes()));
        // Mostly copies: the diff stays far below the new size.
        prop_assert!(diff.len() <= new.len() / 2 + 64, "diff={} new={}", diff.len(), new.len());
    }

    #[test]
    fn prop_identity_always_verifies(
        x in proptest::collection::vec(any::<u8>(), 0..8192),
    ) {
        let diff = build_delta(&x, &x, CodecId::None, 0, 0).unwrap();
        let v = try_verify_delta(&x, &x, diff.as_bytes()).unwrap();
        prop_assert_eq!(v.decompressor, None);
    }

    #[test]
    fn prop_zero_parameters_normalize(
        old in proptest::collection::vec(any::<u8>(), 0..2048),
        new in proptest::collection::vec(any::<u8>(), 0..2048),
        codec in codec_strategy(),
    ) {
        let a = build_delta(&old, &new, codec, 0, 0).unwrap();
        let b = build_delta(&old, &new, codec, DEFAULT_MATCH_BLOCK_SIZE, 1).unwrap();
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn prop_changed_new_fails(
        old in proptest::collection::vec(any::<u8>(), 0..2048),
        new in proptest::collection::vec(any::<u8>(), 1..2048),
        at in any::<prop::sample::Index>(),
        codec in codec_strategy(),
    ) {
        let diff = build_delta(&old, &new, codec, 8, 1).unwrap();
        let mut other = new.clone();
        let i = at.index(other.len());
        other[i] = other[i].wrapping_add(1);
        prop_assert!(!verify_delta(&old, &other, diff.as_bytes()));
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(
        old in proptest::collection::vec(any::<u8>(), 0..256),
        new in proptest::collection::vec(any::<u8>(), 0..256),
        mut diff in proptest::collection::vec(any::<u8>(), 0..512),
        with_magic in any::<bool>(),
    ) {
        if with_magic && diff.len() >= 4 {
            diff[..4].copy_from_slice(b"HDZ\x01");
        }
        let _ = verify_delta(&old, &new, &diff);
    }
}
