use hdiffz::codec::{self, CodecId};
use hdiffz::{
    BuildParameters, DEFAULT_MATCH_BLOCK_SIZE, DeltaBuilder, DeltaError, DeltaVerifier,
    build_delta, result_data, result_release, result_size, try_build_delta, try_verify_delta,
    verify_delta,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = vec![0u8; len];
    rng.fill(&mut out[..]);
    out
}

/// `base` with a few edits: flipped bytes, an insertion and a deletion.
fn edited(base: &[u8], seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = base.to_vec();
    for _ in 0..8 {
        let i = rng.random_range(0..out.len());
        out[i] ^= 0x5A;
    }
    let at = rng.random_range(0..out.len());
    out.splice(at..at, b"inserted run of bytes".iter().copied());
    let at = rng.random_range(0..out.len() - 100);
    out.drain(at..at + 100);
    out
}

fn all_codecs() -> impl Iterator<Item = CodecId> {
    std::iter::once(CodecId::None).chain(codec::compiled_codecs())
}

#[test]
fn concrete_scenario() {
    let old = b"AAAABBBBCCCC";
    let new = b"AAAABBBBCCCCDDDD";
    let result = build_delta(old, new, CodecId::Zstd, 4, 1).unwrap();
    assert!(!result.is_empty());
    assert!(verify_delta(old, new, result.as_bytes()));
    assert!(!verify_delta(old, b"AAAABBBBCCCCXXXX", result.as_bytes()));
}

#[test]
fn roundtrip_every_codec() {
    let old = random_bytes(200_000, 1);
    let new = edited(&old, 2);
    for codec in all_codecs() {
        let diff = build_delta(&old, &new, codec, 0, 0).unwrap();
        assert!(verify_delta(&old, &new, diff.as_bytes()), "codec {codec}");
        assert!(diff.len() < new.len() / 10, "codec {codec}: {} bytes", diff.len());
    }
}

#[test]
fn compressible_literals_shrink_with_a_codec() {
    let old = random_bytes(4096, 3);
    let new: Vec<u8> = b"brand new text, repeated. ".iter().copied().cycle().take(64 * 1024).collect();
    let plain = build_delta(&old, &new, CodecId::None, 0, 0).unwrap();
    for codec in codec::compiled_codecs() {
        let packed = build_delta(&old, &new, codec, 0, 0).unwrap();
        assert!(packed.len() < plain.len() / 4, "codec {codec}");
        let v = try_verify_delta(&old, &new, packed.as_bytes()).unwrap();
        assert_eq!(v.decompressor, Some(codec));
    }
}

#[test]
fn identity_diff_verifies() {
    let x = random_bytes(10_000, 4);
    let diff = build_delta(&x, &x, CodecId::None, 0, 0).unwrap();
    assert!(verify_delta(&x, &x, diff.as_bytes()));
    assert!(diff.len() < 64);
}

#[test]
fn empty_buffers() {
    for codec in all_codecs() {
        let diff = build_delta(b"", b"", codec, 0, 0).unwrap();
        assert!(verify_delta(b"", b"", diff.as_bytes()));

        let diff = build_delta(b"", b"only new", codec, 0, 0).unwrap();
        assert!(verify_delta(b"", b"only new", diff.as_bytes()));

        let diff = build_delta(b"only old", b"", codec, 0, 0).unwrap();
        assert!(verify_delta(b"only old", b"", diff.as_bytes()));
        assert!(!verify_delta(b"only old", b"x", diff.as_bytes()));
    }
}

#[test]
fn zero_parameters_match_explicit_defaults() {
    let old = random_bytes(50_000, 5);
    let new = edited(&old, 6);
    for codec in all_codecs() {
        let implicit = build_delta(&old, &new, codec, 0, 0).unwrap();
        let explicit = build_delta(&old, &new, codec, DEFAULT_MATCH_BLOCK_SIZE, 1).unwrap();
        assert_eq!(implicit.as_bytes(), explicit.as_bytes(), "codec {codec}");
    }
}

#[test]
fn uncompressed_diff_falls_back_to_no_decompressor() {
    let old = random_bytes(20_000, 7);
    let new = edited(&old, 8);
    let diff = build_delta(&old, &new, CodecId::None, 0, 0).unwrap();
    let v = try_verify_delta(&old, &new, diff.as_bytes()).unwrap();
    assert_eq!(v.decompressor, None);
    assert_eq!(v.attempts, codec::available_decompressors().len() + 1);
}

#[test]
fn unknown_raw_codec_degrades_to_none() {
    let old = b"some old content that is long enough to matter";
    let new = b"some new content that is long enough to matter";
    let codec = CodecId::from_raw_lossy(77);
    assert_eq!(codec, CodecId::None);
    let lossy = build_delta(old, new, codec, 0, 0).unwrap();
    let none = build_delta(old, new, CodecId::None, 0, 0).unwrap();
    assert_eq!(lossy.as_bytes(), none.as_bytes());
}

#[test]
fn multithreaded_build_verifies() {
    let old = random_bytes(1 << 20, 9);
    let new = edited(&old, 10);
    for threads in [2, 4, 8] {
        let diff = build_delta(&old, &new, CodecId::Zlib, 0, threads).unwrap();
        assert!(verify_delta(&old, &new, diff.as_bytes()), "threads {threads}");
        assert!(diff.len() < new.len() / 20);
    }
}

#[test]
fn huge_thread_count_is_capped_by_the_work() {
    let old = random_bytes(200_000, 22);
    let new = edited(&old, 23);
    let started = std::time::Instant::now();
    let diff = build_delta(&old, &new, CodecId::None, 0, 10_000).unwrap();
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert!(verify_delta(&old, &new, diff.as_bytes()));
    let one = build_delta(&old, &new, CodecId::None, 0, 3).unwrap();
    assert_eq!(diff.as_bytes(), one.as_bytes());
}

#[test]
fn small_block_sizes_verify() {
    let old = random_bytes(8_000, 11);
    let new = edited(&old, 12);
    for block_size in [1, 2, 3, 7, 16, 1000, 1 << 20] {
        let diff = build_delta(&old, &new, CodecId::None, block_size, 1).unwrap();
        assert!(verify_delta(&old, &new, diff.as_bytes()), "block size {block_size}");
    }
}

#[test]
fn wrong_inputs_fail_verification() {
    let old = random_bytes(30_000, 13);
    let new = edited(&old, 14);
    let diff = build_delta(&old, &new, CodecId::Zlib, 0, 0).unwrap();

    let mut other_new = new.clone();
    other_new[500] ^= 1;
    assert!(!verify_delta(&old, &other_new, diff.as_bytes()));

    let mut other_old = old.clone();
    other_old[12_345] ^= 1;
    other_old[20_000] ^= 1;
    assert!(!verify_delta(&other_old, &new, diff.as_bytes()));

    assert!(!verify_delta(&new, &old, diff.as_bytes()));
}

#[test]
fn corrupted_diffs_never_verify() {
    let old = random_bytes(5_000, 15);
    let new = edited(&old, 16);
    let mut rng = StdRng::seed_from_u64(17);
    for codec in all_codecs() {
        let diff = build_delta(&old, &new, codec, 0, 0).unwrap().into_vec();

        for cut in (0..diff.len()).step_by(7) {
            assert!(!verify_delta(&old, &new, &diff[..cut]), "{codec} cut {cut}");
        }
        for _ in 0..200 {
            let mut bad = diff.clone();
            let i = rng.random_range(0..bad.len());
            let flip = rng.random_range(1..=255u8);
            bad[i] ^= flip;
            // Must not panic; a flip may at most leave the diff valid.
            let _ = verify_delta(&old, &new, &bad);
        }
    }
}

#[test]
fn random_bytes_are_not_a_diff() {
    for seed in 0..50 {
        let junk = random_bytes(seed as usize * 13, seed);
        assert!(!verify_delta(b"old", b"new", &junk));
    }
    let err = try_verify_delta(b"old", b"new", b"HDZ\x01").unwrap_err();
    assert!(matches!(err, DeltaError::Exhausted { .. }));
}

#[test]
fn result_accessors() {
    let result = build_delta(b"abc", b"abcd", CodecId::None, 0, 0);
    assert!(result_size(result.as_ref()) > 0);
    assert!(!result_data(result.as_ref()).is_null());
    result_release(result);

    assert!(result_data(None).is_null());
    assert_eq!(result_size(None), 0);
    result_release(None);
    result_release(None);
}

#[test]
fn builder_and_verifier_objects() {
    let builder = DeltaBuilder::new();
    let verifier = DeltaVerifier::new();
    let old = random_bytes(3_000, 18);
    let new = edited(&old, 19);
    let params = BuildParameters::new(CodecId::Lzma2, 32, 2);
    let diff = builder.try_build(&old, &new, params).unwrap();
    assert!(verifier.verify(&old, &new, diff.as_bytes()));
    assert!(try_build_delta(&old, &new, CodecId::Zstd, 0, 0).is_ok());
}

#[test]
fn concurrent_builds_and_verifies() {
    let old = random_bytes(100_000, 20);
    let new = edited(&old, 21);
    std::thread::scope(|s| {
        let handles: Vec<_> = all_codecs()
            .map(|codec| {
                let (old, new) = (&old, &new);
                s.spawn(move || {
                    let diff = build_delta(old, new, codec, 0, 2).unwrap();
                    verify_delta(old, new, diff.as_bytes())
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    });
}
