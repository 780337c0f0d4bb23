#![no_main]
use hdiffz::codec::available_decompressors;
use hdiffz::engine::check::check_compressed_diff;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First two bytes split the rest into old / new / diff.
    let payload = &data[2..];
    let a = usize::from(data[0]) % (payload.len() + 1);
    let b = (a + usize::from(data[1])).min(payload.len());
    let (old, rest) = payload.split_at(a);
    let (new, diff) = rest.split_at(b - a);

    // The engine itself must never panic on untrusted diffs.
    let _ = check_compressed_diff(new, old, diff, None);
    for d in available_decompressors() {
        let _ = check_compressed_diff(new, old, diff, Some(*d));
    }
    let _ = hdiffz::verify_delta(old, new, diff);
});
