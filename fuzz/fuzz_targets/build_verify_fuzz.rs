#![no_main]
use hdiffz::CodecId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // Control bytes: codec, block size, split point.
    let codec = CodecId::from_raw_lossy(i32::from(data[0] & 0x03));
    let block_size = usize::from(data[1] & 0x3F);
    let payload = &data[3..];
    let split = usize::from(data[2]) * payload.len() / 256;
    let (old, new) = payload.split_at(split);

    let diff = hdiffz::try_build_delta(old, new, codec, block_size, 1)
        .expect("construction must succeed on any input");
    assert!(
        hdiffz::verify_delta(old, new, diff.as_bytes()),
        "diff does not verify"
    );
});
