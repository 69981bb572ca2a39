//! Fuzz target: telemetry frame decoding
//!
//! Drives arbitrary notification payloads through both wire encodings and
//! asserts that decoding never panics and that every crash frame yields a
//! usable event.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use impactguard::config::FrameEncoding;
use impactguard::link::frame::decode_impact;
use libfuzzer_sys::fuzz_target;

const MAX_FRAME_BYTES: usize = 512;

fuzz_target!(|data: &[u8]| {
    for encoding in [FrameEncoding::Base64, FrameEncoding::Raw] {
        if let Ok(Some(ev)) = decode_impact(data, encoding, MAX_FRAME_BYTES, Some("fuzz"), 0) {
            assert!(ev.crash_flag);
            assert!(!ev.device_id.is_empty(), "impact without a device id");
        }
    }
});
