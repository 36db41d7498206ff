#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_frame, FrameCodec, ProtocolVariant, StationId};

fuzz_target!(|data: &[u8]| {
    let legacy = FrameCodec::legacy();
    let current = FrameCodec::current(StationId::from_bytes([0, 0, 0, 0, 0x4b, 0x01]));

    for (codec, variant) in [
        (&legacy, ProtocolVariant::Legacy),
        (&current, ProtocolVariant::Current),
    ] {
        let parsed = codec.parse_frame(data);
        let decoded = decode_frame(variant, data).ok();
        assert_eq!(parsed, decoded);

        if let Some(frame) = parsed {
            assert!(frame.payload.len() <= usize::from(frame.header.payload_len));
            assert!(variant.header_size() + frame.payload.len() <= data.len());
            assert_eq!(frame.header.station_id.is_some(), variant.has_station_id());
        }
    }
});
