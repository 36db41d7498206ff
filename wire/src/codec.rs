//! Stateful frame builder owning the sequence counter.

use crate::frame::{clamp_payload, decode_frame, write_header_fields, Frame};
use crate::header::{FrameType, ProtocolVariant, StationId};

/// Builds and parses frames for one station in one header layout.
///
/// Every frame created, of any type, advances a single 16-bit sequence
/// counter by one (wrapping at 65535). The counter starts at zero, so the
/// first frame carries sequence 1.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    variant: ProtocolVariant,
    station_id: StationId,
    sequence: u16,
}

impl FrameCodec {
    /// Creates a codec for the given layout. `station_id` is only written by
    /// the current layout.
    #[must_use]
    pub const fn new(variant: ProtocolVariant, station_id: StationId) -> Self {
        Self {
            variant,
            station_id,
            sequence: 0,
        }
    }

    /// Creates a codec for the 8-byte legacy layout.
    #[must_use]
    pub fn legacy() -> Self {
        Self::new(ProtocolVariant::Legacy, StationId::default())
    }

    /// Creates a codec for the 14-byte current layout.
    #[must_use]
    pub const fn current(station_id: StationId) -> Self {
        Self::new(ProtocolVariant::Current, station_id)
    }

    #[must_use]
    pub const fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    #[must_use]
    pub const fn station_id(&self) -> StationId {
        self.station_id
    }

    #[must_use]
    pub const fn header_size(&self) -> usize {
        self.variant.header_size()
    }

    /// Sequence number of the most recently created frame (0 before any).
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Builds a frame of the given type around `payload`.
    ///
    /// Payloads longer than 65535 bytes are truncated to fit the length field.
    pub fn create_frame(&mut self, frame_type: FrameType, payload: &[u8]) -> Vec<u8> {
        self.sequence = self.sequence.wrapping_add(1);
        let payload = clamp_payload(payload);
        let size = self.header_size();

        let mut out = vec![0u8; size + payload.len()];
        let payload_len = u16::try_from(payload.len()).unwrap_or(u16::MAX);
        write_header_fields(
            &mut out[..size],
            self.variant,
            &self.station_id,
            frame_type,
            self.sequence,
            payload_len,
        );
        out[size..].copy_from_slice(payload);
        out
    }

    pub fn create_audio_frame(&mut self, payload: &[u8]) -> Vec<u8> {
        self.create_frame(FrameType::Audio, payload)
    }

    pub fn create_control_frame(&mut self, payload: &[u8]) -> Vec<u8> {
        self.create_frame(FrameType::Control, payload)
    }

    pub fn create_text_frame(&mut self, payload: &[u8]) -> Vec<u8> {
        self.create_frame(FrameType::Text, payload)
    }

    pub fn create_data_frame(&mut self, payload: &[u8]) -> Vec<u8> {
        self.create_frame(FrameType::Data, payload)
    }

    /// Parses a frame in this codec's layout. Any malformation yields `None`.
    #[must_use]
    pub fn parse_frame<'a>(&self, data: &'a [u8]) -> Option<Frame<'a>> {
        decode_frame(self.variant, data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HEADER_SIZE, MAX_PAYLOAD_LEN, PTT_START, STREAM_SYNC_WORD};

    fn station() -> StationId {
        StationId::from_callsign("KB5MU").unwrap()
    }

    #[test]
    fn counter_starts_at_zero() {
        let codec = FrameCodec::current(station());
        assert_eq!(codec.sequence(), 0);
    }

    #[test]
    fn ptt_start_control_frame_bytes() {
        let mut codec = FrameCodec::current(station());
        let bytes = codec.create_control_frame(PTT_START);

        assert_eq!(bytes.len(), HEADER_SIZE + 9);
        assert_eq!(&bytes[0..2], &STREAM_SYNC_WORD.to_be_bytes());
        assert_eq!(&bytes[2..8], station().as_bytes());
        assert_eq!(bytes[8], 0x03);
        assert_eq!(&bytes[9..11], &[0x00, 0x01]);
        assert_eq!(&bytes[11..13], &[0x00, 0x09]);
        assert_eq!(bytes[13], 0x00);
        assert_eq!(&bytes[14..], b"PTT_START");

        let frame = codec.parse_frame(&bytes).unwrap();
        assert_eq!(frame.frame_type(), FrameType::Control);
        assert_eq!(frame.sequence(), 1);
        assert_eq!(frame.payload, b"PTT_START");
    }

    #[test]
    fn audio_and_control_share_counter() {
        let mut codec = FrameCodec::legacy();
        let a = codec.create_control_frame(b"PTT_START");
        let b = codec.create_audio_frame(&[1, 2, 3]);
        let c = codec.create_text_frame(b"hi");
        let d = codec.create_data_frame(&[9]);

        let seqs: Vec<u16> = [&a, &b, &c, &d]
            .iter()
            .map(|bytes| codec.parse_frame(bytes).unwrap().sequence())
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 4]);
        assert_eq!(codec.sequence(), 4);
    }

    #[test]
    fn frame_types_are_written() {
        let mut codec = FrameCodec::legacy();
        let cases = [
            (codec.create_audio_frame(b"a"), FrameType::Audio),
            (codec.create_text_frame(b"t"), FrameType::Text),
            (codec.create_control_frame(b"c"), FrameType::Control),
            (codec.create_data_frame(b"d"), FrameType::Data),
        ];
        for (bytes, ty) in &cases {
            assert_eq!(codec.parse_frame(bytes).unwrap().frame_type(), *ty);
        }
    }

    #[test]
    fn counter_wraps_to_zero() {
        let mut codec = FrameCodec::legacy();
        for _ in 0..u16::MAX {
            codec.create_audio_frame(&[]);
        }
        assert_eq!(codec.sequence(), 65535);
        let bytes = codec.create_audio_frame(&[]);
        assert_eq!(codec.sequence(), 0);
        assert_eq!(codec.parse_frame(&bytes).unwrap().sequence(), 0);
        codec.create_audio_frame(&[]);
        assert_eq!(codec.sequence(), 1);
    }

    #[test]
    fn legacy_frames_have_no_station() {
        let mut codec = FrameCodec::legacy();
        let bytes = codec.create_audio_frame(b"opus");
        assert_eq!(bytes.len(), 8 + 4);
        let frame = codec.parse_frame(&bytes).unwrap();
        assert_eq!(frame.header.station_id, None);
    }

    #[test]
    fn oversized_payload_is_truncated_and_counted() {
        let mut codec = FrameCodec::legacy();
        let payload = vec![0x55u8; MAX_PAYLOAD_LEN + 100];
        let bytes = codec.create_data_frame(&payload);
        assert_eq!(bytes.len(), 8 + MAX_PAYLOAD_LEN);
        let frame = codec.parse_frame(&bytes).unwrap();
        assert_eq!(usize::from(frame.header.payload_len), MAX_PAYLOAD_LEN);
        assert_eq!(codec.sequence(), 1);
    }

    #[test]
    fn parse_returns_none_for_garbage() {
        let codec = FrameCodec::current(station());
        assert!(codec.parse_frame(&[]).is_none());
        assert!(codec.parse_frame(&[0u8; 13]).is_none());
        assert!(codec.parse_frame(&[0u8; 64]).is_none());
    }

    #[test]
    fn parse_does_not_advance_counter() {
        let mut codec = FrameCodec::current(station());
        let bytes = codec.create_audio_frame(b"x");
        let _ = codec.parse_frame(&bytes);
        assert_eq!(codec.sequence(), 1);
    }
}
