use std::fmt::Write as _;

use serde::Serialize;
use wire::{decode_frame, DecodeError, FrameType, ProtocolVariant};

/// Bytes of payload shown in reports.
pub const PREVIEW_LEN: usize = 16;

/// Decoded view of one captured frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub protocol: ProtocolVariant,
    pub frame_bytes: usize,
    pub sync_word: u16,
    /// Decoded callsign, or the raw id in hex if it does not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    pub frame_type: &'static str,
    pub sequence: u16,
    /// Length declared in the header.
    pub payload_len: u16,
    /// Payload bytes actually present.
    pub payload_bytes: usize,
    pub truncated: bool,
    /// Bytes following the declared payload.
    pub trailing_bytes: usize,
    pub preview: String,
    /// Payload as text, for control and text frames that are valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Decodes `bytes` as a single frame of `protocol`.
pub fn inspect_frame(bytes: &[u8], protocol: ProtocolVariant) -> Result<InspectReport, DecodeError> {
    let frame = decode_frame(protocol, bytes)?;
    let header = frame.header;
    let consumed = protocol.header_size() + frame.payload.len();
    let text = match header.frame_type {
        FrameType::Control | FrameType::Text => std::str::from_utf8(frame.payload)
            .ok()
            .map(str::to_string),
        FrameType::Audio | FrameType::Data => None,
    };

    Ok(InspectReport {
        protocol,
        frame_bytes: bytes.len(),
        sync_word: header.sync_word,
        station: header.station_id.map(|id| id.to_string()),
        frame_type: frame_type_name(header.frame_type),
        sequence: header.sequence,
        payload_len: header.payload_len,
        payload_bytes: frame.payload.len(),
        truncated: frame.is_truncated(),
        trailing_bytes: bytes.len().saturating_sub(consumed),
        preview: hex_preview(frame.payload),
        text,
    })
}

#[must_use]
pub const fn frame_type_name(frame_type: FrameType) -> &'static str {
    match frame_type {
        FrameType::Audio => "audio",
        FrameType::Text => "text",
        FrameType::Control => "control",
        FrameType::Data => "data",
    }
}

fn hex_preview(payload: &[u8]) -> String {
    let mut out = String::with_capacity(PREVIEW_LEN * 3 + 3);
    for (idx, byte) in payload.iter().take(PREVIEW_LEN).enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    if payload.len() > PREVIEW_LEN {
        out.push_str(" ..");
    }
    out
}

/// Human-readable multi-line rendering of a report.
#[must_use]
pub fn format_inspect_pretty(report: &InspectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "protocol: {} sync: 0x{:04x} frame: {} bytes",
        report.protocol, report.sync_word, report.frame_bytes
    );
    if let Some(station) = &report.station {
        let _ = writeln!(out, "station: {station}");
    }
    let _ = writeln!(
        out,
        "type: {} sequence: {} payload_len: {}",
        report.frame_type, report.sequence, report.payload_len
    );
    if report.truncated {
        let _ = writeln!(
            out,
            "truncated: {} of {} payload bytes present",
            report.payload_bytes, report.payload_len
        );
    }
    if report.trailing_bytes > 0 {
        let _ = writeln!(out, "trailing: {} bytes", report.trailing_bytes);
    }
    match &report.text {
        Some(text) => {
            let _ = write!(out, "payload: {text:?}");
        }
        None => {
            let _ = write!(out, "payload: [{}]", report.preview);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::{FrameCodec, StationId, PTT_START};

    fn codec() -> FrameCodec {
        FrameCodec::current(StationId::from_callsign("W1AW").unwrap())
    }

    #[test]
    fn inspect_control_frame() {
        let bytes = codec().create_control_frame(PTT_START);
        let report = inspect_frame(&bytes, ProtocolVariant::Current).unwrap();
        assert_eq!(report.frame_type, "control");
        assert_eq!(report.sequence, 1);
        assert_eq!(report.station.as_deref(), Some("W1AW"));
        assert_eq!(report.text.as_deref(), Some("PTT_START"));
        assert_eq!(report.payload_len, 9);
        assert!(!report.truncated);
        assert_eq!(report.trailing_bytes, 0);
    }

    #[test]
    fn inspect_truncated_audio() {
        let bytes = codec().create_audio_frame(&[0xAB; 40]);
        let report = inspect_frame(&bytes[..30], ProtocolVariant::Current).unwrap();
        assert_eq!(report.frame_type, "audio");
        assert!(report.truncated);
        assert_eq!(report.payload_bytes, 16);
        assert_eq!(report.preview.split(' ').count(), 16);
        assert!(report.text.is_none());
    }

    #[test]
    fn inspect_reports_trailing_bytes() {
        let mut bytes = FrameCodec::legacy().create_data_frame(b"abc");
        bytes.extend_from_slice(&[0; 5]);
        let report = inspect_frame(&bytes, ProtocolVariant::Legacy).unwrap();
        assert_eq!(report.trailing_bytes, 5);
        assert!(report.station.is_none());
    }

    #[test]
    fn inspect_rejects_wrong_variant() {
        let bytes = FrameCodec::legacy().create_audio_frame(&[1; 10]);
        let err = inspect_frame(&bytes, ProtocolVariant::Current).unwrap_err();
        assert!(matches!(err, DecodeError::SyncMismatch { .. }));
    }

    #[test]
    fn preview_is_bounded() {
        assert_eq!(hex_preview(&[]), "");
        assert_eq!(hex_preview(&[0x01, 0xff]), "01 ff");
        assert!(hex_preview(&[0; 40]).ends_with(" .."));
    }

    #[test]
    fn pretty_output_mentions_fields() {
        let bytes = codec().create_audio_frame(&[0x10; 80]);
        let report = inspect_frame(&bytes, ProtocolVariant::Current).unwrap();
        let pretty = format_inspect_pretty(&report);
        assert!(pretty.contains("protocol: current"));
        assert!(pretty.contains("station: W1AW"));
        assert!(pretty.contains("type: audio sequence: 1 payload_len: 80"));
        assert!(pretty.contains("10 10 10"));
    }

    #[test]
    fn json_output_shape() {
        let bytes = codec().create_text_frame(b"hello");
        let report = inspect_frame(&bytes, ProtocolVariant::Current).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["protocol"], "current");
        assert_eq!(json["frame_type"], "text");
        assert_eq!(json["text"], "hello");
    }
}
