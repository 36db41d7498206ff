//! Frame encoding and decoding for both header layouts.

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::header::{FrameHeader, FrameType, ProtocolVariant, StationId, MAX_PAYLOAD_LEN};

/// A decoded frame borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub header: FrameHeader,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    #[must_use]
    pub const fn frame_type(&self) -> FrameType {
        self.header.frame_type
    }

    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.header.sequence
    }

    /// Returns `true` if fewer payload bytes were present than the header declared.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.payload.len() < self.header.payload_len as usize
    }
}

/// Encodes a header in the given layout into `out`.
///
/// The sync word written is always the variant's marker; `header.sync_word`
/// is ignored. Legacy headers ignore `header.station_id`.
pub fn encode_header(
    variant: ProtocolVariant,
    header: &FrameHeader,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let size = variant.header_size();
    if out.len() < size {
        return Err(EncodeError::BufferTooSmall {
            needed: size,
            available: out.len(),
        });
    }

    let station = match (variant.has_station_id(), header.station_id) {
        (true, None) => return Err(EncodeError::MissingStationId),
        (_, station) => station.unwrap_or_default(),
    };
    write_header_fields(
        &mut out[..size],
        variant,
        &station,
        header.frame_type,
        header.sequence,
        header.payload_len,
    );

    Ok(size)
}

/// Writes header fields into `out`, which must be exactly one header long.
pub(crate) fn write_header_fields(
    out: &mut [u8],
    variant: ProtocolVariant,
    station_id: &StationId,
    frame_type: FrameType,
    sequence: u16,
    payload_len: u16,
) {
    out[0..2].copy_from_slice(&variant.sync_word().to_be_bytes());
    let mut offset = 2;
    if variant.has_station_id() {
        out[offset..offset + StationId::LEN].copy_from_slice(station_id.as_bytes());
        offset += StationId::LEN;
    }
    out[offset] = frame_type.raw();
    out[offset + 1..offset + 3].copy_from_slice(&sequence.to_be_bytes());
    out[offset + 3..offset + 5].copy_from_slice(&payload_len.to_be_bytes());
    out[offset + 5] = 0;
}

/// Encodes a full frame (header followed by payload) into a new buffer.
pub fn encode_frame(
    variant: ProtocolVariant,
    station_id: Option<StationId>,
    frame_type: FrameType,
    sequence: u16,
    payload: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    let payload_len = u16::try_from(payload.len())
        .map_err(|_| EncodeError::PayloadTooLarge {
            length: payload.len(),
        })?;
    let header = FrameHeader {
        sync_word: variant.sync_word(),
        station_id,
        frame_type,
        sequence,
        payload_len,
    };

    let size = variant.header_size();
    let mut out = vec![0u8; size + payload.len()];
    encode_header(variant, &header, &mut out[..size])?;
    out[size..].copy_from_slice(payload);
    Ok(out)
}

/// Decodes a frame in the given layout.
///
/// The declared payload length is only used for slicing: a frame that claims
/// more bytes than are present yields the bytes that are present, and
/// trailing bytes beyond the declared length are ignored. The reserved byte
/// is not inspected.
pub fn decode_frame(variant: ProtocolVariant, buf: &[u8]) -> WireResult<Frame<'_>> {
    let size = variant.header_size();
    if buf.len() < size {
        return Err(DecodeError::FrameTooSmall {
            actual: buf.len(),
            required: size,
        });
    }

    let sync_word = read_u16(buf, 0);
    if sync_word != variant.sync_word() {
        return Err(DecodeError::SyncMismatch {
            expected: variant.sync_word(),
            found: sync_word,
        });
    }

    let mut offset = 2;
    let station_id = if variant.has_station_id() {
        let mut bytes = [0u8; StationId::LEN];
        bytes.copy_from_slice(&buf[offset..offset + StationId::LEN]);
        offset += StationId::LEN;
        Some(StationId::from_bytes(bytes))
    } else {
        None
    };

    let raw_type = buf[offset];
    let frame_type =
        FrameType::parse(raw_type).ok_or(DecodeError::UnknownFrameType { found: raw_type })?;
    let sequence = read_u16(buf, offset + 1);
    let payload_len = read_u16(buf, offset + 3);

    let available = &buf[size..];
    let payload = &available[..available.len().min(usize::from(payload_len))];

    Ok(Frame {
        header: FrameHeader {
            sync_word,
            station_id,
            frame_type,
            sequence,
            payload_len,
        },
        payload,
    })
}

/// Clamps a payload to what the 16-bit length field can describe.
pub(crate) fn clamp_payload(payload: &[u8]) -> &[u8] {
    &payload[..payload.len().min(MAX_PAYLOAD_LEN)]
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}
