//! Frame header layouts, frame types and station identifiers.

use std::fmt;

/// Leading 2-byte magic of the legacy 8-byte header.
pub const LEGACY_MAGIC: u16 = 0xFF5D;

/// Stream sync word of the current 14-byte header.
pub const STREAM_SYNC_WORD: u16 = 0x02B8;

/// Legacy header size in bytes: magic(2) + type(1) + seq(2) + len(2) + reserved(1).
pub const LEGACY_HEADER_SIZE: usize = 2 + 1 + 2 + 2 + 1;

/// Current header size in bytes: sync(2) + station(6) + type(1) + seq(2) + len(2) + reserved(1).
pub const HEADER_SIZE: usize = 2 + StationId::LEN + 1 + 2 + 2 + 1;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Control payload sent when the PTT is pressed.
pub const PTT_START: &[u8] = b"PTT_START";

/// Control payload sent when the PTT is released.
pub const PTT_STOP: &[u8] = b"PTT_STOP";

/// Header layout, chosen once per codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ProtocolVariant {
    /// 8-byte header with a 2-byte magic and no station id.
    Legacy,
    /// 14-byte header with a stream sync word and a 6-byte station id.
    #[default]
    Current,
}

impl ProtocolVariant {
    /// Returns the fixed header size for this layout.
    #[must_use]
    pub const fn header_size(self) -> usize {
        match self {
            Self::Legacy => LEGACY_HEADER_SIZE,
            Self::Current => HEADER_SIZE,
        }
    }

    /// Returns the marker expected in the first two bytes of every frame.
    #[must_use]
    pub const fn sync_word(self) -> u16 {
        match self {
            Self::Legacy => LEGACY_MAGIC,
            Self::Current => STREAM_SYNC_WORD,
        }
    }

    /// Returns `true` if the layout carries a station id.
    #[must_use]
    pub const fn has_station_id(self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Frame type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[repr(u8)]
pub enum FrameType {
    Audio = 0x01,
    Text = 0x02,
    Control = 0x03,
    Data = 0x04,
}

impl FrameType {
    /// Parses a frame type from its wire byte.
    #[must_use]
    pub const fn parse(raw: u8) -> Option<Self> {
        match raw {
            0x01 => Some(Self::Audio),
            0x02 => Some(Self::Text),
            0x03 => Some(Self::Control),
            0x04 => Some(Self::Data),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Errors from building a [`StationId`] out of a callsign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallsignError {
    Empty,
    TooLong { len: usize },
    InvalidChar { ch: char },
}

impl fmt::Display for CallsignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "callsign is empty"),
            Self::TooLong { len } => {
                write!(
                    f,
                    "callsign too long: {len} characters, at most {}",
                    StationId::MAX_CALLSIGN_LEN
                )
            }
            Self::InvalidChar { ch } => write!(f, "callsign contains invalid character {ch:?}"),
        }
    }
}

impl std::error::Error for CallsignError {}

const BASE40_ALPHABET: &[u8; 40] = b" ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-/.";

/// 6-byte station identifier carried by current-variant frames.
///
/// Callsigns are packed base-40 (first character least significant) into a
/// 48-bit big-endian value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StationId([u8; StationId::LEN]);

impl StationId {
    /// Encoded length in bytes.
    pub const LEN: usize = 6;

    /// Longest callsign that fits in 48 bits of base-40.
    pub const MAX_CALLSIGN_LEN: usize = 9;

    /// Creates a station id from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Packs a callsign. Lowercase letters are folded to uppercase.
    pub fn from_callsign(callsign: &str) -> Result<Self, CallsignError> {
        let len = callsign.chars().count();
        if len == 0 {
            return Err(CallsignError::Empty);
        }
        if len > Self::MAX_CALLSIGN_LEN {
            return Err(CallsignError::TooLong { len });
        }

        let mut value = 0u64;
        for ch in callsign.chars().rev() {
            let upper = ch.to_ascii_uppercase();
            let index = BASE40_ALPHABET
                .iter()
                .skip(1)
                .position(|&c| char::from(c) == upper)
                .ok_or(CallsignError::InvalidChar { ch })?;
            value = value * 40 + index as u64 + 1;
        }

        let bytes = value.to_be_bytes();
        let mut out = [0u8; Self::LEN];
        out.copy_from_slice(&bytes[8 - Self::LEN..]);
        Ok(Self(out))
    }

    /// Unpacks the callsign, or `None` if the bytes are not valid base-40.
    #[must_use]
    pub fn to_callsign(&self) -> Option<String> {
        let mut bytes = [0u8; 8];
        bytes[8 - Self::LEN..].copy_from_slice(&self.0);
        let mut value = u64::from_be_bytes(bytes);
        if value == 0 || value >= 40u64.pow(Self::MAX_CALLSIGN_LEN as u32) {
            return None;
        }

        let mut callsign = String::with_capacity(Self::MAX_CALLSIGN_LEN);
        while value > 0 {
            let index = (value % 40) as usize;
            if index == 0 {
                // padding inside the value is not something from_callsign produces
                return None;
            }
            callsign.push(char::from(BASE40_ALPHABET[index]));
            value /= 40;
        }
        Some(callsign)
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({self})")
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_callsign() {
            Some(callsign) => write!(f, "{callsign}"),
            None => {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Decoded frame header.
///
/// `station_id` is `None` for legacy frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sync_word: u16,
    pub station_id: Option<StationId>,
    pub frame_type: FrameType,
    pub sequence: u16,
    pub payload_len: u16,
}

impl FrameHeader {
    /// Returns the layout this header was decoded from or will be encoded as.
    #[must_use]
    pub const fn variant(&self) -> ProtocolVariant {
        if self.station_id.is_some() {
            ProtocolVariant::Current
        } else {
            ProtocolVariant::Legacy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes() {
        assert_eq!(LEGACY_HEADER_SIZE, 8);
        assert_eq!(HEADER_SIZE, 14);
        assert_eq!(ProtocolVariant::Legacy.header_size(), 8);
        assert_eq!(ProtocolVariant::Current.header_size(), 14);
    }

    #[test]
    fn variants_use_distinct_markers() {
        assert_ne!(
            ProtocolVariant::Legacy.sync_word(),
            ProtocolVariant::Current.sync_word()
        );
        assert!(!ProtocolVariant::Legacy.has_station_id());
        assert!(ProtocolVariant::Current.has_station_id());
    }

    #[test]
    fn default_variant_is_current() {
        assert_eq!(ProtocolVariant::default(), ProtocolVariant::Current);
    }

    #[test]
    fn frame_type_wire_values() {
        assert_eq!(FrameType::Audio.raw(), 0x01);
        assert_eq!(FrameType::Text.raw(), 0x02);
        assert_eq!(FrameType::Control.raw(), 0x03);
        assert_eq!(FrameType::Data.raw(), 0x04);
    }

    #[test]
    fn frame_type_parse() {
        for ty in [
            FrameType::Audio,
            FrameType::Text,
            FrameType::Control,
            FrameType::Data,
        ] {
            assert_eq!(FrameType::parse(ty.raw()), Some(ty));
        }
        assert_eq!(FrameType::parse(0x00), None);
        assert_eq!(FrameType::parse(0x05), None);
        assert_eq!(FrameType::parse(0xFF), None);
    }

    #[test]
    fn callsign_roundtrip() {
        let id = StationId::from_callsign("W1AW").unwrap();
        assert_eq!(id.to_callsign().as_deref(), Some("W1AW"));
        assert_eq!(id.to_string(), "W1AW");
    }

    #[test]
    fn callsign_lowercase_folds() {
        let lower = StationId::from_callsign("kb5mu").unwrap();
        let upper = StationId::from_callsign("KB5MU").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn callsign_with_suffix() {
        let id = StationId::from_callsign("VE3ABC/P").unwrap();
        assert_eq!(id.to_callsign().as_deref(), Some("VE3ABC/P"));
    }

    #[test]
    fn callsign_max_length_fits() {
        let id = StationId::from_callsign(".........").unwrap();
        assert_eq!(id.to_callsign().as_deref(), Some("........."));
    }

    #[test]
    fn callsign_single_char_value() {
        // 'A' is alphabet index 1
        let id = StationId::from_callsign("A").unwrap();
        assert_eq!(id.as_bytes(), &[0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn callsign_errors() {
        assert_eq!(StationId::from_callsign(""), Err(CallsignError::Empty));
        assert_eq!(
            StationId::from_callsign("ABCDEFGHIJ"),
            Err(CallsignError::TooLong { len: 10 })
        );
        assert_eq!(
            StationId::from_callsign("W1 AW"),
            Err(CallsignError::InvalidChar { ch: ' ' })
        );
    }

    #[test]
    fn raw_station_id_displays_hex_when_not_base40() {
        let id = StationId::from_bytes([0xFF; 6]);
        assert_eq!(id.to_callsign(), None);
        assert_eq!(id.to_string(), "ffffffffffff");
    }

    #[test]
    fn header_variant_follows_station_id() {
        let header = FrameHeader {
            sync_word: LEGACY_MAGIC,
            station_id: None,
            frame_type: FrameType::Audio,
            sequence: 1,
            payload_len: 0,
        };
        assert_eq!(header.variant(), ProtocolVariant::Legacy);
        let header = FrameHeader {
            station_id: Some(StationId::default()),
            ..header
        };
        assert_eq!(header.variant(), ProtocolVariant::Current);
    }

    #[test]
    fn control_markers() {
        assert_eq!(PTT_START.len(), 9);
        assert_eq!(PTT_STOP, b"PTT_STOP");
    }
}
