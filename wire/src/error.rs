//! Error types for frame encoding and decoding.

use std::fmt;

/// Result type for frame decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Reasons a byte buffer is not a well-formed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Buffer is too small to contain the header for the selected variant.
    FrameTooSmall { actual: usize, required: usize },

    /// Leading sync word (or legacy magic) does not match.
    SyncMismatch { expected: u16, found: u16 },

    /// Frame type byte is not one of the defined frame types.
    UnknownFrameType { found: u8 },
}

/// Errors that can occur while encoding a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall { needed: usize, available: usize },
    PayloadTooLarge { length: usize },
    /// Current-variant header requested without a station id.
    MissingStationId,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooSmall { actual, required } => {
                write!(f, "frame too small: {actual} bytes, need at least {required}")
            }
            Self::SyncMismatch { expected, found } => {
                write!(
                    f,
                    "sync word mismatch: expected 0x{expected:04X}, found 0x{found:04X}"
                )
            }
            Self::UnknownFrameType { found } => {
                write!(f, "unknown frame type: 0x{found:02X}")
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small: need {needed}, have {available}")
            }
            Self::PayloadTooLarge { length } => {
                write!(f, "payload too large: {length} bytes exceeds 65535")
            }
            Self::MissingStationId => write!(f, "current header layout requires a station id"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}
