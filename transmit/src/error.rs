//! Error types for the transmit pipeline.
//!
//! Only [`ConfigError`] ever leaves the pipeline. The per-buffer and
//! per-frame errors are counted in the statistics and logged.

use std::fmt;
use std::io;

use wire::CallsignError;

/// Fatal startup failures: bad configuration or a collaborator that could
/// not be initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    UnsupportedSampleRate { found: u32 },
    UnsupportedFrameDuration { found_ms: u32 },
    UnsupportedChannels { found: u16 },
    BitrateOutOfRange { found: u32, min: u32, max: u32 },
    InvalidCallsign(CallsignError),
    InvalidTarget { target: String, reason: String },
    /// Configuration file could not be parsed.
    Parse { reason: String },
    /// Audio codec could not be created with the requested settings.
    Encoder { reason: String },
    /// Audio capture backend failed to start.
    Capture { reason: String },
    /// Datagram socket could not be opened.
    Transport { reason: String },
}

/// Why an audio buffer was rejected before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    WrongLength { expected: usize, actual: usize },
    /// Every byte is zero: silence or a stuck input, indistinguishable.
    AllZero,
}

/// Codec failure on a single buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    Codec { reason: String },
    /// The codec panicked; the buffer was dropped.
    Panicked,
}

/// Datagram send failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitError {
    /// Sender was never given a transport, or has been closed.
    NotConnected,
    Io { kind: io::ErrorKind, message: String },
}

impl From<io::Error> for TransmitError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<CallsignError> for ConfigError {
    fn from(err: CallsignError) -> Self {
        Self::InvalidCallsign(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSampleRate { found } => {
                write!(f, "unsupported sample rate: {found} Hz")
            }
            Self::UnsupportedFrameDuration { found_ms } => {
                write!(f, "unsupported frame duration: {found_ms} ms")
            }
            Self::UnsupportedChannels { found } => {
                write!(f, "unsupported channel count: {found}")
            }
            Self::BitrateOutOfRange { found, min, max } => {
                write!(f, "bitrate {found} bps outside {min}..={max}")
            }
            Self::InvalidCallsign(err) => write!(f, "invalid station callsign: {err}"),
            Self::InvalidTarget { target, reason } => {
                write!(f, "invalid target {target}: {reason}")
            }
            Self::Parse { reason } => write!(f, "config parse error: {reason}"),
            Self::Encoder { reason } => write!(f, "audio encoder init failed: {reason}"),
            Self::Capture { reason } => write!(f, "audio capture init failed: {reason}"),
            Self::Transport { reason } => write!(f, "transport init failed: {reason}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { expected, actual } => {
                write!(f, "buffer length {actual} bytes, expected {expected}")
            }
            Self::AllZero => write!(f, "buffer is all zero"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec { reason } => write!(f, "codec error: {reason}"),
            Self::Panicked => write!(f, "codec panicked"),
        }
    }
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "sender has no open transport"),
            Self::Io { kind, message } => write!(f, "send failed ({kind:?}): {message}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCallsign(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for ValidationError {}

impl std::error::Error for EncodeError {}

impl std::error::Error for TransmitError {}
