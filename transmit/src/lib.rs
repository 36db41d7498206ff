//! Push-to-talk transmit pipeline for Opulent Voice Protocol stations.
//!
//! While the PTT input is held, every captured PCM buffer is validated,
//! compressed by the voice codec, wrapped in an OVP audio frame and sent as
//! one UDP datagram. Press and release are bracketed by `PTT_START` and
//! `PTT_STOP` control frames; the release also logs a statistics report.
//!
//! # Features
//!
//! - Two-state PTT machine shared safely between edge and audio callbacks
//! - Buffer validation (exact length, not all-zero)
//! - Best-effort, non-blocking UDP delivery with counters
//! - Ordered shutdown through [`Station`]
//!
//! # Design Principles
//!
//! - **Never fault the audio path** - per-buffer failures are counted and
//!   logged, codec panics included.
//! - **Pluggable hardware** - GPIO, codec, capture and transport sit behind
//!   traits so the pipeline runs unchanged in tests and simulation.
//! - **Fail fast at startup** - only configuration errors are returned.

mod config;
mod encoder;
mod error;
mod hal;
mod pipeline;
mod sender;
mod station;
mod stats;
mod validate;

pub use config::{
    AudioConfig, TransmitConfig, BITRATE_RANGE, BYTES_PER_SAMPLE, DEFAULT_PORT,
    SUPPORTED_FRAME_DURATIONS_MS, SUPPORTED_SAMPLE_RATES,
};
pub use encoder::{AudioEncoder, EncoderSettings};
pub use error::{ConfigError, EncodeError, TransmitError, ValidationError};
pub use hal::{AudioBackend, AudioCapture, CaptureControl, Indicator, NullIndicator, PttEdge};
pub use pipeline::{PttState, TransmitPipeline};
pub use sender::{NetworkSender, Transport, UdpTransport};
pub use station::Station;
pub use stats::{AudioStats, NetworkStats, StatsReport};
pub use validate::{check_buffer, validate_buffer};
