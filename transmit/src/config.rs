//! Station configuration.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wire::{ProtocolVariant, StationId};

use crate::error::ConfigError;

/// Default UDP port for OVP traffic.
pub const DEFAULT_PORT: u16 = 57372;

/// Sample rates accepted by the voice codec.
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

/// Frame durations accepted by the voice codec, in milliseconds.
pub const SUPPORTED_FRAME_DURATIONS_MS: [u32; 4] = [10, 20, 40, 60];

/// Bitrate range accepted by the voice codec, in bits per second.
pub const BITRATE_RANGE: std::ops::RangeInclusive<u32> = 6_000..=510_000;

/// Capture delivers signed 16-bit PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Audio capture and codec parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Samples per second per channel.
    pub sample_rate: u32,
    pub channels: u16,
    /// Constant codec bitrate in bits per second.
    pub bitrate: u32,
    /// Length of one capture buffer in milliseconds.
    pub frame_duration_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
            bitrate: 16_000,
            frame_duration_ms: 40,
        }
    }
}

impl AudioConfig {
    /// Samples per channel in one capture buffer.
    #[must_use]
    pub fn samples_per_buffer(&self) -> usize {
        (u64::from(self.sample_rate) * u64::from(self.frame_duration_ms) / 1000) as usize
    }

    /// Exact byte length every capture buffer must have.
    #[must_use]
    pub fn expected_buffer_len(&self) -> usize {
        self.samples_per_buffer() * BYTES_PER_SAMPLE * usize::from(self.channels)
    }

    /// Interval between capture callbacks; also the per-buffer latency budget.
    #[must_use]
    pub fn buffer_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.frame_duration_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ConfigError::UnsupportedSampleRate {
                found: self.sample_rate,
            });
        }
        if !SUPPORTED_FRAME_DURATIONS_MS.contains(&self.frame_duration_ms) {
            return Err(ConfigError::UnsupportedFrameDuration {
                found_ms: self.frame_duration_ms,
            });
        }
        if !(1..=2).contains(&self.channels) {
            return Err(ConfigError::UnsupportedChannels {
                found: self.channels,
            });
        }
        if !BITRATE_RANGE.contains(&self.bitrate) {
            return Err(ConfigError::BitrateOutOfRange {
                found: self.bitrate,
                min: *BITRATE_RANGE.start(),
                max: *BITRATE_RANGE.end(),
            });
        }
        Ok(())
    }
}

/// Everything a station needs to start transmitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmitConfig {
    /// Destination host name or address.
    pub target_addr: String,
    pub target_port: u16,
    pub audio: AudioConfig,
    /// Identifier of the PTT input line, passed to the hardware backend.
    pub ptt_input: String,
    /// Identifier of the transmit indicator output, passed to the hardware backend.
    pub indicator_output: String,
    pub station_callsign: String,
    pub protocol: ProtocolVariant,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            target_addr: "127.0.0.1".to_string(),
            target_port: DEFAULT_PORT,
            audio: AudioConfig::default(),
            ptt_input: "GPIO23".to_string(),
            indicator_output: "GPIO17".to_string(),
            station_callsign: "N0CALL".to_string(),
            protocol: ProtocolVariant::Current,
        }
    }
}

impl TransmitConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })
    }

    /// Checks audio parameters and the callsign. Does not resolve the target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audio.validate()?;
        if self.protocol.has_station_id() {
            self.station_id()?;
        }
        if self.target_port == 0 {
            return Err(ConfigError::InvalidTarget {
                target: self.target_string(),
                reason: "port must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Station id for the current layout. Legacy frames carry none.
    pub fn station_id(&self) -> Result<StationId, ConfigError> {
        Ok(StationId::from_callsign(&self.station_callsign)?)
    }

    /// Resolves the destination to the first matching socket address.
    pub fn target(&self) -> Result<SocketAddr, ConfigError> {
        let target = self.target_string();
        (self.target_addr.as_str(), self.target_port)
            .to_socket_addrs()
            .map_err(|err| ConfigError::InvalidTarget {
                target: target.clone(),
                reason: err.to_string(),
            })?
            .next()
            .ok_or_else(|| ConfigError::InvalidTarget {
                target,
                reason: "no addresses resolved".to_string(),
            })
    }

    fn target_string(&self) -> String {
        format!("{}:{}", self.target_addr, self.target_port)
    }
}
