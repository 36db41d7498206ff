//! Interface to the voice codec.

use crate::config::AudioConfig;
use crate::error::EncodeError;

/// Settings a codec is constructed with. Variable bitrate is always off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// Constant bitrate target in bits per second.
    pub bitrate: u32,
    pub vbr: bool,
}

impl From<&AudioConfig> for EncoderSettings {
    fn from(audio: &AudioConfig) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            bitrate: audio.bitrate,
            vbr: false,
        }
    }
}

impl EncoderSettings {
    /// Nominal packet size for one buffer at the constant bitrate.
    #[must_use]
    pub fn packet_bytes(&self, frame_duration_ms: u32) -> usize {
        (u64::from(self.bitrate) * u64::from(frame_duration_ms) / 8000) as usize
    }
}

/// Compresses one PCM buffer into one variable-length packet.
pub trait AudioEncoder: Send {
    /// `pcm` is interleaved signed 16-bit little-endian; `sample_count` is
    /// the number of samples per channel.
    fn encode(&mut self, pcm: &[u8], sample_count: usize) -> Result<Vec<u8>, EncodeError>;
}

impl<E: AudioEncoder + ?Sized> AudioEncoder for Box<E> {
    fn encode(&mut self, pcm: &[u8], sample_count: usize) -> Result<Vec<u8>, EncodeError> {
        (**self).encode(pcm, sample_count)
    }
}
