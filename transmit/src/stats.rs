//! Transmit statistics.

use std::fmt;

use serde::Serialize;

/// Counters kept by the pipeline on the audio side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioStats {
    /// Buffers the codec compressed successfully.
    pub frames_encoded: u64,
    /// Audio frames the sender accepted.
    pub frames_sent: u64,
    /// Buffers rejected by validation.
    pub invalid_frames: u64,
    /// Buffers the codec failed on.
    pub encoding_errors: u64,
}

/// Counters kept by the network sender, covering audio and control frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub errors: u64,
}

/// Point-in-time merge of both counter groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsReport {
    pub audio: AudioStats,
    pub network: NetworkStats,
    /// `frames_sent / frames_encoded * 100`; absent until something was encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
}

impl AudioStats {
    /// Percentage of encoded frames that were sent, if any were encoded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        if self.frames_encoded == 0 {
            return None;
        }
        Some(self.frames_sent as f64 / self.frames_encoded as f64 * 100.0)
    }
}

impl StatsReport {
    #[must_use]
    pub fn merge(audio: AudioStats, network: NetworkStats) -> Self {
        Self {
            audio,
            network,
            success_rate: audio.success_rate(),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "transmission statistics:")?;
        writeln!(f, "  audio frames encoded: {}", self.audio.frames_encoded)?;
        writeln!(f, "  audio frames sent:    {}", self.audio.frames_sent)?;
        writeln!(f, "  invalid buffers:      {}", self.audio.invalid_frames)?;
        writeln!(f, "  encoding errors:      {}", self.audio.encoding_errors)?;
        writeln!(f, "  packets sent:         {}", self.network.packets_sent)?;
        writeln!(f, "  bytes sent:           {}", self.network.bytes_sent)?;
        write!(f, "  network errors:       {}", self.network.errors)?;
        if let Some(rate) = self.success_rate {
            write!(f, "\n  success rate:         {rate:.1}%")?;
        }
        Ok(())
    }
}
