//! Push-to-talk state machine and per-buffer transmit flow.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, warn};
use wire::{FrameCodec, StationId, PTT_START, PTT_STOP};

use crate::config::TransmitConfig;
use crate::encoder::AudioEncoder;
use crate::error::{ConfigError, EncodeError};
use crate::hal::{CaptureControl, Indicator, PttEdge};
use crate::sender::NetworkSender;
use crate::stats::{AudioStats, NetworkStats, StatsReport};
use crate::validate::check_buffer;

/// Transmit state, driven only by PTT edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PttState {
    #[default]
    Idle,
    Transmitting,
}

struct PipelineState {
    ptt: PttState,
    codec: FrameCodec,
    encoder: Box<dyn AudioEncoder>,
    indicator: Box<dyn Indicator>,
    sender: NetworkSender,
    audio: AudioStats,
    shut_down: bool,
}

/// The transmit pipeline.
///
/// Edge callbacks and the periodic audio callback may run on different
/// threads; every transition and counter update happens under one lock, so
/// each handler observes and leaves a consistent state.
///
/// | State          | Event            | Effect |
/// |----------------|------------------|--------|
/// | `Idle`         | pressed          | indicator on, `PTT_START` sent, -> `Transmitting` |
/// | `Transmitting` | released         | indicator off, `PTT_STOP` sent, report logged, -> `Idle` |
/// | `Transmitting` | audio buffer     | validate, encode, frame, send |
/// | `Idle`         | audio buffer     | discarded, not counted |
///
/// Repeated presses or releases in the same state are ignored.
pub struct TransmitPipeline {
    inner: Mutex<PipelineState>,
    expected_len: usize,
    samples_per_buffer: usize,
}

impl TransmitPipeline {
    /// Validates `config` and assembles a pipeline in the `Idle` state.
    pub fn new(
        config: &TransmitConfig,
        encoder: impl AudioEncoder + 'static,
        indicator: impl Indicator + 'static,
        sender: NetworkSender,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let station_id = if config.protocol.has_station_id() {
            config.station_id()?
        } else {
            StationId::default()
        };

        Ok(Self {
            inner: Mutex::new(PipelineState {
                ptt: PttState::Idle,
                codec: FrameCodec::new(config.protocol, station_id),
                encoder: Box::new(encoder),
                indicator: Box::new(indicator),
                sender,
                audio: AudioStats::default(),
                shut_down: false,
            }),
            expected_len: config.audio.expected_buffer_len(),
            samples_per_buffer: config.audio.samples_per_buffer(),
        })
    }

    /// Byte length every audio buffer must have.
    #[must_use]
    pub const fn expected_buffer_len(&self) -> usize {
        self.expected_len
    }

    pub fn handle_edge(&self, edge: PttEdge) {
        match edge {
            PttEdge::Pressed => {
                self.ptt_pressed();
            }
            PttEdge::Released => {
                self.ptt_released();
            }
        }
    }

    /// `Idle -> Transmitting`. Returns `false` if already transmitting or shut down.
    pub fn ptt_pressed(&self) -> bool {
        let mut state = self.lock();
        if state.shut_down || state.ptt == PttState::Transmitting {
            return false;
        }

        state.ptt = PttState::Transmitting;
        state.indicator.set(true);
        let frame = state.codec.create_control_frame(PTT_START);
        let sent = state.sender.send(&frame);
        info!(sequence = state.codec.sequence(), sent, "PTT pressed, transmitting");
        true
    }

    /// `Transmitting -> Idle`. Returns the statistics report on a transition.
    pub fn ptt_released(&self) -> Option<StatsReport> {
        let mut state = self.lock();
        if state.ptt == PttState::Idle {
            return None;
        }

        state.ptt = PttState::Idle;
        state.indicator.set(false);
        let frame = state.codec.create_control_frame(PTT_STOP);
        let sent = state.sender.send(&frame);
        let report = StatsReport::merge(state.audio, state.sender.stats());
        info!(sequence = state.codec.sequence(), sent, "PTT released\n{report}");
        Some(report)
    }

    /// Handles one captured buffer. Never panics and never blocks on I/O.
    pub fn audio_buffer_ready(&self, buffer: &[u8]) -> CaptureControl {
        let mut state = self.lock();
        if state.ptt != PttState::Transmitting {
            return CaptureControl::Continue;
        }

        if let Err(err) = check_buffer(buffer, self.expected_len) {
            state.audio.invalid_frames += 1;
            debug!(%err, "audio buffer rejected");
            return CaptureControl::Continue;
        }

        let samples = self.samples_per_buffer;
        let encoded = panic::catch_unwind(AssertUnwindSafe(|| {
            state.encoder.encode(buffer, samples)
        }))
        .unwrap_or(Err(EncodeError::Panicked));
        let packet = match encoded {
            Ok(packet) => packet,
            Err(err) => {
                state.audio.encoding_errors += 1;
                warn!(%err, "audio buffer not encoded");
                return CaptureControl::Continue;
            }
        };
        state.audio.frames_encoded += 1;

        let frame = state.codec.create_audio_frame(&packet);
        if state.sender.send(&frame) {
            state.audio.frames_sent += 1;
        }
        CaptureControl::Continue
    }

    #[must_use]
    pub fn state(&self) -> PttState {
        self.lock().ptt
    }

    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.state() == PttState::Transmitting
    }

    /// Sequence number of the last frame created.
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.lock().codec.sequence()
    }

    #[must_use]
    pub fn audio_stats(&self) -> AudioStats {
        self.lock().audio
    }

    #[must_use]
    pub fn network_stats(&self) -> NetworkStats {
        self.lock().sender.stats()
    }

    /// Merged statistics snapshot.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        let state = self.lock();
        StatsReport::merge(state.audio, state.sender.stats())
    }

    /// Closes the sender and turns the indicator off, in that order.
    ///
    /// Runs once; later calls do nothing. Buffers arriving afterwards are
    /// discarded and presses are ignored. No `PTT_STOP` is sent if shutdown
    /// happens mid-transmission.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        state.ptt = PttState::Idle;
        state.sender.close();
        state.indicator.set(false);
        info!("transmit pipeline shut down");
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            error!("recovering poisoned pipeline lock");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for TransmitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TransmitPipeline")
            .field("ptt", &state.ptt)
            .field("sequence", &state.codec.sequence())
            .field("audio", &state.audio)
            .field("sender", &state.sender)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::NullIndicator;
    use std::io;
    use std::sync::Arc;

    struct Passthrough;

    impl AudioEncoder for Passthrough {
        fn encode(&mut self, pcm: &[u8], _sample_count: usize) -> Result<Vec<u8>, EncodeError> {
            Ok(pcm[..8].to_vec())
        }
    }

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<Vec<u8>>>>);

    impl crate::sender::Transport for Sink {
        fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().push(datagram.to_vec());
            Ok(datagram.len())
        }
    }

    fn pipeline(sink: &Sink) -> TransmitPipeline {
        TransmitPipeline::new(
            &TransmitConfig::default(),
            Passthrough,
            NullIndicator,
            NetworkSender::new(sink.clone()),
        )
        .unwrap()
    }

    fn tone(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 200) as u8 + 1).collect()
    }

    #[test]
    fn starts_idle() {
        let p = pipeline(&Sink::default());
        assert_eq!(p.state(), PttState::Idle);
        assert_eq!(p.sequence(), 0);
    }

    #[test]
    fn press_sends_start_frame() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        assert!(p.ptt_pressed());
        assert!(p.is_transmitting());
        let frames = sink.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].ends_with(PTT_START));
    }

    #[test]
    fn second_press_is_ignored() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        assert!(p.ptt_pressed());
        assert!(!p.ptt_pressed());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert_eq!(p.sequence(), 1);
    }

    #[test]
    fn release_while_idle_is_ignored() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        assert!(p.ptt_released().is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn idle_buffers_are_not_counted() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        let buf = tone(p.expected_buffer_len());
        assert_eq!(p.audio_buffer_ready(&buf), CaptureControl::Continue);
        assert_eq!(p.audio_buffer_ready(&[]), CaptureControl::Continue);
        assert_eq!(p.audio_stats(), AudioStats::default());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_buffer_counted() {
        let p = pipeline(&Sink::default());
        p.ptt_pressed();
        p.audio_buffer_ready(&[1, 2, 3]);
        p.audio_buffer_ready(&vec![0u8; p.expected_buffer_len()]);
        let stats = p.audio_stats();
        assert_eq!(stats.invalid_frames, 2);
        assert_eq!(stats.frames_encoded, 0);
    }

    #[test]
    fn valid_buffer_is_sent() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        p.ptt_pressed();
        p.audio_buffer_ready(&tone(p.expected_buffer_len()));
        let stats = p.audio_stats();
        assert_eq!(stats.frames_encoded, 1);
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(p.sequence(), 2);
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn release_returns_report() {
        let p = pipeline(&Sink::default());
        p.ptt_pressed();
        p.audio_buffer_ready(&tone(p.expected_buffer_len()));
        let report = p.ptt_released().unwrap();
        assert_eq!(report.audio.frames_encoded, 1);
        assert_eq!(report.success_rate, Some(100.0));
        assert_eq!(report.network.packets_sent, 3);
        assert_eq!(p.state(), PttState::Idle);
    }

    #[test]
    fn shutdown_is_idempotent_and_final() {
        let sink = Sink::default();
        let p = pipeline(&sink);
        p.ptt_pressed();
        p.shutdown();
        p.shutdown();
        assert_eq!(p.state(), PttState::Idle);
        assert!(!p.ptt_pressed());
        p.audio_buffer_ready(&tone(p.expected_buffer_len()));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert_eq!(p.audio_stats(), AudioStats::default());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TransmitConfig {
            station_callsign: String::new(),
            ..TransmitConfig::default()
        };
        let err = TransmitPipeline::new(
            &config,
            Passthrough,
            NullIndicator,
            NetworkSender::detached(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCallsign(_)));
    }
}
