//! Software stand-ins for the station hardware and a scripted PTT session.

use std::f32::consts::TAU;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, info};
use transmit::{
    AudioBackend, AudioCapture, AudioConfig, AudioEncoder, ConfigError, EncodeError,
    EncoderSettings, Indicator, NetworkSender, PttEdge, Station, StatsReport, TransmitConfig,
    TransmitPipeline, Transport, BYTES_PER_SAMPLE,
};

/// Sine generator producing interleaved signed 16-bit little-endian PCM.
#[derive(Debug, Clone)]
pub struct ToneSource {
    channels: usize,
    step: f32,
    phase: f32,
    amplitude: f32,
}

impl ToneSource {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(audio: &AudioConfig, frequency_hz: f32) -> Self {
        Self {
            channels: usize::from(audio.channels),
            step: TAU * frequency_hz / audio.sample_rate as f32,
            phase: 0.0,
            amplitude: f32::from(i16::MAX) * 0.3,
        }
    }

    /// Next `samples` samples per channel.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_buffer(&mut self, samples: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(samples * self.channels * BYTES_PER_SAMPLE);
        for _ in 0..samples {
            let value = (self.phase.sin() * self.amplitude) as i16;
            for _ in 0..self.channels {
                out.extend_from_slice(&value.to_le_bytes());
            }
            self.phase = (self.phase + self.step) % TAU;
        }
        out
    }
}

/// Constant-bitrate stand-in for the voice codec.
///
/// Packets have the size the real codec produces at the configured bitrate
/// and carry an XOR digest of the input, so different audio gives different
/// payloads.
#[derive(Debug, Clone)]
pub struct FixedRateEncoder {
    packet_bytes: usize,
    expected_pcm_len: usize,
}

impl FixedRateEncoder {
    pub fn new(audio: &AudioConfig) -> Result<Self, ConfigError> {
        audio.validate().map_err(|err| ConfigError::Encoder {
            reason: err.to_string(),
        })?;
        let settings = EncoderSettings::from(audio);
        Ok(Self {
            packet_bytes: settings.packet_bytes(audio.frame_duration_ms).max(1),
            expected_pcm_len: audio.expected_buffer_len(),
        })
    }

    #[must_use]
    pub const fn packet_bytes(&self) -> usize {
        self.packet_bytes
    }
}

impl AudioEncoder for FixedRateEncoder {
    fn encode(&mut self, pcm: &[u8], _sample_count: usize) -> Result<Vec<u8>, EncodeError> {
        if pcm.len() != self.expected_pcm_len {
            return Err(EncodeError::Codec {
                reason: format!("expected {} pcm bytes, got {}", self.expected_pcm_len, pcm.len()),
            });
        }
        let mut packet = vec![0u8; self.packet_bytes];
        for (idx, byte) in pcm.iter().enumerate() {
            packet[idx % self.packet_bytes] ^= byte;
        }
        Ok(packet)
    }
}

/// Indicator that reports its state through the log.
#[derive(Debug, Clone)]
pub struct LogIndicator {
    line: String,
    on: bool,
}

impl LogIndicator {
    #[must_use]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            on: false,
        }
    }
}

impl Indicator for LogIndicator {
    fn set(&mut self, on: bool) {
        if self.on != on {
            info!(line = %self.line, on, "transmit indicator");
        }
        self.on = on;
    }
}

/// Captures every datagram before handing it to the wrapped transport.
#[derive(Debug)]
pub struct Recorder<T> {
    inner: T,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl<T: Transport> Recorder<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            frames: Arc::default(),
        }
    }

    /// Shared handle to the captured datagrams.
    #[must_use]
    pub fn frames(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.frames)
    }
}

impl<T: Transport> Transport for Recorder<T> {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(datagram.to_vec());
        self.inner.send(datagram)
    }
}

/// What drives the capture thread.
#[derive(Debug)]
pub enum Clock {
    /// One buffer per frame duration of wall time.
    Realtime,
    /// One buffer per received tick; each is acknowledged on `done`.
    Stepped {
        ticks: Receiver<Instant>,
        done: Sender<()>,
    },
}

/// Audio backend delivering a synthetic tone from its own thread.
#[derive(Debug)]
pub struct ToneBackend {
    source: ToneSource,
    clock: Clock,
    /// Every k-th buffer is delivered at half length.
    invalid_every: Option<u32>,
}

impl ToneBackend {
    #[must_use]
    pub fn new(source: ToneSource, clock: Clock, invalid_every: Option<u32>) -> Self {
        Self {
            source,
            clock,
            invalid_every: invalid_every.filter(|&every| every > 0),
        }
    }
}

/// Handle to the capture thread started by [`ToneBackend`].
#[derive(Debug)]
pub struct ToneCapture {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl AudioCapture for ToneCapture {
    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(delivered) => debug!(delivered, "capture thread stopped"),
                Err(_) => debug!("capture thread panicked"),
            }
        }
    }
}

impl Drop for ToneCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

impl AudioBackend for ToneBackend {
    type Capture = ToneCapture;

    fn start(
        self,
        audio: &AudioConfig,
        pipeline: Arc<TransmitPipeline>,
    ) -> Result<ToneCapture, ConfigError> {
        let (stop_tx, stop_rx) = bounded(1);
        let samples = audio.samples_per_buffer();
        let (ticks, done) = match self.clock {
            Clock::Realtime => (crossbeam_channel::tick(audio.buffer_period()), None),
            Clock::Stepped { ticks, done } => (ticks, Some(done)),
        };
        let mut source = self.source;
        let invalid_every = self.invalid_every;

        let handle = thread::Builder::new()
            .name("ovp-capture".to_string())
            .spawn(move || {
                let mut delivered = 0u64;
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticks) -> tick => {
                            if tick.is_err() {
                                break;
                            }
                            delivered += 1;
                            let mut buffer = source.next_buffer(samples);
                            if invalid_every.is_some_and(|every| delivered % u64::from(every) == 0) {
                                buffer.truncate(buffer.len() / 2);
                            }
                            pipeline.audio_buffer_ready(&buffer);
                            if let Some(done) = &done {
                                if done.send(()).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
                delivered
            })
            .map_err(|err| ConfigError::Capture {
                reason: err.to_string(),
            })?;

        Ok(ToneCapture {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// Shape of a scripted PTT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    pub presses: u32,
    /// Buffers captured while the key is held.
    pub buffers_per_press: u32,
    /// Buffers captured between releases and the next press.
    pub idle_buffers: u32,
    pub invalid_every: Option<u32>,
    pub realtime: bool,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            presses: 2,
            buffers_per_press: 25,
            idle_buffers: 5,
            invalid_every: None,
            realtime: false,
        }
    }
}

/// Plays `plan` against a station built from `config`.
///
/// The PTT script runs on its own thread and the tone capture on another.
/// In stepped mode the script hands out capture ticks one at a time, so the
/// outcome does not depend on scheduling.
pub fn run_session(
    config: &TransmitConfig,
    sender: NetworkSender,
    plan: &SessionPlan,
) -> Result<StatsReport, ConfigError> {
    let pipeline = Arc::new(TransmitPipeline::new(
        config,
        FixedRateEncoder::new(&config.audio)?,
        LogIndicator::new(&config.indicator_output),
        sender,
    )?);

    let (clock, stepper) = if plan.realtime {
        (Clock::Realtime, Stepper::Sleep(config.audio.buffer_period()))
    } else {
        let (tick_tx, tick_rx) = bounded(0);
        let (done_tx, done_rx) = bounded(0);
        (
            Clock::Stepped {
                ticks: tick_rx,
                done: done_tx,
            },
            Stepper::Ticks {
                ticks: tick_tx,
                done: done_rx,
            },
        )
    };
    let backend = ToneBackend::new(ToneSource::new(&config.audio, 440.0), clock, plan.invalid_every);
    let station = Station::start(Arc::clone(&pipeline), backend, &config.audio)?;

    info!(
        presses = plan.presses,
        buffers = plan.buffers_per_press,
        ptt_input = %config.ptt_input,
        "scripted session started"
    );
    let script_pipeline = Arc::clone(&pipeline);
    let script = *plan;
    let completed = thread::scope(|scope| {
        scope
            .spawn(move || play_script(&script_pipeline, &script, &stepper))
            .join()
            .unwrap_or(false)
    });
    if !completed {
        debug!("capture thread ended before the script finished");
    }

    Ok(station.shutdown())
}

enum Stepper {
    Sleep(Duration),
    Ticks {
        ticks: Sender<Instant>,
        done: Receiver<()>,
    },
}

impl Stepper {
    fn advance(&self, buffers: u32) -> bool {
        match self {
            Self::Sleep(period) => {
                thread::sleep(*period * buffers);
                true
            }
            Self::Ticks { ticks, done } => (0..buffers)
                .all(|_| ticks.send(Instant::now()).is_ok() && done.recv().is_ok()),
        }
    }
}

fn play_script(pipeline: &TransmitPipeline, plan: &SessionPlan, stepper: &Stepper) -> bool {
    for _ in 0..plan.presses {
        pipeline.handle_edge(PttEdge::Pressed);
        let held = stepper.advance(plan.buffers_per_press);
        pipeline.handle_edge(PttEdge::Released);
        if !held || !stepper.advance(plan.idle_buffers) {
            return false;
        }
    }
    true
}
