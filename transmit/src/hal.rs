//! Interfaces to the hardware and audio backends.
//!
//! The pipeline does not talk to GPIO lines or sound devices itself. The
//! hardware backend calls [`TransmitPipeline::handle_edge`] on press and
//! release edges and receives indicator updates through [`Indicator`]. The
//! audio backend calls [`TransmitPipeline::audio_buffer_ready`] once per
//! captured buffer.
//!
//! [`TransmitPipeline::handle_edge`]: crate::TransmitPipeline::handle_edge
//! [`TransmitPipeline::audio_buffer_ready`]: crate::TransmitPipeline::audio_buffer_ready

use std::sync::Arc;

use crate::config::AudioConfig;
use crate::error::ConfigError;
use crate::pipeline::TransmitPipeline;

/// Edge reported by the PTT input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PttEdge {
    Pressed,
    Released,
}

/// Two-state transmit indicator (LED, relay, ...).
pub trait Indicator: Send {
    fn set(&mut self, on: bool);
}

/// Indicator that drives nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn set(&mut self, _on: bool) {}
}

impl<I: Indicator + ?Sized> Indicator for Box<I> {
    fn set(&mut self, on: bool) {
        (**self).set(on);
    }
}

/// Value returned to the capture backend after every buffer.
///
/// Capture is half-duplex and never asks the backend to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureControl {
    Continue,
}

/// Handle to a running capture stream.
pub trait AudioCapture: Send {
    /// Stops buffer delivery. Called once during shutdown.
    fn stop(&mut self);
}

impl<C: AudioCapture + ?Sized> AudioCapture for Box<C> {
    fn stop(&mut self) {
        (**self).stop();
    }
}

/// Audio backend able to start delivering buffers into a pipeline.
pub trait AudioBackend {
    type Capture: AudioCapture + 'static;

    /// Starts periodic delivery of `audio.expected_buffer_len()`-byte PCM
    /// buffers into `pipeline`.
    fn start(
        self,
        audio: &AudioConfig,
        pipeline: Arc<TransmitPipeline>,
    ) -> Result<Self::Capture, ConfigError>;
}
