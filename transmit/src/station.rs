//! A running station: pipeline plus live capture stream.

use std::sync::Arc;

use tracing::info;

use crate::config::AudioConfig;
use crate::error::ConfigError;
use crate::hal::{AudioBackend, AudioCapture};
use crate::pipeline::TransmitPipeline;
use crate::stats::StatsReport;

/// Owns the capture stream feeding a [`TransmitPipeline`].
///
/// Shutdown stops capture first, then closes the sender and turns the
/// indicator off. It runs exactly once, either explicitly or on drop.
pub struct Station {
    pipeline: Arc<TransmitPipeline>,
    capture: Option<Box<dyn AudioCapture>>,
}

impl Station {
    /// Starts `backend` delivering buffers into `pipeline`.
    ///
    /// On failure the pipeline is shut down before the error is returned.
    pub fn start(
        pipeline: Arc<TransmitPipeline>,
        backend: impl AudioBackend,
        audio: &AudioConfig,
    ) -> Result<Self, ConfigError> {
        match backend.start(audio, Arc::clone(&pipeline)) {
            Ok(capture) => {
                info!(
                    buffer_len = pipeline.expected_buffer_len(),
                    "station started"
                );
                Ok(Self::new(pipeline, capture))
            }
            Err(err) => {
                pipeline.shutdown();
                Err(err)
            }
        }
    }

    /// Wraps an already running capture stream.
    pub fn new(pipeline: Arc<TransmitPipeline>, capture: impl AudioCapture + 'static) -> Self {
        Self {
            pipeline,
            capture: Some(Box::new(capture)),
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<TransmitPipeline> {
        &self.pipeline
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    /// Stops the station and returns the final statistics.
    pub fn shutdown(mut self) -> StatsReport {
        self.stop();
        self.pipeline.report()
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
            self.pipeline.shutdown();
            info!("station stopped\n{}", self.pipeline.report());
        }
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("pipeline", &self.pipeline)
            .field("running", &self.is_running())
            .finish()
    }
}
