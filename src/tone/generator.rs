use std::time::{Duration, Instant};
use tracing::info;

use super::session::{ToneFrame, ToneSession};
use crate::audio::traits::{AudioBackend, ToneOutput};
use crate::config::ToneConfig;
use crate::error::Result;

struct ActiveTone {
    session: ToneSession,
    started_at: Instant,
    output: Box<dyn ToneOutput>,
}

/// Schedules speaker test tones. At most one tone plays at a time:
/// every start first tears down whatever is active.
pub struct ToneGenerator {
    config: ToneConfig,
    device_id: Option<String>,
    active: Option<ActiveTone>,
}

impl ToneGenerator {
    pub fn new(config: ToneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            device_id: None,
            active: None,
        })
    }

    /// Output device for subsequent tones; `None` is the host default.
    pub fn set_output_device(&mut self, device_id: Option<String>) {
        self.device_id = device_id;
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    /// Discrete left/right/both tone.
    pub fn play_tone(
        &mut self,
        backend: &dyn AudioBackend,
        left_gain: f32,
        right_gain: f32,
        frequency_hz: f32,
        now: Instant,
    ) -> Result<()> {
        let session = ToneSession::fixed(left_gain, right_gain, frequency_hz)?;
        self.start(backend, session, now)
    }

    /// Configured sweep; tears itself down once `poll` sees it finished.
    pub fn start_sweep(&mut self, backend: &dyn AudioBackend, now: Instant) -> Result<()> {
        let session = ToneSession::sweep(
            self.config.sweep_start_hz,
            self.config.sweep_end_hz,
            Duration::from_millis(self.config.sweep_duration_ms),
        )?;
        self.start(backend, session, now)
    }

    pub fn start_alternate(
        &mut self,
        backend: &dyn AudioBackend,
        interval: Duration,
        now: Instant,
    ) -> Result<()> {
        let session = ToneSession::alternate(self.config.frequency_hz, interval)?;
        self.start(backend, session, now)
    }

    /// Replace the active tone with `session`.
    ///
    /// The previous output is stopped before the new one is opened. If the
    /// output can't be opened nothing is left playing and the error is returned.
    pub fn start(
        &mut self,
        backend: &dyn AudioBackend,
        session: ToneSession,
        now: Instant,
    ) -> Result<()> {
        self.stop();
        let output = backend.open_output(self.device_id.as_deref(), &session, self.config.amplitude)?;
        info!(shape = ?session.shape(), "tone started");
        self.active = Some(ActiveTone {
            session,
            started_at: now,
            output,
        });
        Ok(())
    }

    /// Stop the active tone, releasing the output synchronously.
    /// Returns whether anything was playing.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.output.stop();
                info!("tone stopped");
                true
            }
            None => false,
        }
    }

    /// Tear down a tone whose duration has elapsed. Returns true if it did.
    pub fn poll(&mut self, now: Instant) -> bool {
        let finished = self.active.as_ref().is_some_and(|active| {
            let elapsed = now.saturating_duration_since(active.started_at);
            active.session.is_finished(elapsed.as_secs_f64())
        });
        if finished {
            self.stop();
        }
        finished
    }

    pub fn active_session(&self) -> Option<&ToneSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Current gains and frequency of the active tone.
    pub fn active_gains(&self, now: Instant) -> Option<ToneFrame> {
        self.active.as_ref().map(|active| {
            let elapsed = now.saturating_duration_since(active.started_at);
            active.session.at(elapsed.as_secs_f64())
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for ToneGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}
