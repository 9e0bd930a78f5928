use std::time::{Duration, Instant};

use crate::audio::{AudioBackend, MeterSession, MeterSnapshot, MeterState, SessionSummary};
use crate::config::Config;
use crate::error::Result;
use crate::tone::ToneGenerator;

/// Command surface of the mic/speaker check.
///
/// Metering and tones own disjoint state. The metering side is advanced by
/// `tick`, the tone side by `poll_tones`; both take `&mut self`, so a tick
/// can never re-enter while another is running.
pub struct AudioCheck {
    backend: Box<dyn AudioBackend>,
    config: Config,
    meter: Option<MeterSession>,
    tones: ToneGenerator,
}

impl AudioCheck {
    pub fn new(backend: Box<dyn AudioBackend>, config: Config) -> Result<Self> {
        config.validate()?;
        let tones = ToneGenerator::new(config.tone.clone())?;
        Ok(Self {
            backend,
            config,
            meter: None,
            tones,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    /// Open the capture device and begin a fresh session.
    /// A running session is stopped first.
    pub fn start_metering(&mut self, device_id: Option<&str>, now: Instant) -> Result<()> {
        self.stop_metering();
        let session = MeterSession::start(self.backend.as_ref(), device_id, &self.config.meter, now)?;
        self.meter = Some(session);
        Ok(())
    }

    /// Release the capture device. Safe to call when nothing is running.
    pub fn stop_metering(&mut self) -> Option<SessionSummary> {
        self.meter.take().map(|mut session| session.stop())
    }

    /// One metering tick. `Ok(None)` when idle or no new frame arrived.
    /// A stream interruption stops the session and is returned as the error.
    pub fn tick(&mut self, now: Instant) -> Result<Option<MeterSnapshot>> {
        match self.meter.as_mut() {
            Some(session) => session.tick(now),
            None => Ok(None),
        }
    }

    pub fn is_metering(&self) -> bool {
        self.meter.as_ref().is_some_and(MeterSession::is_running)
    }

    pub fn meter_state(&self) -> Option<MeterState> {
        self.meter.as_ref().map(MeterSession::state)
    }

    pub fn set_output_device(&mut self, device_id: Option<&str>) {
        self.tones.set_output_device(device_id.map(str::to_string));
    }

    pub fn play_tone(&mut self, left: f32, right: f32, frequency_hz: f32, now: Instant) -> Result<()> {
        self.tones
            .play_tone(self.backend.as_ref(), left, right, frequency_hz, now)
    }

    pub fn start_sweep(&mut self, now: Instant) -> Result<()> {
        self.tones.start_sweep(self.backend.as_ref(), now)
    }

    pub fn start_alternate(&mut self, interval_ms: u64, now: Instant) -> Result<()> {
        self.tones
            .start_alternate(self.backend.as_ref(), Duration::from_millis(interval_ms), now)
    }

    pub fn stop_tone(&mut self) -> bool {
        self.tones.stop()
    }

    /// Tear down a finished sweep. Independent of the metering tick.
    pub fn poll_tones(&mut self, now: Instant) -> bool {
        self.tones.poll(now)
    }

    pub fn tones(&self) -> &ToneGenerator {
        &self.tones
    }

    /// Stop metering and any tone. Idempotent.
    pub fn shutdown(&mut self) -> Option<SessionSummary> {
        self.tones.stop();
        self.stop_metering()
    }
}
