use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ballistics::VuBallistics;
use super::clip::ClipDetector;
use super::frame::AudioFrame;
use super::metrics::{LevelReading, MeterSnapshot};
use super::peak_hold::PeakHoldTracker;
use super::traits::{AudioBackend, FrameSource};
use crate::config::MeterConfig;
use crate::display::MeterScale;
use crate::error::{AudioError, Result};

/// Mutable metering state for one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterState {
    pub vu_level_db: f32,
    pub instant_peak_db: f32,
    pub held_peak_db: f32,
    pub hold_expires_at: Option<Instant>,
    pub clip_event_count: u64,
    pub last_clip_event_at: Option<Instant>,
}

/// Per-frame analysis pipeline:
/// LevelReading -> {VuBallistics, PeakHoldTracker, ClipDetector} -> MeterScale
///
/// Takes `&mut self`, so only one frame is ever in flight.
#[derive(Debug, Clone)]
pub struct Meter {
    clip_threshold: f32,
    ballistics: VuBallistics,
    peak_hold: PeakHoldTracker,
    clip: ClipDetector,
    scale: MeterScale,
    instant_peak_db: f32,
    last_tick: Option<Instant>,
}

impl Meter {
    pub fn new(config: &MeterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clip_threshold: config.clip_threshold,
            ballistics: VuBallistics::new(config.vu_attack(), config.vu_release()),
            peak_hold: PeakHoldTracker::new(config.peak_hold(), config.peak_decay_db_per_sec),
            clip: ClipDetector::new(config.clip_min_samples, config.clip_debounce()),
            scale: MeterScale::new(config.meter_min_db, config.meter_max_db),
            instant_peak_db: f32::NEG_INFINITY,
            last_tick: None,
        })
    }

    pub fn process(&mut self, frame: &AudioFrame, now: Instant) -> MeterSnapshot {
        let dt = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_tick = Some(now);

        let reading = LevelReading::analyze(frame.samples(), self.clip_threshold);
        let rms_db = reading.rms_db();
        self.instant_peak_db = reading.peak_db();

        let vu_level_db = self.ballistics.update(rms_db, dt);
        let held_peak_db = self.peak_hold.update(self.instant_peak_db, now);
        let clip_event = self.clip.update(reading.clipped_samples, now);
        if clip_event {
            info!(
                clipped_samples = reading.clipped_samples,
                total = self.clip.event_count(),
                "clip event"
            );
        }

        MeterSnapshot {
            vu_level_db,
            meter_percent: self.scale.percent(vu_level_db),
            held_peak_db,
            clip_event_count: self.clip.event_count(),
            rms_db,
            instant_peak_db: self.instant_peak_db,
            clip_event,
        }
    }

    pub fn state(&self) -> MeterState {
        MeterState {
            vu_level_db: self.ballistics.value(),
            instant_peak_db: self.instant_peak_db,
            held_peak_db: self.peak_hold.value(),
            hold_expires_at: self.peak_hold.hold_expires_at(),
            clip_event_count: self.clip.event_count(),
            last_clip_event_at: self.clip.last_event_at(),
        }
    }
}

/// What a finished session reports back
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub device_id: Option<String>,
    pub started_at: DateTime<Local>,
    pub ticks: u64,
    pub clip_events: u64,
}

impl SessionSummary {
    pub fn print_summary(&self) {
        println!("Metering Session Completed:");
        println!("Session: {}", self.session_id);
        println!("Device: {}", self.device_id.as_deref().unwrap_or("default"));
        println!("Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("Ticks: {}, Clip events: {}", self.ticks, self.clip_events);
    }
}

/// One metering session: an open capture source plus the meter pipeline.
///
/// Each `tick` pulls at most one frame. If the source goes quiet for
/// longer than the stall timeout, or reports an error, the session stops
/// itself and returns `StreamInterrupted`.
pub struct MeterSession {
    id: Uuid,
    device_id: Option<String>,
    source: Option<Box<dyn FrameSource>>,
    meter: Meter,
    stall_timeout: Duration,
    opened_at: Instant,
    started_at: DateTime<Local>,
    last_frame_at: Option<Instant>,
    ticks: u64,
}

impl MeterSession {
    pub fn start(
        backend: &dyn AudioBackend,
        device_id: Option<&str>,
        config: &MeterConfig,
        now: Instant,
    ) -> Result<Self> {
        let meter = Meter::new(config)?;
        let source = backend.open_capture(device_id, config.frame_len)?;
        Ok(Self::with_source(source, device_id, meter, config.stall_timeout(), now))
    }

    /// Build a session around an already opened source.
    pub fn with_source(
        source: Box<dyn FrameSource>,
        device_id: Option<&str>,
        meter: Meter,
        stall_timeout: Duration,
        now: Instant,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, device = device_id.unwrap_or("default"), "metering started");
        Self {
            id,
            device_id: device_id.map(str::to_string),
            source: Some(source),
            meter,
            stall_timeout,
            opened_at: now,
            started_at: Local::now(),
            last_frame_at: None,
            ticks: 0,
        }
    }

    pub fn tick(&mut self, now: Instant) -> Result<Option<MeterSnapshot>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        match source.next_frame() {
            Ok(Some(frame)) => {
                self.last_frame_at = Some(now);
                self.ticks += 1;
                let snapshot = self.meter.process(&frame, now);
                debug!(
                    session = %self.id,
                    vu_db = snapshot.vu_level_db,
                    peak_db = snapshot.held_peak_db,
                    "tick"
                );
                Ok(Some(snapshot))
            }
            Ok(None) => {
                let since = self.last_frame_at.unwrap_or(self.opened_at);
                let silent_for = now.saturating_duration_since(since);
                if silent_for > self.stall_timeout {
                    let reason = format!("no frames for {} ms", silent_for.as_millis());
                    self.interrupt(&reason);
                    return Err(AudioError::StreamInterrupted(reason));
                }
                Ok(None)
            }
            Err(e) => {
                self.interrupt(&e.to_string());
                Err(e)
            }
        }
    }

    fn interrupt(&mut self, reason: &str) {
        warn!(session = %self.id, reason, "metering stream interrupted");
        self.release();
    }

    /// Release the capture device. Safe to call repeatedly.
    pub fn stop(&mut self) -> SessionSummary {
        if self.source.is_some() {
            info!(session = %self.id, ticks = self.ticks, "metering stopped");
        }
        self.release();
        self.summary()
    }

    fn release(&mut self) {
        // dropping the source drops the device stream
        self.source = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            device_id: self.device_id.clone(),
            started_at: self.started_at,
            ticks: self.ticks,
            clip_events: self.meter.state().clip_event_count,
        }
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> MeterState {
        self.meter.state()
    }
}

impl Drop for MeterSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Plays back a fixed script of poll results.
    struct ScriptedSource {
        script: VecDeque<Result<Option<AudioFrame>>>,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }
    }

    fn session(script: Vec<Result<Option<AudioFrame>>>, now: Instant) -> MeterSession {
        let config = MeterConfig::default();
        let source = ScriptedSource {
            script: script.into(),
        };
        MeterSession::with_source(
            Box::new(source),
            Some("test-mic"),
            Meter::new(&config).unwrap(),
            config.stall_timeout(),
            now,
        )
    }

    fn constant(value: f32) -> AudioFrame {
        AudioFrame::new(vec![value; 2048])
    }

    #[test]
    fn test_silent_frame_maps_to_zero_percent() {
        let mut meter = Meter::new(&MeterConfig::default()).unwrap();
        let snapshot = meter.process(&AudioFrame::silent(2048), Instant::now());
        assert_eq!(snapshot.vu_level_db, f32::NEG_INFINITY);
        assert_eq!(snapshot.held_peak_db, f32::NEG_INFINITY);
        assert_eq!(snapshot.meter_percent, 0);
        assert!(snapshot.is_silent());
    }

    #[test]
    fn test_clip_frames_debounce_through_pipeline() {
        let start = Instant::now();
        let mut meter = Meter::new(&MeterConfig::default()).unwrap();

        let mut nearly = vec![0.1; 2048];
        nearly[..2].fill(0.99);
        assert!(!meter.process(&AudioFrame::new(nearly), start).clip_event);

        let first = meter.process(&constant(1.0), start + Duration::from_millis(16));
        let second = meter.process(&constant(1.0), start + Duration::from_millis(32));
        assert!(first.clip_event);
        assert!(!second.clip_event);
        assert_eq!(second.clip_event_count, 1);
        assert_eq!(meter.state().clip_event_count, 1);
    }

    #[test]
    fn test_rejects_invalid_config_at_construction() {
        let config = MeterConfig {
            vu_release_ms: 0.0,
            ..MeterConfig::default()
        };
        assert!(matches!(
            Meter::new(&config),
            Err(AudioError::InvalidConfig { field: "meter.vu_release_ms", .. })
        ));
    }

    #[test]
    fn test_tick_without_frame_is_not_an_update() {
        let start = Instant::now();
        let mut session = session(vec![Ok(None)], start);
        assert!(session.tick(start + Duration::from_millis(16)).unwrap().is_none());
        assert!(session.is_running());
    }

    #[test]
    fn test_stall_stops_session() {
        let start = Instant::now();
        let mut session = session(vec![Ok(Some(constant(0.5)))], start);
        assert!(session.tick(start).unwrap().is_some());

        let result = session.tick(start + Duration::from_millis(1500));
        assert!(matches!(result, Err(AudioError::StreamInterrupted(_))));
        assert!(!session.is_running());
        // stopped sessions stay quiet
        assert!(session.tick(start + Duration::from_millis(1516)).unwrap().is_none());
    }

    #[test]
    fn test_source_error_stops_session() {
        let start = Instant::now();
        let mut session = session(
            vec![Err(AudioError::StreamInterrupted("unplugged".into()))],
            start,
        );
        assert!(session.tick(start).is_err());
        assert!(!session.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let start = Instant::now();
        let mut session = session(vec![Ok(Some(constant(0.5)))], start);
        session.tick(start).unwrap();
        let first = session.stop();
        let second = session.stop();
        assert_eq!(first.ticks, 1);
        assert_eq!(second.ticks, 1);
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.device_id.as_deref(), Some("test-mic"));
    }
}
