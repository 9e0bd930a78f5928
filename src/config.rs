use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AudioError, Result};

/// Top level tunables, loaded from an optional JSON file.
/// Any field missing from the file keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub meter: MeterConfig,
    pub tone: ToneConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AudioError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AudioError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.meter.validate()?;
        self.tone.validate()
    }
}

/// Metering constants. Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub vu_attack_ms: f32,
    pub vu_release_ms: f32,
    pub peak_hold_ms: u64,
    pub peak_decay_db_per_sec: f32,
    /// Linear amplitude in (0, 1]
    pub clip_threshold: f32,
    /// Over-threshold samples needed within one frame
    pub clip_min_samples: usize,
    pub clip_debounce_ms: u64,
    pub meter_min_db: f32,
    pub meter_max_db: f32,
    /// Samples per analysis window
    pub frame_len: usize,
    /// No new frame for this long ends the session
    pub stall_timeout_ms: u64,
    pub tick_hz: u32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            vu_attack_ms: 80.0,
            vu_release_ms: 400.0,
            peak_hold_ms: 1200,
            peak_decay_db_per_sec: 20.0,
            clip_threshold: 0.98,
            clip_min_samples: 3,
            clip_debounce_ms: 200,
            meter_min_db: -60.0,
            meter_max_db: 0.0,
            frame_len: 2048,
            stall_timeout_ms: 1000,
            tick_hz: 60,
        }
    }
}

impl MeterConfig {
    pub fn validate(&self) -> Result<()> {
        positive("meter.vu_attack_ms", self.vu_attack_ms)?;
        positive("meter.vu_release_ms", self.vu_release_ms)?;
        positive("meter.peak_decay_db_per_sec", self.peak_decay_db_per_sec)?;
        if !(self.clip_threshold > 0.0 && self.clip_threshold <= 1.0) {
            return Err(AudioError::invalid(
                "meter.clip_threshold",
                format!("{} is outside (0, 1]", self.clip_threshold),
            ));
        }
        if self.clip_min_samples == 0 {
            return Err(AudioError::invalid("meter.clip_min_samples", "must be at least 1"));
        }
        if !self.meter_min_db.is_finite() || !self.meter_max_db.is_finite() {
            return Err(AudioError::invalid("meter.meter_min_db", "dB window must be finite"));
        }
        if self.meter_min_db >= self.meter_max_db {
            return Err(AudioError::invalid(
                "meter.meter_min_db",
                format!("{} must be below meter_max_db {}", self.meter_min_db, self.meter_max_db),
            ));
        }
        if self.frame_len == 0 {
            return Err(AudioError::invalid("meter.frame_len", "must be at least 1"));
        }
        if self.stall_timeout_ms == 0 {
            return Err(AudioError::invalid("meter.stall_timeout_ms", "must be positive"));
        }
        if self.tick_hz == 0 {
            return Err(AudioError::invalid("meter.tick_hz", "must be positive"));
        }
        Ok(())
    }

    pub fn vu_attack(&self) -> Duration {
        Duration::from_secs_f32(self.vu_attack_ms / 1000.0)
    }

    pub fn vu_release(&self) -> Duration {
        Duration::from_secs_f32(self.vu_release_ms / 1000.0)
    }

    pub fn peak_hold(&self) -> Duration {
        Duration::from_millis(self.peak_hold_ms)
    }

    pub fn clip_debounce(&self) -> Duration {
        Duration::from_millis(self.clip_debounce_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz as f64)
    }
}

/// Test tone settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub frequency_hz: f32,
    /// Master gain applied to every tone, [0, 1]
    pub amplitude: f32,
    pub sweep_start_hz: f32,
    pub sweep_end_hz: f32,
    pub sweep_duration_ms: u64,
    pub alternate_interval_ms: u64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            amplitude: 0.5,
            sweep_start_hz: 200.0,
            sweep_end_hz: 2000.0,
            sweep_duration_ms: 4000,
            alternate_interval_ms: 500,
        }
    }
}

impl ToneConfig {
    pub fn validate(&self) -> Result<()> {
        positive("tone.frequency_hz", self.frequency_hz)?;
        positive("tone.sweep_start_hz", self.sweep_start_hz)?;
        positive("tone.sweep_end_hz", self.sweep_end_hz)?;
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(AudioError::invalid(
                "tone.amplitude",
                format!("{} is outside [0, 1]", self.amplitude),
            ));
        }
        if self.sweep_duration_ms == 0 {
            return Err(AudioError::invalid("tone.sweep_duration_ms", "must be positive"));
        }
        if self.alternate_interval_ms == 0 {
            return Err(AudioError::invalid("tone.alternate_interval_ms", "must be positive"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AudioError::invalid(field, format!("{} must be a positive number", value)))
    }
}
