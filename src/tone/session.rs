use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use crate::error::{AudioError, Result};

/// Equal-power pan law.
/// progress 0.0 = hard left, 1.0 = hard right; left² + right² == 1 everywhere.
pub fn equal_power_gains(progress: f32) -> (f32, f32) {
    let angle = progress.clamp(0.0, 1.0) * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Equal-power gains for a pan position in [-1, 1].
pub fn pan_gains(pan: f32) -> (f32, f32) {
    equal_power_gains((pan.clamp(-1.0, 1.0) + 1.0) / 2.0)
}

/// Exponential frequency ramp: equal time per octave.
pub fn exponential_sweep(start_hz: f32, end_hz: f32, progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    start_hz * (end_hz / start_hz).powf(p)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToneShape {
    /// Constant frequency with fixed per-channel gains
    Fixed {
        frequency_hz: f32,
        left_gain: f32,
        right_gain: f32,
    },
    /// Constant frequency at a continuous pan position
    Panned { frequency_hz: f32, pan: f32 },
    /// Exponential frequency ramp panned left to right, ends by itself
    Sweep {
        start_hz: f32,
        end_hz: f32,
        duration: Duration,
    },
    /// Left during even intervals, right during odd ones, until stopped
    Alternate { frequency_hz: f32, interval: Duration },
}

/// Gains and frequency of a tone at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneFrame {
    pub frequency_hz: f32,
    pub left_gain: f32,
    pub right_gain: f32,
}

/// Description of one sine test tone. The waveform is always a sine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSession {
    shape: ToneShape,
}

impl ToneSession {
    pub fn fixed(left_gain: f32, right_gain: f32, frequency_hz: f32) -> Result<Self> {
        check_frequency(frequency_hz)?;
        check_gain("left_gain", left_gain)?;
        check_gain("right_gain", right_gain)?;
        Ok(Self {
            shape: ToneShape::Fixed {
                frequency_hz,
                left_gain,
                right_gain,
            },
        })
    }

    pub fn panned(pan: f32, frequency_hz: f32) -> Result<Self> {
        check_frequency(frequency_hz)?;
        if !(-1.0..=1.0).contains(&pan) {
            return Err(AudioError::invalid("pan", format!("{} is outside [-1, 1]", pan)));
        }
        Ok(Self {
            shape: ToneShape::Panned { frequency_hz, pan },
        })
    }

    pub fn sweep(start_hz: f32, end_hz: f32, duration: Duration) -> Result<Self> {
        check_frequency(start_hz)?;
        check_frequency(end_hz)?;
        if duration.is_zero() {
            return Err(AudioError::invalid("sweep_duration", "must be positive"));
        }
        Ok(Self {
            shape: ToneShape::Sweep {
                start_hz,
                end_hz,
                duration,
            },
        })
    }

    pub fn alternate(frequency_hz: f32, interval: Duration) -> Result<Self> {
        check_frequency(frequency_hz)?;
        if interval.is_zero() {
            return Err(AudioError::invalid("alternate_interval", "must be positive"));
        }
        Ok(Self {
            shape: ToneShape::Alternate {
                frequency_hz,
                interval,
            },
        })
    }

    pub fn shape(&self) -> &ToneShape {
        &self.shape
    }

    /// `None` for tones that play until stopped.
    pub fn duration(&self) -> Option<Duration> {
        match self.shape {
            ToneShape::Sweep { duration, .. } => Some(duration),
            _ => None,
        }
    }

    pub fn is_finished(&self, elapsed_secs: f64) -> bool {
        self.duration()
            .is_some_and(|duration| elapsed_secs >= duration.as_secs_f64())
    }

    pub fn at(&self, elapsed_secs: f64) -> ToneFrame {
        match self.shape {
            ToneShape::Fixed {
                frequency_hz,
                left_gain,
                right_gain,
            } => ToneFrame {
                frequency_hz,
                left_gain,
                right_gain,
            },
            ToneShape::Panned { frequency_hz, pan } => {
                let (left_gain, right_gain) = pan_gains(pan);
                ToneFrame {
                    frequency_hz,
                    left_gain,
                    right_gain,
                }
            }
            ToneShape::Sweep {
                start_hz,
                end_hz,
                duration,
            } => {
                let progress = (elapsed_secs / duration.as_secs_f64()).clamp(0.0, 1.0) as f32;
                let (left_gain, right_gain) = equal_power_gains(progress);
                ToneFrame {
                    frequency_hz: exponential_sweep(start_hz, end_hz, progress),
                    left_gain,
                    right_gain,
                }
            }
            ToneShape::Alternate {
                frequency_hz,
                interval,
            } => {
                let slot = (elapsed_secs.max(0.0) / interval.as_secs_f64()).floor() as u64;
                let (left_gain, right_gain) = if slot % 2 == 0 { (1.0, 0.0) } else { (0.0, 1.0) };
                ToneFrame {
                    frequency_hz,
                    left_gain,
                    right_gain,
                }
            }
        }
    }
}

fn check_frequency(frequency_hz: f32) -> Result<()> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Ok(())
    } else {
        Err(AudioError::invalid(
            "frequency_hz",
            format!("{} must be a positive frequency", frequency_hz),
        ))
    }
}

fn check_gain(field: &'static str, gain: f32) -> Result<()> {
    if (0.0..=1.0).contains(&gain) {
        Ok(())
    } else {
        Err(AudioError::invalid(field, format!("{} is outside [0, 1]", gain)))
    }
}
