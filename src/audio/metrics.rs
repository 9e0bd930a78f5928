use serde::Serialize;

/// Convert linear amplitude to dBFS.
/// dB = 20 * log10(amp); zero amplitude is -inf, which means "no signal".
pub fn linear_to_db(value: f32) -> f32 {
    if value <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * value.log10()
    }
}

/// Instantaneous level of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    pub rms: f32,
    pub peak: f32,
    /// Samples with |x| >= clip threshold
    pub clipped_samples: usize,
}

impl LevelReading {
    /// Single pass over the frame: sum of squares, max |x| and the clip count.
    pub fn analyze(samples: &[f32], clip_threshold: f32) -> Self {
        if samples.is_empty() {
            return Self {
                rms: 0.0,
                peak: 0.0,
                clipped_samples: 0,
            };
        }
        let mut sum_squares = 0.0f64;
        let mut peak = 0.0f32;
        let mut clipped_samples = 0;
        for &sample in samples {
            let magnitude = sample.abs();
            sum_squares += (sample as f64) * (sample as f64);
            peak = peak.max(magnitude);
            if magnitude >= clip_threshold {
                clipped_samples += 1;
            }
        }
        let rms = (sum_squares / samples.len() as f64).sqrt() as f32;
        Self {
            rms,
            peak,
            clipped_samples,
        }
    }

    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.rms)
    }

    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak)
    }
}

/// Per-tick readout handed to the UI.
/// Non-finite dB values serialize as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub vu_level_db: f32,
    /// 0-100 display position of `vu_level_db`
    pub meter_percent: u8,
    pub held_peak_db: f32,
    pub clip_event_count: u64,
    pub rms_db: f32,
    pub instant_peak_db: f32,
    /// A new debounced clip event fired on this tick
    pub clip_event: bool,
}

impl MeterSnapshot {
    pub fn is_silent(&self) -> bool {
        self.vu_level_db == f32::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(amplitude: f32, len: usize) -> Vec<f32> {
        // 1 kHz at 48 kHz: 48 samples per period
        (0..len)
            .map(|i| amplitude * (2.0 * PI * i as f32 / 48.0).sin())
            .collect()
    }

    #[test]
    fn test_full_scale_sine_levels() {
        let reading = LevelReading::analyze(&sine(1.0, 4800), 0.98);
        assert!(
            (reading.rms_db() - (-3.0103)).abs() < 0.01,
            "rms_db was {}",
            reading.rms_db()
        );
        assert!(reading.peak_db().abs() < 0.01, "peak_db was {}", reading.peak_db());
    }

    #[test]
    fn test_silent_frame_is_negative_infinity() {
        let reading = LevelReading::analyze(&[0.0; 2048], 0.98);
        assert_eq!(reading.rms_db(), f32::NEG_INFINITY);
        assert_eq!(reading.peak_db(), f32::NEG_INFINITY);
        assert_eq!(reading.clipped_samples, 0);
    }

    #[test]
    fn test_counts_samples_at_or_above_threshold() {
        let samples = [0.1, -0.98, 0.99, 0.97, -1.0];
        let reading = LevelReading::analyze(&samples, 0.98);
        assert_eq!(reading.clipped_samples, 3);
        assert_eq!(reading.peak, 1.0);
    }

    #[test]
    fn test_linear_to_db_reference_points() {
        assert_eq!(linear_to_db(1.0), 0.0);
        assert!((linear_to_db(0.5) - (-6.0206)).abs() < 1e-3);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }
}
