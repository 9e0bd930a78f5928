use std::time::Duration;

/// Target used for the release when the instantaneous level is -inf,
/// so one silent frame doesn't collapse the reading.
pub const SILENCE_FLOOR_DB: f32 = -120.0;

/// VU ballistics: asymmetric attack/release exponential smoothing in dB.
///
/// -Rising input follows the attack constant, falling input the release
/// -alpha = 1 - exp(-dt / tau)
/// -The first finite level seeds the reading directly, no ramp from silence
#[derive(Debug, Clone)]
pub struct VuBallistics {
    attack_secs: f32,
    release_secs: f32,
    level_db: f32,
}

impl VuBallistics {
    pub fn new(attack: Duration, release: Duration) -> Self {
        Self {
            attack_secs: attack.as_secs_f32(),
            release_secs: release.as_secs_f32(),
            level_db: f32::NEG_INFINITY,
        }
    }

    /// Fold one instantaneous level into the smoothed reading.
    pub fn update(&mut self, instant_db: f32, dt: Duration) -> f32 {
        if self.level_db == f32::NEG_INFINITY {
            // seed; stays -inf until the first real signal
            self.level_db = instant_db;
            return self.level_db;
        }

        let target = if instant_db == f32::NEG_INFINITY {
            SILENCE_FLOOR_DB
        } else {
            instant_db
        };
        let tau = if target > self.level_db {
            self.attack_secs
        } else {
            self.release_secs
        };
        let alpha = 1.0 - (-dt.as_secs_f32() / tau).exp();
        self.level_db += alpha * (target - self.level_db);
        self.level_db
    }

    pub fn value(&self) -> f32 {
        self.level_db
    }

    pub fn reset(&mut self) {
        self.level_db = f32::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_micros(16_667);

    fn meter() -> VuBallistics {
        VuBallistics::new(Duration::from_millis(80), Duration::from_millis(400))
    }

    /// Ticks until the reading is within 1 dB of `target`.
    fn ticks_to_settle(ballistics: &mut VuBallistics, target: f32) -> usize {
        for tick in 1..10_000 {
            if (ballistics.update(target, TICK) - target).abs() <= 1.0 {
                return tick;
            }
        }
        panic!("never settled at {}", target);
    }

    #[test]
    fn test_first_level_seeds_directly() {
        let mut vu = meter();
        assert_eq!(vu.value(), f32::NEG_INFINITY);
        assert_eq!(vu.update(-10.0, TICK), -10.0);
    }

    #[test]
    fn test_silence_before_signal_stays_negative_infinity() {
        let mut vu = meter();
        assert_eq!(vu.update(f32::NEG_INFINITY, TICK), f32::NEG_INFINITY);
        assert_eq!(vu.update(-20.0, TICK), -20.0);
    }

    #[test]
    fn test_attack_settles_faster_than_release() {
        let mut rising = meter();
        rising.update(-40.0, TICK);
        let attack_ticks = ticks_to_settle(&mut rising, -10.0);

        let mut falling = meter();
        falling.update(-10.0, TICK);
        let release_ticks = ticks_to_settle(&mut falling, -40.0);

        assert!(
            attack_ticks < release_ticks,
            "attack took {} ticks, release took {}",
            attack_ticks,
            release_ticks
        );
    }

    #[test]
    fn test_single_step_matches_exponential_law() {
        let mut vu = meter();
        vu.update(-30.0, TICK);
        let dt = Duration::from_millis(80);
        let next = vu.update(-10.0, dt);
        // one attack time constant covers 1 - 1/e of the step
        let expected = -30.0 + (1.0 - (-1.0f32).exp()) * 20.0;
        assert!((next - expected).abs() < 1e-3, "got {}, expected {}", next, expected);
    }

    #[test]
    fn test_silence_after_signal_releases_gradually() {
        let mut vu = meter();
        vu.update(-10.0, TICK);
        let after = vu.update(f32::NEG_INFINITY, TICK);
        assert!(after.is_finite());
        assert!(after < -10.0 && after > -20.0, "dropped to {}", after);
    }

    #[test]
    fn test_zero_dt_holds_value() {
        let mut vu = meter();
        vu.update(-12.0, TICK);
        assert_eq!(vu.update(0.0, Duration::ZERO), -12.0);
    }
}
