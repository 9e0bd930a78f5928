/// Maps dB readings onto a 0-100 display scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterScale {
    min_db: f32,
    max_db: f32,
}

impl MeterScale {
    /// Caller guarantees `min_db < max_db`, both finite (checked by config validation).
    pub fn new(min_db: f32, max_db: f32) -> Self {
        Self { min_db, max_db }
    }

    /// Clamp into the window then rescale linearly. -inf maps to 0.
    pub fn percent(&self, db: f32) -> u8 {
        if db.is_nan() {
            return 0;
        }
        let clamped = db.clamp(self.min_db, self.max_db);
        let pct = ((clamped - self.min_db) / (self.max_db - self.min_db) * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    pub fn min_db(&self) -> f32 {
        self.min_db
    }

    pub fn max_db(&self) -> f32 {
        self.max_db
    }
}

impl Default for MeterScale {
    fn default() -> Self {
        Self::new(-60.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_edges() {
        let scale = MeterScale::default();
        assert_eq!(scale.percent(-60.0), 0);
        assert_eq!(scale.percent(0.0), 100);
        assert_eq!(scale.percent(-30.0), 50);
    }

    #[test]
    fn test_out_of_window_clamps() {
        let scale = MeterScale::default();
        assert_eq!(scale.percent(f32::NEG_INFINITY), 0);
        assert_eq!(scale.percent(-200.0), 0);
        assert_eq!(scale.percent(6.0), 100);
        assert_eq!(scale.percent(f32::INFINITY), 100);
    }

    #[test]
    fn test_monotonic_between_edges() {
        let scale = MeterScale::new(-48.0, -3.0);
        let mut previous = 0;
        let mut db = -48.0;
        while db <= -3.0 {
            let pct = scale.percent(db);
            assert!(pct >= previous, "{} dB mapped to {} after {}", db, pct, previous);
            previous = pct;
            db += 0.25;
        }
        assert_eq!(previous, 100);
    }
}
