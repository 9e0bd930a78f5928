use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakState {
    Holding,
    Decaying,
}

/// Peak hold with linear dB decay.
///
/// A new peak above the held value is latched and held for `hold`.
/// After that the held value falls at `decay_db_per_sec`, measured from
/// the moment the hold expired, but never below the current instantaneous peak.
#[derive(Debug, Clone)]
pub struct PeakHoldTracker {
    hold: Duration,
    decay_db_per_sec: f32,
    held_db: f32,
    /// Value latched when the hold started; decay is computed from it
    latched_db: f32,
    hold_expires_at: Option<Instant>,
    state: PeakState,
}

impl PeakHoldTracker {
    pub fn new(hold: Duration, decay_db_per_sec: f32) -> Self {
        Self {
            hold,
            decay_db_per_sec,
            held_db: f32::NEG_INFINITY,
            latched_db: f32::NEG_INFINITY,
            hold_expires_at: None,
            state: PeakState::Decaying,
        }
    }

    pub fn update(&mut self, instant_db: f32, now: Instant) -> f32 {
        if instant_db > self.held_db {
            self.state = PeakState::Holding;
            self.held_db = instant_db;
            self.latched_db = instant_db;
            self.hold_expires_at = Some(now + self.hold);
            return self.held_db;
        }

        match self.hold_expires_at {
            Some(expires_at) if now > expires_at => {
                self.state = PeakState::Decaying;
                let since_expiry = now.duration_since(expires_at).as_secs_f32();
                let decayed = self.latched_db - self.decay_db_per_sec * since_expiry;
                self.held_db = decayed.max(instant_db);
            }
            Some(_) => self.state = PeakState::Holding,
            // nothing latched yet, only silence so far
            None => self.state = PeakState::Decaying,
        }
        self.held_db
    }

    pub fn value(&self) -> f32 {
        self.held_db
    }

    pub fn state(&self) -> PeakState {
        self.state
    }

    pub fn hold_expires_at(&self) -> Option<Instant> {
        self.hold_expires_at
    }
}
