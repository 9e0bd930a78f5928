use std::time::{Duration, Instant};

/// Debounced clip detection.
///
/// A frame qualifies when at least `min_samples` samples hit the clip
/// threshold. Qualifying frames closer than `debounce` to the previous
/// event are folded into it, so a sustained overload counts once.
#[derive(Debug, Clone)]
pub struct ClipDetector {
    min_samples: usize,
    debounce: Duration,
    event_count: u64,
    last_event_at: Option<Instant>,
}

impl ClipDetector {
    pub fn new(min_samples: usize, debounce: Duration) -> Self {
        Self {
            min_samples,
            debounce,
            event_count: 0,
            last_event_at: None,
        }
    }

    /// Returns true when this frame registered a new clip event.
    pub fn update(&mut self, clipped_samples: usize, now: Instant) -> bool {
        if clipped_samples < self.min_samples {
            return false;
        }
        let debounced = match self.last_event_at {
            Some(last) => now.saturating_duration_since(last) <= self.debounce,
            None => false,
        };
        if debounced {
            return false;
        }
        self.event_count += 1;
        self.last_event_at = Some(now);
        true
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn last_event_at(&self) -> Option<Instant> {
        self.last_event_at
    }
}
