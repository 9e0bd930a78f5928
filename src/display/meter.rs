use crate::audio::MeterSnapshot;
use std::io::{self, Write};

/// Single-line terminal meter, redrawn in place every tick.
pub struct AudioMeter {
    frame_count: u64,
    bar_length: usize,
    initialized: bool,
}

impl AudioMeter {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            bar_length: 40,
            initialized: false,
        }
    }

    pub fn display(&mut self, snapshot: &MeterSnapshot) -> io::Result<()> {
        self.frame_count += 1;
        let mut stdout = io::stdout().lock();
        if !self.initialized {
            writeln!(stdout)?;
            self.initialized = true;
        }
        write!(stdout, "\x1b[2K\r{}", self.render_line(snapshot))?;
        stdout.flush()
    }

    /// Move off the meter line once the session ends.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.initialized {
            writeln!(io::stdout())?;
            self.initialized = false;
        }
        Ok(())
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frame_count
    }

    pub fn render_line(&self, snapshot: &MeterSnapshot) -> String {
        let filled_length = snapshot.meter_percent as usize * self.bar_length / 100;
        format!(
            "Mic: [{}] VU:{} Peak:{} | {} | clips:{}{}",
            self.create_bar(filled_length),
            format_db(snapshot.vu_level_db),
            format_db(snapshot.held_peak_db),
            signal_strength(snapshot.vu_level_db),
            snapshot.clip_event_count,
            if snapshot.clip_event { " CLIP!" } else { "" },
        )
    }

    fn create_bar(&self, filled_length: usize) -> String {
        let filled_length = filled_length.min(self.bar_length);
        "█".repeat(filled_length) + &" ".repeat(self.bar_length - filled_length)
    }
}

impl Default for AudioMeter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_db(db: f32) -> String {
    if db.is_finite() {
        format!("{:>6.1}dB", db)
    } else {
        "  -infdB".to_string()
    }
}

fn signal_strength(db: f32) -> &'static str {
    match db {
        db if db > -6.0 => "HOT",
        db if db > -20.0 => "LOUD",
        db if db > -35.0 => "GOOD",
        db if db > -50.0 => "LOW",
        _ => "SILENCE",
    }
}
