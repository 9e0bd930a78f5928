use std::f64::consts::TAU;

use super::session::ToneSession;

/// Sample-accurate sine renderer for one tone session.
///
/// Time advances with the sample clock, not the wall clock, so the output
/// for a given session is fully deterministic. Phase accumulates per sample.
#[derive(Debug, Clone)]
pub struct ToneRenderer {
    session: ToneSession,
    sample_rate: f64,
    amplitude: f32,
    phase: f64,
    samples_rendered: u64,
}

impl ToneRenderer {
    pub fn new(session: ToneSession, sample_rate: u32, amplitude: f32) -> Self {
        Self {
            session,
            sample_rate: sample_rate.max(1) as f64,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
            samples_rendered: 0,
        }
    }

    /// Fill an interleaved buffer. Channel 0 is left, channel 1 right,
    /// any further channels stay silent. Mono devices get the louder side.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let elapsed = self.elapsed_secs();
            frame.fill(0.0);
            if !self.session.is_finished(elapsed) {
                let tone = self.session.at(elapsed);
                let value = self.amplitude * self.phase.sin() as f32;
                if frame.len() < 2 {
                    frame[0] = value * tone.left_gain.max(tone.right_gain);
                } else {
                    frame[0] = value * tone.left_gain;
                    frame[1] = value * tone.right_gain;
                }
                self.phase = (self.phase + TAU * tone.frequency_hz as f64 / self.sample_rate) % TAU;
            }
            self.samples_rendered += 1;
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.samples_rendered as f64 / self.sample_rate
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished(self.elapsed_secs())
    }

    pub fn session(&self) -> &ToneSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn left_right(buffer: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let left = buffer.iter().step_by(2).copied().collect();
        let right = buffer.iter().skip(1).step_by(2).copied().collect();
        (left, right)
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_left_only_tone() {
        let session = ToneSession::fixed(1.0, 0.0, 1000.0).unwrap();
        let mut renderer = ToneRenderer::new(session, 48_000, 0.5);
        let mut buffer = vec![0.0; 2 * 4800];
        renderer.render(&mut buffer, 2);

        let (left, right) = left_right(&buffer);
        assert!((peak(&left) - 0.5).abs() < 1e-3, "left peak {}", peak(&left));
        assert_eq!(peak(&right), 0.0);
        assert!((renderer.elapsed_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_goes_silent_after_duration() {
        let session = ToneSession::sweep(200.0, 2000.0, Duration::from_millis(100)).unwrap();
        let mut renderer = ToneRenderer::new(session, 48_000, 1.0);
        let mut buffer = vec![0.0; 2 * 4800];
        renderer.render(&mut buffer, 2);
        assert!(renderer.is_finished());

        let mut tail = vec![1.0; 2 * 480];
        renderer.render(&mut tail, 2);
        assert!(tail.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_sweep_moves_energy_from_left_to_right() {
        let session = ToneSession::sweep(200.0, 2000.0, Duration::from_secs(1)).unwrap();
        let mut renderer = ToneRenderer::new(session, 48_000, 1.0);
        let mut start = vec![0.0; 2 * 4800];
        renderer.render(&mut start, 2);
        let mut skip = vec![0.0; 2 * 33_600];
        renderer.render(&mut skip, 2);
        let mut end = vec![0.0; 2 * 4800];
        renderer.render(&mut end, 2);

        let (start_left, start_right) = left_right(&start);
        let (end_left, end_right) = left_right(&end);
        assert!(peak(&start_left) > peak(&start_right));
        assert!(peak(&end_right) > peak(&end_left));
    }

    #[test]
    fn test_extra_channels_stay_silent() {
        let session = ToneSession::fixed(1.0, 1.0, 440.0).unwrap();
        let mut renderer = ToneRenderer::new(session, 44_100, 1.0);
        let mut buffer = vec![1.0; 4 * 256];
        renderer.render(&mut buffer, 4);
        assert!(buffer.chunks(4).all(|frame| frame[2] == 0.0 && frame[3] == 0.0));
    }
}
