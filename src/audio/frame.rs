use std::collections::VecDeque;

/// Most recent capture window, mono samples in [-1.0, 1.0].
/// Owned by a single metering tick and dropped after it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn silent(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f32>> for AudioFrame {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

/// Rolling window of the latest `capacity` samples.
///
/// Capture callbacks push into it; the metering tick takes a snapshot only
/// when new samples arrived since the previous take.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    buffer: VecDeque<f32>,
    capacity: usize,
    fresh: bool,
}

impl FrameWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            // zero-filled so the first frame always has full length
            buffer: std::iter::repeat_n(0.0, capacity).collect(),
            capacity,
            fresh: false,
        }
    }

    pub fn push(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        for &sample in samples {
            if self.buffer.len() == self.capacity {
                self.buffer.pop_front();
            }
            self.buffer.push_back(sample);
        }
        self.fresh = true;
    }

    /// Push interleaved samples, averaging each multi-channel frame to mono.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        if channels <= 1 {
            self.push(data);
            return;
        }
        let mono: Vec<f32> = data
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        self.push(&mono);
    }

    /// Copy out the window if anything new was pushed since the last call.
    pub fn take_frame(&mut self) -> Option<AudioFrame> {
        if !self.fresh {
            return None;
        }
        self.fresh = false;
        Some(AudioFrame::new(self.buffer.iter().copied().collect()))
    }
}
