use serde::Serialize;

use super::frame::AudioFrame;
use crate::error::Result;
use crate::tone::ToneSession;

// Seams to the capture and playback collaborators

/// Pull-based source of capture windows.
pub trait FrameSource {
    /// `Ok(None)` when no new samples arrived since the previous poll.
    /// `Err` once the underlying stream has failed.
    fn next_frame(&mut self) -> Result<Option<AudioFrame>>;
}

/// Handle to a tone being played on an output device.
/// Dropping the handle must release the device as well.
pub trait ToneOutput {
    /// Halt the oscillator and release output routing. Idempotent.
    fn stop(&mut self);
}

/// Opens devices by opaque id. `None` selects the host default.
pub trait AudioBackend {
    fn input_devices(&self) -> Result<Vec<DeviceInfo>>;
    fn output_devices(&self) -> Result<Vec<DeviceInfo>>;
    fn open_capture(&self, device_id: Option<&str>, frame_len: usize) -> Result<Box<dyn FrameSource>>;
    fn open_output(
        &self,
        device_id: Option<&str>,
        session: &ToneSession,
        amplitude: f32,
    ) -> Result<Box<dyn ToneOutput>>;
}

/// Device listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: String,
    pub is_default: bool,
}

impl DeviceInfo {
    pub fn print_summary(&self) {
        let marker = if self.is_default { " (default)" } else { "" };
        println!("  {}{}", self.id, marker);
    }
}
