use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Host, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::frame::{AudioFrame, FrameWindow};
use super::traits::{AudioBackend, DeviceInfo, FrameSource, ToneOutput};
use crate::error::{AudioError, Result};
use crate::tone::{ToneRenderer, ToneSession};

/// Devices from the default cpal host, addressed by device name.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn find_input(&self, device_id: Option<&str>) -> Result<Device> {
        match device_id {
            None => self
                .host
                .default_input_device()
                .ok_or_else(|| AudioError::device(None, "no input device available")),
            Some(id) => self
                .host
                .input_devices()
                .map_err(|e| AudioError::device(Some(id), e))?
                .find(|device| device.name().is_ok_and(|name| name == id))
                .ok_or_else(|| AudioError::device(Some(id), "input device not found")),
        }
    }

    fn find_output(&self, device_id: Option<&str>) -> Result<Device> {
        match device_id {
            None => self
                .host
                .default_output_device()
                .ok_or_else(|| AudioError::OutputUnavailable("no output device available".into())),
            Some(id) => self
                .host
                .output_devices()
                .map_err(|e| AudioError::OutputUnavailable(format!("{}: {}", id, e)))?
                .find(|device| device.name().is_ok_and(|name| name == id))
                .ok_or_else(|| AudioError::OutputUnavailable(format!("{}: device not found", id))),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn list(devices: impl Iterator<Item = Device>, default: Option<Device>) -> Vec<DeviceInfo> {
    let default_name = default.and_then(|device| device.name().ok());
    devices
        .filter_map(|device| device.name().ok())
        .map(|id| DeviceInfo {
            is_default: default_name.as_deref() == Some(id.as_str()),
            id,
        })
        .collect()
}

impl AudioBackend for CpalBackend {
    fn input_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::device(None, e))?;
        Ok(list(devices, self.host.default_input_device()))
    }

    fn output_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        Ok(list(devices, self.host.default_output_device()))
    }

    fn open_capture(&self, device_id: Option<&str>, frame_len: usize) -> Result<Box<dyn FrameSource>> {
        let device = self.find_input(device_id)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::device(device_id, e))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        info!(
            device = %name,
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            ?sample_format,
            "opening capture"
        );

        let shared = Arc::new(Mutex::new(CaptureShared {
            window: FrameWindow::new(frame_len),
            failure: None,
        }));
        let stream = match sample_format {
            SampleFormat::F32 => build_capture::<f32>(&device, &config, Arc::clone(&shared)),
            SampleFormat::I16 => build_capture::<i16>(&device, &config, Arc::clone(&shared)),
            SampleFormat::U16 => build_capture::<u16>(&device, &config, Arc::clone(&shared)),
            other => {
                return Err(AudioError::device(
                    device_id,
                    format!("unsupported sample format {:?}", other),
                ));
            }
        }
        .map_err(|e| AudioError::device(device_id, e))?;
        stream.play().map_err(|e| AudioError::device(device_id, e))?;

        Ok(Box::new(CpalFrameSource {
            _stream: stream,
            shared,
        }))
    }

    fn open_output(
        &self,
        device_id: Option<&str>,
        session: &ToneSession,
        amplitude: f32,
    ) -> Result<Box<dyn ToneOutput>> {
        let device = self.find_output(device_id)?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let renderer = ToneRenderer::new(session.clone(), config.sample_rate.0, amplitude);

        let stream = match sample_format {
            SampleFormat::F32 => build_output::<f32>(&device, &config, renderer),
            SampleFormat::I16 => build_output::<i16>(&device, &config, renderer),
            SampleFormat::U16 => build_output::<u16>(&device, &config, renderer),
            other => {
                return Err(AudioError::OutputUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )));
            }
        }
        .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;

        Ok(Box::new(CpalToneOutput {
            stream: Some(stream),
        }))
    }
}

/// State shared with the capture callback
struct CaptureShared {
    window: FrameWindow,
    failure: Option<String>,
}

/// Live capture stream. Dropping it drops the stream and frees the device.
pub struct CpalFrameSource {
    _stream: Stream,
    shared: Arc<Mutex<CaptureShared>>,
}

impl FrameSource for CpalFrameSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| AudioError::StreamInterrupted("capture state poisoned".into()))?;
        if let Some(reason) = shared.failure.take() {
            return Err(AudioError::StreamInterrupted(reason));
        }
        Ok(shared.window.take_frame())
    }
}

/// Build input stream with a callback that downmixes into the shared window.
/// Runs on the audio thread, so it only copies samples.
fn build_capture<T>(
    device: &Device,
    config: &StreamConfig,
    shared: Arc<Mutex<CaptureShared>>,
) -> std::result::Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let error_shared = Arc::clone(&shared);
    let mut scratch: Vec<f32> = Vec::new();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            scratch.clear();
            scratch.extend(data.iter().map(|&sample| f32::from_sample(sample)));
            if let Ok(mut shared) = shared.lock() {
                shared.window.push_interleaved(&scratch, channels);
            }
        },
        move |err| {
            warn!("capture stream error: {}", err);
            if let Ok(mut shared) = error_shared.lock() {
                shared.failure = Some(err.to_string());
            }
        },
        None,
    )
}

/// Playing tone. `stop` pauses and drops the stream right away.
pub struct CpalToneOutput {
    stream: Option<Stream>,
}

impl ToneOutput for CpalToneOutput {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("failed to pause output stream: {}", e);
            }
        }
    }
}

impl Drop for CpalToneOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_output<T>(
    device: &Device,
    config: &StreamConfig,
    mut renderer: ToneRenderer,
) -> std::result::Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            renderer.render(&mut scratch, channels);
            for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(sample);
            }
        },
        |err| warn!("output stream error: {}", err),
        None,
    )
}
