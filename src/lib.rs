pub mod audio;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod tone;

pub use audio::{AudioBackend, AudioFrame, CpalBackend, Meter, MeterSession, MeterSnapshot};
pub use config::{Config, MeterConfig, ToneConfig};
pub use display::{AudioMeter, MeterScale};
pub use engine::AudioCheck;
pub use error::{AudioError, Result};
pub use tone::{ToneGenerator, ToneSession};
