pub mod ballistics;
pub mod clip;
pub mod device;
pub mod frame;
pub mod metrics;
pub mod peak_hold;
pub mod processor;
pub mod traits;

pub use ballistics::VuBallistics;
pub use clip::ClipDetector;
pub use device::CpalBackend;
pub use frame::{AudioFrame, FrameWindow};
pub use metrics::{LevelReading, MeterSnapshot, linear_to_db};
pub use peak_hold::{PeakHoldTracker, PeakState};
pub use processor::{Meter, MeterSession, MeterState, SessionSummary};
pub use traits::{AudioBackend, DeviceInfo, FrameSource, ToneOutput};
