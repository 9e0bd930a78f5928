pub mod generator;
pub mod renderer;
pub mod session;

pub use generator::ToneGenerator;
pub use renderer::ToneRenderer;
pub use session::{ToneFrame, ToneSession, ToneShape, equal_power_gains, exponential_sweep, pan_gains};
