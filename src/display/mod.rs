pub mod meter;
pub mod scale;

pub use meter::AudioMeter;
pub use scale::MeterScale;
