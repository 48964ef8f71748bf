pub mod candle;
pub mod interval;

pub use candle::{BandTriple, Candle, IndicatorPoint, TimeRange, VolumeBar};
pub use interval::Interval;
