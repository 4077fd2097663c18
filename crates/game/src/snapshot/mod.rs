mod buffer;
mod interpolation;

pub use buffer::{InterpolationConfig, InterpolationStats, SnapshotBuffer};
pub use interpolation::interpolate;
