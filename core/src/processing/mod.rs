pub mod distance;
pub mod signal;

pub use distance::DistanceField;
pub use signal::{dbz_from_signal, rain_rate, reflectivity, DistanceCorrection, SignalProcessor};
