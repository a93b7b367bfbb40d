//! Rainfall estimation core.
//!
//! Turns hourly sets of radar reflectivity frames into mean precipitation-rate
//! grids and writes them on the geometry of a reference footprint raster.

pub mod estimator;
pub mod geo;
pub mod ingest;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use estimator::{HourlyEstimate, RainfallEstimator};
pub use prelude::{RadarError, RadarResult};
