//! Synthetic frames and footprints for exercising the runner.

pub mod frames;
