pub mod stats;

pub use stats::FieldStats;
