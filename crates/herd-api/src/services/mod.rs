//! Business logic services.

pub mod prediction;

pub use prediction::PredictionService;
