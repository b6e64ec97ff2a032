//! Shared data models for the HerdSense breed classifier.
//!
//! This crate provides Serde-serializable types for:
//! - Species and the per-species breed vocabularies
//! - Cascade classification results
//! - The prediction response returned to API callers

pub mod breed;
pub mod prediction;

// Re-export common types
pub use breed::{Breed, Species, BUFFALO_BREEDS, COW_BREEDS, GATE_THRESHOLD};
pub use prediction::{ClassificationResult, PredictionResponse};
