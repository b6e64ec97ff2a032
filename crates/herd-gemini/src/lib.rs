//! Gemini client for breed husbandry summaries.
//!
//! Callers treat enrichment as best-effort: a failed [`BreedSummarizer::summarize`]
//! is reported in the summary text instead of failing the prediction.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{BreedSummarizer, GeminiClient, GeminiConfig};
pub use error::{EnrichError, EnrichResult};
pub use prompt::build_breed_prompt;
