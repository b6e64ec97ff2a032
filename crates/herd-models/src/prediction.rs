//! Classification result and API response models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::breed::{Breed, Species};

/// Output of the species gate followed by the matching breed model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    /// Species decided by the gate
    pub species: Species,
    /// Raw gate output (cow likelihood), reported as-is for both species
    pub species_score: f32,
    /// Breed drawn from the vocabulary of `species`
    pub breed: Breed,
    /// Breed model probability at the chosen index
    pub breed_confidence: f32,
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    pub animal: Species,
    pub breed: Breed,
    /// Breed-stage probability
    pub confidence: f32,
    /// Raw gate score
    pub animal_confidence: f32,
    /// Husbandry summary, or the enrichment failure message
    pub summary: String,
}

impl PredictionResponse {
    /// Combine a classification with its summary text.
    pub fn new(result: ClassificationResult, summary: impl Into<String>) -> Self {
        Self {
            animal: result.species,
            breed: result.breed,
            confidence: result.breed_confidence,
            animal_confidence: result.species_score,
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_field_names() {
        let result = ClassificationResult {
            species: Species::Buffalo,
            species_score: 0.25,
            breed: Breed::Nagpuri,
            breed_confidence: 0.5,
        };
        let response = PredictionResponse::new(result, "Nagpuri buffaloes are hardy.");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["animal"], "buffalo");
        assert_eq!(json["breed"], "Nagpuri");
        assert_eq!(json["confidence"], 0.5);
        assert_eq!(json["animal_confidence"], 0.25);
        assert_eq!(json["summary"], "Nagpuri buffaloes are hardy.");
    }
}
