//! Prompt template for breed summaries.

use herd_models::Breed;

/// Build the veterinary summary prompt for `breed`.
pub fn build_breed_prompt(breed: Breed) -> String {
    format!(
        "Assume you are an experienced animal doctor. \
         Provide a brief, clear summary of the animal breed '{breed}' for Indian farmers. \
         Include the following details in short bullet points: average weight, height, \
         typical diet, common vaccines, and essential care tips. \
         Keep it concise and easy to understand.",
        breed = breed.as_str()
    )
}
