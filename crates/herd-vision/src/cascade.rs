//! Species gate followed by the species-specific breed model.

use std::sync::Arc;

use herd_models::{Breed, ClassificationResult, Species};
use tracing::debug;

use crate::error::{VisionError, VisionResult};
use crate::preprocess::ImageTensor;
use crate::registry::ModelRegistry;

/// Index and value of the largest element. The first maximum wins ties.
///
/// Returns `None` for an empty slice or when any value is NaN.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((index, value)),
        }
    }
    best
}

fn ensure_probability(model: &str, value: f32) -> VisionResult<f32> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(VisionError::inference(format!(
            "{} produced out-of-range probability {}",
            model, value
        )))
    }
}

/// Two-stage classifier over a shared [`ModelRegistry`].
#[derive(Clone)]
pub struct CascadeClassifier {
    registry: Arc<ModelRegistry>,
}

impl CascadeClassifier {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Run the gate, then the breed model of the resolved species.
    pub fn classify(&self, tensor: &ImageTensor) -> VisionResult<ClassificationResult> {
        let gate_output = self.registry.gate().predict(tensor)?;
        let species_score = gate_output
            .first()
            .copied()
            .ok_or_else(|| VisionError::inference("species gate returned no output"))?;
        let species_score = ensure_probability("species gate", species_score)?;
        let species = Species::from_gate_score(species_score);

        let breed_output = self.registry.breed_model(species).predict(tensor)?;
        let vocabulary = species.breeds();
        if breed_output.len() != vocabulary.len() {
            return Err(VisionError::inference(format!(
                "{} breed model returned {} values, expected {}",
                species,
                breed_output.len(),
                vocabulary.len()
            )));
        }

        let (index, breed_confidence) = argmax(&breed_output)
            .ok_or_else(|| VisionError::inference(format!("{} breed model returned NaN", species)))?;
        let breed_confidence = ensure_probability("breed model", breed_confidence)?;
        let breed = Breed::from_index(species, index)
            .ok_or_else(|| VisionError::inference(format!("breed index {} out of range", index)))?;

        debug!(
            species = %species,
            species_score,
            breed = %breed,
            breed_confidence,
            "Cascade classification complete"
        );

        Ok(ClassificationResult {
            species,
            species_score,
            breed,
            breed_confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed vector and counts its calls.
    struct FixedClassifier {
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(output: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                output,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, _input: &ImageTensor) -> VisionResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(&self, _input: &ImageTensor) -> VisionResult<Vec<f32>> {
            Err(VisionError::inference("shape mismatch"))
        }
    }

    fn cascade(
        gate: Arc<FixedClassifier>,
        cow: Arc<FixedClassifier>,
        buffalo: Arc<FixedClassifier>,
    ) -> CascadeClassifier {
        CascadeClassifier::new(Arc::new(ModelRegistry::new(gate, cow, buffalo)))
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some((1, 0.4)));
        assert_eq!(argmax(&[0.9]), Some((0, 0.9)));
        assert_eq!(argmax(&[0.2, 0.2, 0.2, 0.2, 0.2]), Some((0, 0.2)));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.1, f32::NAN]), None);
    }

    #[test]
    fn test_buffalo_path() {
        let gate = FixedClassifier::new(vec![0.2]);
        let cow = FixedClassifier::new(vec![0.2; 5]);
        let buffalo = FixedClassifier::new(vec![0.05, 0.1, 0.7, 0.1, 0.05]);
        let classifier = cascade(gate, cow.clone(), buffalo.clone());

        let result = classifier.classify(&ImageTensor::zeros()).unwrap();

        assert_eq!(result.species, Species::Buffalo);
        assert_eq!(result.species_score, 0.2);
        assert_eq!(result.breed, Breed::Nagpuri);
        assert_eq!(result.breed_confidence, 0.7);
        assert_eq!(cow.calls(), 0);
        assert_eq!(buffalo.calls(), 1);
    }

    #[test]
    fn test_cow_path_reports_raw_gate_score() {
        let gate = FixedClassifier::new(vec![0.91]);
        let cow = FixedClassifier::new(vec![0.1, 0.1, 0.1, 0.1, 0.6]);
        let buffalo = FixedClassifier::new(vec![0.2; 5]);
        let classifier = cascade(gate, cow.clone(), buffalo.clone());

        let result = classifier.classify(&ImageTensor::zeros()).unwrap();

        assert_eq!(result.species, Species::Cow);
        assert_eq!(result.species_score, 0.91);
        assert_eq!(result.breed, Breed::RedSindhi);
        assert_eq!(buffalo.calls(), 0);
    }

    #[test]
    fn test_gate_tie_resolves_to_cow() {
        let classifier = cascade(
            FixedClassifier::new(vec![0.5]),
            FixedClassifier::new(vec![0.3, 0.3, 0.2, 0.1, 0.1]),
            FixedClassifier::new(vec![0.2; 5]),
        );

        let result = classifier.classify(&ImageTensor::zeros()).unwrap();

        assert_eq!(result.species, Species::Cow);
        assert_eq!(result.breed, Breed::Ayshire);
        assert_eq!(result.breed_confidence, 0.3);
    }

    #[test]
    fn test_breed_always_in_species_vocabulary() {
        for step in 0..=20 {
            let p = step as f32 / 20.0;
            for hot in 0..5 {
                let mut probs = vec![0.05; 5];
                probs[hot] = 0.8;
                let classifier = cascade(
                    FixedClassifier::new(vec![p]),
                    FixedClassifier::new(probs.clone()),
                    FixedClassifier::new(probs),
                );

                let result = classifier.classify(&ImageTensor::zeros()).unwrap();
                assert_eq!(result.breed.species(), result.species);
                assert!(result.species.breeds().contains(&result.breed));
                assert!((0.0..=1.0).contains(&result.breed_confidence));
                assert!((0.0..=1.0).contains(&result.species_score));
            }
        }
    }

    #[test]
    fn test_wrong_breed_vector_length() {
        let classifier = cascade(
            FixedClassifier::new(vec![0.9]),
            FixedClassifier::new(vec![0.5, 0.5]),
            FixedClassifier::new(vec![0.2; 5]),
        );

        let err = classifier.classify(&ImageTensor::zeros()).unwrap_err();
        assert!(matches!(err, VisionError::Inference(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_empty_gate_output() {
        let classifier = cascade(
            FixedClassifier::new(vec![]),
            FixedClassifier::new(vec![0.2; 5]),
            FixedClassifier::new(vec![0.2; 5]),
        );

        assert!(matches!(
            classifier.classify(&ImageTensor::zeros()),
            Err(VisionError::Inference(_))
        ));
    }

    #[test]
    fn test_out_of_range_gate_score() {
        let classifier = cascade(
            FixedClassifier::new(vec![1.7]),
            FixedClassifier::new(vec![0.2; 5]),
            FixedClassifier::new(vec![0.2; 5]),
        );

        assert!(matches!(
            classifier.classify(&ImageTensor::zeros()),
            Err(VisionError::Inference(_))
        ));
    }

    #[test]
    fn test_out_of_range_breed_confidence() {
        for breed_output in [vec![1.4, 0.1, 0.1, 0.1, 0.1], vec![-0.3, -0.5, -0.4, -0.6, -0.9]] {
            let classifier = cascade(
                FixedClassifier::new(vec![0.3]),
                FixedClassifier::new(vec![0.2; 5]),
                FixedClassifier::new(breed_output),
            );

            let err = classifier.classify(&ImageTensor::zeros()).unwrap_err();
            assert!(matches!(err, VisionError::Inference(_)), "{err}");
        }
    }

    #[test]
    fn test_nan_breed_output() {
        let classifier = cascade(
            FixedClassifier::new(vec![0.9]),
            FixedClassifier::new(vec![0.2, f32::NAN, 0.2, 0.2, 0.2]),
            FixedClassifier::new(vec![0.2; 5]),
        );

        assert!(matches!(
            classifier.classify(&ImageTensor::zeros()),
            Err(VisionError::Inference(_))
        ));
    }

    #[test]
    fn test_model_failure_propagates() {
        let registry = ModelRegistry::new(
            Arc::new(FailingClassifier),
            FixedClassifier::new(vec![0.2; 5]),
            FixedClassifier::new(vec![0.2; 5]),
        );
        let classifier = CascadeClassifier::new(Arc::new(registry));

        let err = classifier.classify(&ImageTensor::zeros()).unwrap_err();
        assert_eq!(err.to_string(), "Inference failed: shape mismatch");
    }
}
