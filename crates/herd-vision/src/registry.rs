//! Process-wide registry of the three classifiers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use herd_models::Species;
use tracing::info;

use crate::classifier::{Classifier, OrtClassifier};
use crate::error::VisionResult;

/// Locations of the model artifacts.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Cow vs buffalo gate (sigmoid output)
    pub gate: PathBuf,
    /// Cow breed model (5-way softmax)
    pub cow_breed: PathBuf,
    /// Buffalo breed model (5-way softmax)
    pub buffalo_breed: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            gate: PathBuf::from("models/buffalo_vs_cow_model.onnx"),
            cow_breed: PathBuf::from("models/cow_breed.onnx"),
            buffalo_breed: PathBuf::from("models/buffalo_breed.onnx"),
        }
    }
}

impl ModelPaths {
    /// Create paths from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gate: env_path("GATE_MODEL_PATH").unwrap_or(defaults.gate),
            cow_breed: env_path("COW_MODEL_PATH").unwrap_or(defaults.cow_breed),
            buffalo_breed: env_path("BUFFALO_MODEL_PATH").unwrap_or(defaults.buffalo_breed),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// The species gate and both breed models, immutable once built.
#[derive(Clone)]
pub struct ModelRegistry {
    gate: Arc<dyn Classifier>,
    cow_breed: Arc<dyn Classifier>,
    buffalo_breed: Arc<dyn Classifier>,
}

impl ModelRegistry {
    /// Build a registry from already constructed classifiers.
    pub fn new(
        gate: Arc<dyn Classifier>,
        cow_breed: Arc<dyn Classifier>,
        buffalo_breed: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            gate,
            cow_breed,
            buffalo_breed,
        }
    }

    /// Load all three ONNX models. Any failure aborts the whole load.
    pub fn load(paths: &ModelPaths) -> VisionResult<Self> {
        let gate = load_one("species_gate", &paths.gate)?;
        let cow_breed = load_one("cow_breed", &paths.cow_breed)?;
        let buffalo_breed = load_one("buffalo_breed", &paths.buffalo_breed)?;

        info!("Model registry loaded (gate, cow_breed, buffalo_breed)");

        Ok(Self::new(gate, cow_breed, buffalo_breed))
    }

    /// Species gate classifier.
    pub fn gate(&self) -> &dyn Classifier {
        self.gate.as_ref()
    }

    /// Breed classifier for `species`.
    pub fn breed_model(&self, species: Species) -> &dyn Classifier {
        match species {
            Species::Cow => self.cow_breed.as_ref(),
            Species::Buffalo => self.buffalo_breed.as_ref(),
        }
    }
}

fn load_one(name: &str, path: &Path) -> VisionResult<Arc<dyn Classifier>> {
    Ok(Arc::new(OrtClassifier::load(name, path)?))
}
