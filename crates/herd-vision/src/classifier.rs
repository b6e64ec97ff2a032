//! Classifier abstraction and its ONNX Runtime implementation.

use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{DynValue, Tensor};
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::preprocess::ImageTensor;

/// A trained model seen as a pure function: tensor in, probability vector out.
///
/// Implementations must be safe to call from several requests at once.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> VisionResult<Vec<f32>>;
}

/// Classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so concurrent callers are
/// serialized on the session mutex.
pub struct OrtClassifier {
    name: String,
    session: Mutex<Session>,
    output_name: String,
}

impl OrtClassifier {
    /// Load a model from an `.onnx` file.
    ///
    /// Returns error if the file doesn't exist or cannot be deserialized.
    pub fn load(name: impl Into<String>, model_path: &Path) -> VisionResult<Self> {
        let name = name.into();
        if !model_path.exists() {
            return Err(VisionError::model_not_found(model_path.display().to_string()));
        }

        let session = create_session(model_path)?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| VisionError::model_load(format!("{} declares no outputs", name)))?;

        info!(
            model = %name,
            model_path = %model_path.display(),
            output = %output_name,
            "Classifier loaded"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Classifier for OrtClassifier {
    fn predict(&self, input: &ImageTensor) -> VisionResult<Vec<f32>> {
        let shape = input.shape().to_vec();
        let data = input.as_slice().to_vec();
        let tensor = Tensor::from_array((shape, data.into_boxed_slice()))
            .map(DynValue::from)
            .map_err(|e| VisionError::inference(format!("Failed to create tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::inference("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::inference(format!("{} inference failed: {}", self.name, e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| VisionError::inference(format!("Missing {} tensor", self.output_name)))?;

        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::inference(format!("Failed to extract tensor: {}", e)))?;

        let probabilities: Vec<f32> = tensor.1.iter().copied().collect();
        debug!(model = %self.name, values = probabilities.len(), "Classifier evaluated");

        Ok(probabilities)
    }
}

/// Create an ONNX Runtime session, preferring CUDA when built with the `cuda` feature.
fn create_session(model_path: &Path) -> VisionResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| VisionError::model_load(format!("Failed to read model file: {}", e)))?;

    let builder = Session::builder()
        .map_err(|e| VisionError::model_load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::model_load(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, using CPU");
    }

    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::model_load(format!("Failed to load ONNX model: {}", e)))
}
