//! Image preprocessing and cascaded breed classification.
//!
//! This crate provides:
//! - Decoding of uploaded images into fixed-shape NHWC tensors
//! - ONNX Runtime classifiers behind a `Classifier` trait
//! - A model registry holding the species gate and both breed models
//! - The species gate -> breed model cascade

pub mod cascade;
pub mod classifier;
pub mod error;
pub mod preprocess;
pub mod registry;

pub use cascade::{argmax, CascadeClassifier};
pub use classifier::{Classifier, OrtClassifier};
pub use error::{VisionError, VisionResult};
pub use preprocess::{preprocess, ImageTensor, INPUT_SIZE};
pub use registry::{ModelPaths, ModelRegistry};
