//! Decoding of uploaded images into model input tensors.
//!
//! The breed models were trained on 224x224 RGB images with raw `0..=255`
//! pixel values in NHWC layout. Images are stretched to the target size
//! without preserving aspect ratio, matching the training pipeline.

use image::imageops::{self, FilterType};
use ndarray::Array4;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Square input dimension expected by every model.
pub const INPUT_SIZE: u32 = 224;

/// Number of color channels (RGB).
pub const CHANNELS: usize = 3;

/// Resampling filter used for the resize (bicubic).
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// A single preprocessed image, shape `[1, 224, 224, 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    /// Tensor shape, always `[1, 224, 224, 3]`.
    pub fn shape(&self) -> [usize; 4] {
        let dims = self.0.dim();
        [dims.0, dims.1, dims.2, dims.3]
    }

    /// Flat row-major view of the pixel values.
    pub fn as_slice(&self) -> &[f32] {
        // Built from a Vec in standard layout, so this is always contiguous.
        self.0.as_slice().unwrap_or(&[])
    }

    /// An all-black tensor, for tests and warm-up runs.
    pub fn zeros() -> Self {
        let size = INPUT_SIZE as usize;
        Self(Array4::zeros((1, size, size, CHANNELS)))
    }
}

/// Decode `bytes` into an RGB tensor ready for inference.
///
/// Any color mode the decoder understands is converted to 3-channel RGB
/// (alpha is dropped). Fails with [`VisionError::InvalidImage`] when the
/// bytes are empty, not a decodable image, or decode to zero pixels.
pub fn preprocess(bytes: &[u8]) -> VisionResult<ImageTensor> {
    if bytes.is_empty() {
        return Err(VisionError::invalid_image("empty image payload"));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| VisionError::invalid_image(format!("cannot decode image: {}", e)))?;

    debug!(
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "Decoded image"
    );

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(VisionError::invalid_image(format!(
            "image has no pixels ({}x{})",
            decoded.width(),
            decoded.height()
        )));
    }

    let rgb = decoded.into_rgb8();
    let resized = imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, RESIZE_FILTER);

    let size = INPUT_SIZE as usize;
    let data: Vec<f32> = resized.into_raw().into_iter().map(f32::from).collect();

    Array4::from_shape_vec((1, size, size, CHANNELS), data)
        .map(ImageTensor)
        .map_err(|e| VisionError::inference(format!("Failed to shape tensor: {}", e)))
}
