use std::path::PathBuf;

/// The model artifact could not be turned into a classifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported model format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to load model: {0}")]
    Backend(String),
    #[error("model loading task failed: {0}")]
    Join(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no image data received")]
    Empty,
    #[error("unsupported image format, expected JPG, JPEG or PNG")]
    UnsupportedFormat,
    #[error("image is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("malformed upload form: {0}")]
    Form(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("input shape {actual:?} does not match model input {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("model produced {actual} outputs, expected {expected}")]
    OutputMismatch { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("inference timed out after {0}s")]
    Timeout(u64),
}

/// Anything that can go wrong between receiving an upload and producing a prediction.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl AnalysisError {
    /// Only a bad upload can be fixed by the user.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, AnalysisError::Decode(_))
    }

    pub fn user_message(&self) -> String {
        format!("Error processing image: {}", self)
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.is_user_actionable()
            .then_some("Please upload a valid JPG or PNG image.")
    }
}
