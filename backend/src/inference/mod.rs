pub mod classifier;
pub mod error;
pub mod loader;
pub mod preprocess;

use crate::config::AppConfig;
use actix_web::web;
use classifier::predict;
use error::{AnalysisError, InferenceError};
use loader::ModelLoader;
use preprocess::{UploadedImage, preprocess, validate_upload};
use shared::Prediction;
use std::time::Duration;

/// Runs one upload through load, preprocess and inference.
///
/// Decoding and the forward pass run on the blocking pool and are bounded
/// by `inference.timeout_secs`.
pub async fn analyze(
    loader: &ModelLoader,
    config: &AppConfig,
    upload: UploadedImage,
) -> Result<Prediction, AnalysisError> {
    validate_upload(&upload, config.inference.max_upload_bytes)?;
    let classifier = loader.get().await?;

    let image_config = config.image.clone();
    let apply_softmax = config.model.apply_softmax;
    let job = web::block(move || -> Result<Prediction, AnalysisError> {
        let tensor = preprocess(&upload.bytes, &image_config)?;
        Ok(predict(classifier.as_ref(), &tensor, apply_softmax)?)
    });

    let timeout_secs = config.inference.timeout_secs;
    match tokio::time::timeout(Duration::from_secs(timeout_secs), job).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(InferenceError::Runtime(e.to_string()).into()),
        Err(_) => Err(InferenceError::Timeout(timeout_secs).into()),
    }
}
