use super::classifier::{Classifier, load_classifier};
use super::error::LoadError;
use crate::config::AppConfig;
use actix_web::web;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Factory = dyn Fn() -> Result<Arc<dyn Classifier>, LoadError> + Send + Sync;

/// Loads the classifier on first use and hands out the same handle afterwards.
///
/// Concurrent first calls wait on a single load. A failed load is not
/// remembered, so the next request tries again.
pub struct ModelLoader {
    cell: OnceCell<Arc<dyn Classifier>>,
    factory: Arc<Factory>,
    source: String,
}

impl ModelLoader {
    pub fn from_config(config: &AppConfig) -> Self {
        let path = config.model.path.clone();
        let input_shape = config.image.input_shape();
        let source = path.display().to_string();
        Self::with_factory(source, move || load_classifier(&path, input_shape))
    }

    pub fn with_factory<F>(source: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Classifier>, LoadError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Arc::new(factory),
            source: source.into(),
        }
    }

    /// Where the model comes from, for logging.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn Classifier>, LoadError> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                log::info!("Loading model from {}", self.source);
                let factory = Arc::clone(&self.factory);
                let loaded = web::block(move || factory())
                    .await
                    .map_err(|e| LoadError::Join(e.to_string()))?;
                match &loaded {
                    Ok(_) => log::info!("Model loaded from {}", self.source),
                    Err(e) => log::error!("Failed to load model from {}: {}", self.source, e),
                }
                loaded
            })
            .await?;
        Ok(Arc::clone(classifier))
    }
}
