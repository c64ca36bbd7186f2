//! Model Lifecycle Manager

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OnceCell, RwLock};
use tracing::{error, info};

use crate::model::{ConfiguredLoader, ModelConfig, ModelLoader, SentimentModel};
use crate::InferenceError;

/// Loads the sentiment model at most once and hands out shared references.
///
/// Concurrent first callers of [`load`](Self::load) or
/// [`model`](Self::model) coordinate through a one-shot cell: one of them
/// runs the loader while the others wait for it to finish. A failed load
/// leaves the cell empty so a later call can retry.
///
/// [`teardown`](Self::teardown) waits for in-flight loads and empties the
/// cell; callers already holding the model keep their reference.
pub struct ModelManager {
    loader: Arc<dyn ModelLoader>,
    model: RwLock<OnceCell<Arc<dyn SentimentModel>>>,
}

impl ModelManager {
    /// Create a manager around `loader`. Nothing is loaded yet.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        info!("Creating model manager for {}", loader.name());
        Self {
            loader,
            model: RwLock::new(OnceCell::new()),
        }
    }

    /// Create a manager for a configured backend
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(Arc::new(ConfiguredLoader::new(config.clone())))
    }

    /// Load the model if it is not loaded yet
    pub async fn load(&self) -> Result<(), InferenceError> {
        self.model().await.map(|_| ())
    }

    /// Get the loaded model, loading it first if needed
    pub async fn model(&self) -> Result<Arc<dyn SentimentModel>, InferenceError> {
        let cell = self.model.read().await;
        let model = cell
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let name = loader.name();
                let start = Instant::now();
                info!("Loading sentiment model {}", name);

                let loaded = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| InferenceError::ModelUnavailable(format!("loader task failed: {}", e)))?
                    .map_err(|e| match e {
                        InferenceError::ModelUnavailable(_) => e,
                        other => InferenceError::ModelUnavailable(other.to_string()),
                    });

                match loaded {
                    Ok(model) => {
                        info!("Model {} ready in {}ms", name, start.elapsed().as_millis());
                        Ok(model)
                    }
                    Err(e) => {
                        error!("Model {} failed to load: {}", name, e);
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(model))
    }

    /// Check if the model is loaded. False while a teardown is pending.
    pub fn is_ready(&self) -> bool {
        self.model
            .try_read()
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Name of the model this manager loads
    pub fn model_name(&self) -> String {
        self.loader.name()
    }

    /// Drop the loaded model. Returns whether a model was loaded.
    pub async fn teardown(&self) -> bool {
        let dropped = self.model.write().await.take().is_some();
        if dropped {
            info!("Model {} unloaded", self.loader.name());
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LexiconModel, ScoredLabel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Loader that counts invocations and can fail the first N of them
    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl CountingLoader {
        fn new(fail_first: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    impl ModelLoader for CountingLoader {
        fn name(&self) -> String {
            "counting".to_string()
        }

        fn load(&self) -> Result<Arc<dyn SentimentModel>, InferenceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if call < self.fail_first {
                return Err(InferenceError::ModelUnavailable("weights missing".to_string()));
            }
            Ok(Arc::new(LexiconModel::new()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_load_initializes_once() {
        let loader = Arc::new(CountingLoader::new(0));
        let manager = Arc::new(ModelManager::new(loader.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.load().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let loader = Arc::new(CountingLoader::new(0));
        let manager = ModelManager::new(loader.clone());

        assert!(!manager.is_ready());
        manager.load().await.unwrap();
        manager.load().await.unwrap();

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_failed_load_can_retry() {
        let loader = Arc::new(CountingLoader::new(1));
        let manager = ModelManager::new(loader.clone());

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, InferenceError::ModelUnavailable(_)));
        assert!(!manager.is_ready());

        manager.load().await.unwrap();
        assert!(manager.is_ready());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_errors_become_unavailable() {
        struct BrokenLoader;

        impl ModelLoader for BrokenLoader {
            fn name(&self) -> String {
                "broken".to_string()
            }

            fn load(&self) -> Result<Arc<dyn SentimentModel>, InferenceError> {
                Err(InferenceError::InferenceFailed("bad graph".to_string()))
            }
        }

        let manager = ModelManager::new(Arc::new(BrokenLoader));
        assert!(matches!(
            manager.load().await,
            Err(InferenceError::ModelUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_teardown_allows_reload() {
        let loader = Arc::new(CountingLoader::new(0));
        let manager = ModelManager::new(loader.clone());

        assert!(!manager.teardown().await);
        manager.load().await.unwrap();
        assert!(manager.teardown().await);
        assert!(!manager.is_ready());

        let model = manager.model().await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        let scores: Vec<ScoredLabel> = model.classify("great").unwrap();
        assert_eq!(scores.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_teardown_keeps_handed_out_models() {
        let loader = Arc::new(CountingLoader::new(0));
        let manager = Arc::new(ModelManager::new(loader.clone()));

        let held = manager.model().await.unwrap();

        let other = Arc::clone(&manager);
        assert!(tokio::spawn(async move { other.teardown().await }).await.unwrap());
        assert!(!manager.is_ready());

        // the caller's reference outlives the teardown
        assert_eq!(held.classify("great").unwrap().len(), 2);
    }
}
