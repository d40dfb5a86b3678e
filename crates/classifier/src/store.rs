use std::{
    path::Path,
    sync::{Arc, RwLock},
};

use tracing::{info, warn};

use crate::{error::Result, model::WeatherClassifier};

/// Shared handle to the active model.
///
/// Readers clone the inner `Arc` and keep predicting with it even while a
/// new model is swapped in. An empty store means the service runs degraded.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    inner: Arc<RwLock<Option<Arc<WeatherClassifier>>>>,
}

impl ModelStore {
    pub fn new(classifier: WeatherClassifier) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(classifier)))),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `path`, falling back to an empty store when it cannot be read
    pub fn load_or_degraded<P: AsRef<Path>>(path: P) -> Self {
        let store = Self::empty();
        if let Err(e) = store.try_load(path) {
            warn!("Running without a model: {}", e);
        }
        store
    }

    /// Replace the active model with the artifact at `path`. The current
    /// model stays active when loading fails.
    pub fn try_load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let classifier = WeatherClassifier::load(path)?;
        self.swap(classifier);
        Ok(())
    }

    pub fn current(&self) -> Option<Arc<WeatherClassifier>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Install `classifier`, returning the model it replaced
    pub fn swap(&self, classifier: WeatherClassifier) -> Option<Arc<WeatherClassifier>> {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        info!("Activating new model");
        guard.replace(Arc::new(classifier))
    }

    pub fn clear(&self) -> Option<Arc<WeatherClassifier>> {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take()
    }

    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use features::FeatureConfig;

    fn classifier() -> WeatherClassifier {
        WeatherClassifier::new(ClassifierConfig::default(), FeatureConfig::new(16, 16).unwrap())
            .unwrap()
    }

    #[test]
    fn test_degraded_when_missing() {
        let store = ModelStore::load_or_degraded("/nonexistent/weather.model");
        assert!(!store.is_available());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_swap_keeps_old_handle_alive() {
        let store = ModelStore::new(classifier());
        let old = store.current().unwrap();
        let replaced = store.swap(classifier()).unwrap();
        assert!(Arc::ptr_eq(&old, &replaced));
        assert!(!Arc::ptr_eq(&old, &store.current().unwrap()));
        assert!(!old.is_fitted());
    }

    #[test]
    fn test_failed_load_keeps_current_model() {
        let store = ModelStore::new(classifier());
        assert!(store.try_load("/nonexistent/weather.model").is_err());
        assert!(store.is_available());
        store.clear();
        assert!(!store.is_available());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ModelStore::empty();
        let other = store.clone();
        store.swap(classifier());
        assert!(other.is_available());
    }
}
