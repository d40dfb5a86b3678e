//! Binary model artifacts.
//!
//! An artifact carries everything needed to rebuild the exact classifier:
//! the class list, the feature frame size, the hyperparameters and the
//! fitted scaler, PCA and SVC. It is encoded with bincode's standard
//! configuration.

use std::path::Path;

use features::FeatureConfig;
use serde::{Deserialize, Serialize};
use tracing::info;
use weather_common::{WeatherClass, utils::ensure_output_dir};

use crate::{
    config::ClassifierConfig,
    error::{ClassifierError, Result},
    model::{FittedPipeline, WeatherClassifier},
};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub classes: Vec<String>,
    pub feature_config: FeatureConfig,
    pub feature_len: usize,
    pub config: ClassifierConfig,
    pub model: FittedPipeline,
}

impl ModelArtifact {
    pub fn from_classifier(classifier: &WeatherClassifier) -> Result<Self> {
        let model = classifier.fitted().ok_or(ClassifierError::NotFitted)?.clone();
        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            classes: WeatherClass::names().iter().map(|s| s.to_string()).collect(),
            feature_config: *classifier.feature_config(),
            feature_len: classifier.feature_pipeline().len(),
            config: classifier.config().clone(),
            model,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decode and check an artifact. `origin` is only used in error messages.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self> {
        let failure = |reason: String| ClassifierError::ModelLoadFailure {
            path: origin.to_path_buf(),
            reason,
        };

        let (artifact, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| failure(format!("corrupt artifact: {e}")))?;

        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(failure(format!(
                "unsupported format version {} (expected {})",
                artifact.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if artifact.classes.iter().map(String::as_str).ne(WeatherClass::names().iter().copied()) {
            return Err(failure(format!("unexpected class list {:?}", artifact.classes)));
        }
        if artifact.model.n_features() != artifact.feature_len {
            return Err(failure(format!(
                "model expects {} features but artifact declares {}",
                artifact.model.n_features(),
                artifact.feature_len
            )));
        }
        Ok(artifact)
    }

    pub fn into_classifier(self, origin: &Path) -> Result<WeatherClassifier> {
        let classifier = WeatherClassifier::from_parts(self.config, self.feature_config, self.model)?;
        let extracted = classifier.feature_pipeline().len();
        if extracted != self.feature_len {
            return Err(ClassifierError::ModelLoadFailure {
                path: origin.to_path_buf(),
                reason: format!(
                    "feature pipeline produces {extracted} values but model expects {}",
                    self.feature_len
                ),
            });
        }
        Ok(classifier)
    }
}

impl WeatherClassifier {
    /// Write the fitted model to `path`, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = ModelArtifact::from_classifier(self)?.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_output_dir(parent)?;
        }
        std::fs::write(path, &bytes)?;
        info!("Saved model ({} bytes) to {}", bytes.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ClassifierError::ModelLoadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let classifier = ModelArtifact::from_bytes(&bytes, path)?.into_classifier(path)?;
        info!("Loaded model from {}", path.display());
        Ok(classifier)
    }
}
