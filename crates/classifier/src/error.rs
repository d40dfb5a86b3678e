use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier has not been fitted")]
    NotFitted,

    #[error("Feature dimension mismatch: model expects {expected}, got {actual}")]
    FeatureDimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid training set: {0}")]
    InvalidTrainingSet(String),

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Failed to load model from {path}: {reason}")]
    ModelLoadFailure { path: PathBuf, reason: String },

    #[error("Failed to encode model: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Feature extraction error: {0}")]
    Feature(#[from] features::FeatureError),

    #[error(transparent)]
    Common(#[from] weather_common::CommonError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
