//! # Weather Classifier
//!
//! Trainable image classifier for the four weather classes. Raw images go
//! through the feature pipeline, then a fitted chain of
//!
//! 1. per-feature standardization,
//! 2. PCA keeping 95% of the variance,
//! 3. an RBF-kernel SVC with balanced class weights and Platt-calibrated
//!    one-vs-one probabilities.
//!
//! Fitted models are written as versioned bincode artifacts and can be hot
//! swapped through [`ModelStore`].
//!
//! ```rust,no_run
//! use classifier::{ClassifierConfig, WeatherClassifier};
//! use features::FeatureConfig;
//!
//! let model = WeatherClassifier::load("models/weather.model")?;
//! let image = image::open("sky.jpg").map_err(|e| features::FeatureError::InvalidImage(e.to_string()))?;
//! for entry in model.confidences(&image)?.iter() {
//!     println!("{}: {:.2}%", entry.class, entry.percent);
//! }
//! # let _ = (ClassifierConfig::default(), FeatureConfig::default());
//! # Ok::<(), classifier::ClassifierError>(())
//! ```

pub mod error;
pub mod config;
pub mod scaler;
pub mod pca;
pub mod kernel;
pub mod svm;
pub mod model;
pub mod persistence;
pub mod store;
pub mod tuning;
pub mod metrics;

pub use error::{ClassifierError, Result};
pub use config::{ClassifierConfig, Gamma, GridSearchConfig};
pub use model::{FittedPipeline, WeatherClassifier};
pub use persistence::{MODEL_FORMAT_VERSION, ModelArtifact};
pub use store::ModelStore;
pub use tuning::{GridSearchResult, cross_val_accuracy, grid_search, stratified_folds, stratified_split};
pub use metrics::{ClassificationReport, ConfusionMatrix, accuracy};
