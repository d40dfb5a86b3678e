use features::{FeatureConfig, FeaturePipeline, FeatureVector};
use image::DynamicImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;
use weather_common::{ConfidenceList, WeatherClass};

use crate::{
    config::{ClassifierConfig, Gamma},
    error::{ClassifierError, Result},
    pca::Pca,
    scaler::StandardScaler,
    svm::Svc,
};

/// Frozen standardize -> PCA -> SVC chain operating on feature vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    scaler: StandardScaler,
    pca: Pca,
    svc: Svc,
}

impl FittedPipeline {
    pub fn fit(x: &Array2<f64>, labels: &[WeatherClass], config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        if x.nrows() != labels.len() {
            return Err(ClassifierError::InvalidTrainingSet(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                labels.len()
            )));
        }

        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;
        let pca = Pca::fit(&scaled, config.variance_retained)?;
        let reduced = pca.transform(&scaled)?;
        let gamma = config.gamma.resolve(&reduced);

        let label_indices: Vec<usize> = labels.iter().map(|l| l.index()).collect();
        let svc = Svc::fit(&reduced, &label_indices, WeatherClass::COUNT, gamma, config)?;

        Ok(Self { scaler, pca, svc })
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    pub fn n_components(&self) -> usize {
        self.pca.n_components()
    }

    pub fn n_support_vectors(&self) -> usize {
        self.svc.n_support_vectors()
    }

    /// Resolved RBF coefficient
    pub fn gamma(&self) -> f64 {
        self.svc.gamma()
    }

    fn project(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let scaled = self.scaler.transform(x)?;
        self.pca.transform(&scaled)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<WeatherClass>> {
        self.svc
            .predict(&self.project(x)?)?
            .into_iter()
            .map(|i| WeatherClass::from_index(i).map_err(ClassifierError::from))
            .collect()
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.svc.predict_proba(&self.project(x)?)
    }
}

/// Raw-image weather classifier: normalize and extract features, then run
/// the fitted pipeline
pub struct WeatherClassifier {
    config: ClassifierConfig,
    features: FeaturePipeline,
    fitted: Option<FittedPipeline>,
}

impl std::fmt::Debug for WeatherClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClassifier")
            .field("config", &self.config)
            .field("features", &self.features.info())
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl WeatherClassifier {
    pub fn new(config: ClassifierConfig, feature_config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            features: FeaturePipeline::standard(feature_config)?,
            fitted: None,
        })
    }

    pub(crate) fn from_parts(
        config: ClassifierConfig,
        feature_config: FeatureConfig,
        fitted: FittedPipeline,
    ) -> Result<Self> {
        let mut classifier = Self::new(config, feature_config)?;
        classifier.fitted = Some(fitted);
        Ok(classifier)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn feature_config(&self) -> &FeatureConfig {
        self.features.config()
    }

    pub fn feature_pipeline(&self) -> &FeaturePipeline {
        &self.features
    }

    pub fn fitted(&self) -> Option<&FittedPipeline> {
        self.fitted.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Override C and gamma for the next `fit`. An already fitted model is
    /// left untouched.
    pub fn set_hyperparameters(&mut self, c: f64, gamma: Gamma) -> Result<()> {
        let config = ClassifierConfig { c, gamma, ..self.config.clone() };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Feature matrix for a batch of images, one row per image
    pub fn extract(&self, images: &[DynamicImage]) -> Result<Array2<f64>> {
        let vectors = self.features.extract_batch(images)?;
        to_matrix(&vectors, self.features.len())
    }

    pub fn fit(&mut self, images: &[DynamicImage], labels: &[WeatherClass]) -> Result<()> {
        if images.len() != labels.len() {
            return Err(ClassifierError::InvalidTrainingSet(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        if images.is_empty() {
            return Err(ClassifierError::InvalidTrainingSet("no training images".to_string()));
        }
        info!("Extracting features from {} training images", images.len());
        let x = self.extract(images)?;
        self.fit_features(&x, labels)
    }

    /// Fit on precomputed feature rows
    pub fn fit_features(&mut self, x: &Array2<f64>, labels: &[WeatherClass]) -> Result<()> {
        let expected = self.features.len();
        if x.ncols() != expected {
            return Err(ClassifierError::FeatureDimensionMismatch {
                expected,
                actual: x.ncols(),
            });
        }
        let fitted = FittedPipeline::fit(x, labels, &self.config)?;
        info!(
            "Fitted classifier: {} features -> {} components, gamma {:.6}, {} support vectors",
            fitted.n_features(),
            fitted.n_components(),
            fitted.gamma(),
            fitted.n_support_vectors()
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn model(&self) -> Result<&FittedPipeline> {
        self.fitted.as_ref().ok_or(ClassifierError::NotFitted)
    }

    pub fn predict(&self, images: &[DynamicImage]) -> Result<Vec<WeatherClass>> {
        let model = self.model()?;
        model.predict(&self.extract(images)?)
    }

    pub fn predict_proba(&self, images: &[DynamicImage]) -> Result<Array2<f64>> {
        let model = self.model()?;
        model.predict_proba(&self.extract(images)?)
    }

    pub fn predict_features(&self, x: &Array2<f64>) -> Result<Vec<WeatherClass>> {
        self.model()?.predict(x)
    }

    pub fn predict_proba_features(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.model()?.predict_proba(x)
    }

    /// Sorted per-class confidences for a single image
    pub fn confidences(&self, image: &DynamicImage) -> Result<ConfidenceList> {
        let proba = self.predict_proba(std::slice::from_ref(image))?;
        let row: Vec<f64> = proba.row(0).iter().map(|p| p.clamp(0.0, 1.0)).collect();
        Ok(ConfidenceList::from_probabilities(&row)?)
    }
}

/// Stack feature vectors into a matrix, rejecting ragged input
pub fn to_matrix(vectors: &[FeatureVector], expected: usize) -> Result<Array2<f64>> {
    let mut flat = Vec::with_capacity(vectors.len() * expected);
    for vector in vectors {
        if vector.len() != expected {
            return Err(ClassifierError::FeatureDimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        flat.extend_from_slice(vector.as_slice());
    }
    Array2::from_shape_vec((vectors.len(), expected), flat)
        .map_err(|e| ClassifierError::InvalidTrainingSet(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_features() -> FeatureConfig {
        FeatureConfig::new(16, 16).unwrap()
    }

    /// Separable feature rows: each class shifts a different block of columns
    fn synthetic_features(n_per_class: usize, dim: usize) -> (Array2<f64>, Vec<WeatherClass>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for class in WeatherClass::ALL {
            for k in 0..n_per_class {
                for j in 0..dim {
                    let block = j * WeatherClass::COUNT / dim;
                    let signal = if block == class.index() { 3.0 } else { 0.0 };
                    let noise = (((k * 31 + j * 17 + class.index() * 7) % 13) as f64) / 13.0;
                    rows.push(signal + noise);
                }
                labels.push(class);
            }
        }
        (Array2::from_shape_vec((labels.len(), dim), rows).unwrap(), labels)
    }

    #[test]
    fn test_not_fitted() {
        let classifier = WeatherClassifier::new(ClassifierConfig::default(), small_features()).unwrap();
        let x = Array2::zeros((1, classifier.feature_pipeline().len()));
        assert!(matches!(classifier.predict_features(&x), Err(ClassifierError::NotFitted)));
        assert!(matches!(classifier.predict_proba_features(&x), Err(ClassifierError::NotFitted)));
        assert!(!classifier.is_fitted());
    }

    #[test]
    fn test_pipeline_on_feature_rows() {
        let (x, labels) = synthetic_features(6, 40);
        let model = FittedPipeline::fit(&x, &labels, &ClassifierConfig::default()).unwrap();
        assert_eq!(model.predict(&x).unwrap(), labels);

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (24, 4));
        for row in proba.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fit_features_checks_dimension() {
        let mut classifier =
            WeatherClassifier::new(ClassifierConfig::default(), small_features()).unwrap();
        let (x, labels) = synthetic_features(3, 10);
        let err = classifier.fit_features(&x, &labels).unwrap_err();
        assert!(matches!(err, ClassifierError::FeatureDimensionMismatch { actual: 10, .. }));
    }

    #[test]
    fn test_set_hyperparameters() {
        let mut classifier =
            WeatherClassifier::new(ClassifierConfig::default(), small_features()).unwrap();
        classifier.set_hyperparameters(10.0, Gamma::Value(0.01)).unwrap();
        assert_eq!(classifier.config().c, 10.0);
        assert_eq!(classifier.config().gamma, Gamma::Value(0.01));
        assert!(classifier.set_hyperparameters(-1.0, Gamma::Scale).is_err());
        assert_eq!(classifier.config().c, 10.0);
    }

    #[test]
    fn test_to_matrix_rejects_ragged_rows() {
        let rows = vec![FeatureVector::new(vec![1.0, 2.0]), FeatureVector::new(vec![1.0])];
        assert!(to_matrix(&rows, 2).is_err());
        let m = to_matrix(&rows[..1], 2).unwrap();
        assert_eq!(m.dim(), (1, 2));
    }
}
