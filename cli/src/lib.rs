use classifier::{ClassifierConfig, GridSearchConfig};
use features::FeatureConfig;
use fusion::FusionConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use weather_common::{ClassConfidence, WeatherClass};

pub mod dataset;

pub use dataset::{Dataset, DatasetConfig, augment_with_flips, list_images, load_dataset};

#[derive(Error, Debug)]
pub enum WeatherKitError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Common(#[from] weather_common::CommonError),
    #[error("Dataset directory not found: {0}")]
    MissingDataset(PathBuf),
    #[error("No readable images found under {0}")]
    EmptyDataset(PathBuf),
    #[error("Invalid confidence '{0}', expected CLASS=PERCENT")]
    InvalidConfidence(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Training run settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation
    pub test_fraction: f64,
    /// Add a horizontally flipped copy of every training image
    pub augment: bool,
    /// Tune C and gamma before the final fit
    pub grid_search: bool,
    pub model_path: PathBuf,
    /// Where the classification report is written, if anywhere
    pub results_dir: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            augment: true,
            grid_search: false,
            model_path: PathBuf::from("models/weather.model"),
            results_dir: None,
        }
    }
}

/// Top-level configuration of the `weather` binary
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct WeatherKitConfig {
    pub dataset: DatasetConfig,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    pub training: TrainingConfig,
    pub grid_search: GridSearchConfig,
    pub fusion: FusionConfig,
}

impl WeatherKitConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, WeatherKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, WeatherKitError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, WeatherKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, WeatherKitError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WeatherKitError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(WeatherKitError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WeatherKitError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, WeatherKitError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WeatherKitError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, WeatherKitError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

/// Parse a `CLASS=PERCENT` argument such as `Cerah=40`
pub fn parse_confidence(arg: &str) -> Result<ClassConfidence, WeatherKitError> {
    let invalid = || WeatherKitError::InvalidConfidence(arg.to_string());
    let (name, value) = arg.split_once(['=', ':']).ok_or_else(invalid)?;
    let class = WeatherClass::parse(name.trim())?;
    let percent: f64 = value.trim().trim_end_matches('%').parse().map_err(|_| invalid())?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(invalid());
    }
    Ok(ClassConfidence::new(class, percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifier::Gamma;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = WeatherKitConfig::from_toml(
            r#"
[dataset]
root = "photos"

[classifier]
c = 10.0
gamma = { value = 0.01 }

[training]
grid_search = true
"#,
        )
        .unwrap();
        assert_eq!(config.dataset.root, PathBuf::from("photos"));
        assert_eq!(config.classifier.c, 10.0);
        assert_eq!(config.classifier.gamma, Gamma::Value(0.01));
        assert_eq!(config.classifier.variance_retained, 0.95);
        assert!(config.training.grid_search);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.features, FeatureConfig::default());
        assert_eq!(config.fusion, FusionConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = WeatherKitConfig::default();
        config.training.results_dir = Some(PathBuf::from("results"));
        let restored = WeatherKitConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.toml");
        let config = WeatherKitConfig::default();
        config.to_toml_file(&path).unwrap();
        assert_eq!(WeatherKitConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            WeatherKitConfig::from_file("weather.yaml"),
            Err(WeatherKitError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_parse_confidence() {
        let c = parse_confidence("Cerah=40").unwrap();
        assert_eq!(c.class, WeatherClass::Cerah);
        assert_eq!(c.percent, 40.0);
        assert_eq!(parse_confidence("berkabut:12.5%").unwrap().percent, 12.5);
        assert!(parse_confidence("Cerah").is_err());
        assert!(parse_confidence("Salju=10").is_err());
        assert!(parse_confidence("Hujan=140").is_err());
        assert!(parse_confidence("Hujan=abc").is_err());
    }
}
