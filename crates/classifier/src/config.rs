use std::{fmt, str::FromStr};

use ndarray::Array2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// RBF kernel coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * var(X))`
    #[default]
    Scale,
    /// `1 / n_features`
    Auto,
    Value(f64),
}

impl Gamma {
    /// Concrete coefficient for a training matrix
    pub fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match *self {
            Gamma::Value(v) => v,
            Gamma::Auto => 1.0 / n_features,
            Gamma::Scale => {
                let var = x.var(0.0);
                if var > 0.0 { 1.0 / (n_features * var) } else { 1.0 }
            }
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => write!(f, "scale"),
            Gamma::Auto => write!(f, "auto"),
            Gamma::Value(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for Gamma {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scale" => Ok(Gamma::Scale),
            "auto" => Ok(Gamma::Auto),
            other => other
                .parse::<f64>()
                .map(Gamma::Value)
                .map_err(|_| ClassifierError::InvalidHyperparameter(format!("gamma '{s}'"))),
        }
    }
}

/// Hyperparameters of the scaler -> PCA -> RBF SVC pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClassifierConfig {
    /// SVC regularization strength
    pub c: f64,
    pub gamma: Gamma,
    /// Fraction of variance the PCA stage keeps
    pub variance_retained: f64,
    pub seed: u64,
    /// Internal cross-validation folds used for probability calibration
    pub probability_folds: usize,
    /// SMO stopping tolerance
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: Gamma::Scale,
            variance_retained: 0.95,
            seed: 42,
            probability_folds: 5,
            tolerance: 1e-3,
            max_iterations: 10_000_000,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ClassifierError::InvalidHyperparameter(format!(
                "C must be positive, got {}",
                self.c
            )));
        }
        if let Gamma::Value(g) = self.gamma {
            if !(g.is_finite() && g > 0.0) {
                return Err(ClassifierError::InvalidHyperparameter(format!(
                    "gamma must be positive, got {g}"
                )));
            }
        }
        if !(self.variance_retained > 0.0 && self.variance_retained <= 1.0) {
            return Err(ClassifierError::InvalidHyperparameter(format!(
                "variance_retained must be in (0, 1], got {}",
                self.variance_retained
            )));
        }
        if self.probability_folds < 2 {
            return Err(ClassifierError::InvalidHyperparameter(
                "probability_folds must be at least 2".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) || self.max_iterations == 0 {
            return Err(ClassifierError::InvalidHyperparameter(
                "tolerance and max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Grid over C and gamma evaluated by stratified k-fold accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GridSearchConfig {
    pub c_values: Vec<f64>,
    pub gamma_values: Vec<Gamma>,
    pub folds: usize,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            c_values: vec![0.1, 1.0, 10.0, 100.0],
            gamma_values: vec![Gamma::Value(0.005), Gamma::Value(0.01), Gamma::Value(0.05)],
            folds: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gamma_resolution() {
        let x = array![[0.0, 2.0], [2.0, 0.0]];
        // var over all elements is 1.0
        assert_eq!(Gamma::Scale.resolve(&x), 0.5);
        assert_eq!(Gamma::Auto.resolve(&x), 0.5);
        assert_eq!(Gamma::Value(0.01).resolve(&x), 0.01);
        assert_eq!(Gamma::Scale.resolve(&Array2::zeros((3, 4))), 1.0);
    }

    #[test]
    fn test_gamma_parsing() {
        assert_eq!("scale".parse::<Gamma>().unwrap(), Gamma::Scale);
        assert_eq!("AUTO".parse::<Gamma>().unwrap(), Gamma::Auto);
        assert_eq!("0.05".parse::<Gamma>().unwrap(), Gamma::Value(0.05));
        assert!("wide".parse::<Gamma>().is_err());
    }

    #[test]
    fn test_validation() {
        assert!(ClassifierConfig::default().validate().is_ok());
        let bad = ClassifierConfig { c: 0.0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = ClassifierConfig { gamma: Gamma::Value(-1.0), ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = ClassifierConfig { variance_retained: 1.5, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_parse_from_toml() {
        let config: ClassifierConfig = toml::from_str(
            r#"
            c = 10.0
            gamma = { value = 0.01 }
            "#,
        )
        .unwrap();
        assert_eq!(config.c, 10.0);
        assert_eq!(config.gamma, Gamma::Value(0.01));
        assert_eq!(config.seed, 42);

        let config: ClassifierConfig = toml::from_str(r#"gamma = "auto""#).unwrap();
        assert_eq!(config.gamma, Gamma::Auto);
    }

    #[test]
    fn test_default_grid() {
        let grid = GridSearchConfig::default();
        assert_eq!(grid.c_values.len() * grid.gamma_values.len(), 12);
        assert_eq!(grid.folds, 3);
    }
}
