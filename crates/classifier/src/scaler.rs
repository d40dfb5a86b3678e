use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Per-feature standardization to zero mean and unit variance.
///
/// Statistics are learned once by [`StandardScaler::fit`] and frozen.
/// Constant features keep a scale of 1 so they map to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ClassifierError::InvalidTrainingSet(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            ClassifierError::InvalidTrainingSet("cannot compute feature means".to_string())
        })?;
        let scale = x
            .var_axis(Axis(0), 0.0)
            .mapv(|v| {
                let std = v.sqrt();
                if std < 10.0 * f64::EPSILON { 1.0 } else { std }
            });
        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ClassifierError::FeatureDimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }
}
