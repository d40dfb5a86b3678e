use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifierError, Result};

/// Eigenvalues below this fraction of the largest are treated as rank loss
const RANK_TOLERANCE: f64 = 1e-12;

/// Principal component projection keeping enough components to explain a
/// target fraction of the variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    mean: Array1<f64>,
    /// `n_components x n_features`, one unit-length component per row
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
}

impl Pca {
    /// Fit on the rows of `x`.
    ///
    /// The eigen decomposition runs on whichever of the Gram matrix
    /// (`n x n`) or the scatter matrix (`d x d`) is smaller.
    pub fn fit(x: &Array2<f64>, variance_retained: f64) -> Result<Self> {
        let (n, d) = x.dim();
        if n < 2 {
            return Err(ClassifierError::InvalidTrainingSet(format!(
                "PCA needs at least 2 samples, got {n}"
            )));
        }
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            ClassifierError::InvalidTrainingSet("cannot compute feature means".to_string())
        })?;
        let centered = x - &mean;

        let (eigenvalues, directions) = if n < d {
            let gram = centered.dot(&centered.t());
            let (values, vectors) = sorted_eigen(&gram);
            // Map Gram eigenvectors u to feature space: v = X^T u / sqrt(lambda)
            let mut directions = Array2::zeros((values.len(), d));
            for (k, &lambda) in values.iter().enumerate() {
                if lambda <= 0.0 {
                    continue;
                }
                let v = centered.t().dot(&vectors.column(k)) / lambda.sqrt();
                directions.row_mut(k).assign(&v);
            }
            (values, directions)
        } else {
            let scatter = centered.t().dot(&centered);
            let (values, vectors) = sorted_eigen(&scatter);
            (values, vectors.t().to_owned())
        };

        let largest = eigenvalues.first().copied().unwrap_or(0.0);
        let rank = eigenvalues
            .iter()
            .take_while(|&&v| v > largest * RANK_TOLERANCE && v > 0.0)
            .count();
        if rank == 0 {
            return Err(ClassifierError::InvalidTrainingSet(
                "features have zero variance".to_string(),
            ));
        }

        let variance: Vec<f64> = eigenvalues[..rank].iter().map(|v| v / (n - 1) as f64).collect();
        let total: f64 = variance.iter().sum();
        let ratio: Vec<f64> = variance.iter().map(|v| v / total).collect();
        let keep = components_for(&ratio, variance_retained);

        let mut components = directions.slice(ndarray::s![..keep, ..]).to_owned();
        for mut row in components.rows_mut() {
            // Deterministic sign: largest-magnitude loading is positive
            let pivot = row
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                row.mapv_inplace(|v| -v);
            }
        }

        debug!(
            "PCA kept {} of {} components ({:.4} of variance)",
            keep,
            rank,
            ratio[..keep].iter().sum::<f64>()
        );

        Ok(Self {
            mean,
            components,
            explained_variance: Array1::from(variance[..keep].to_vec()),
            explained_variance_ratio: Array1::from(ratio[..keep].to_vec()),
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ClassifierError::FeatureDimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }
}

/// Smallest component count whose cumulative ratio exceeds `target`
/// (all components when the target is never passed)
fn components_for(ratio: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    let below = ratio
        .iter()
        .take_while(|&&r| {
            cumulative += r;
            cumulative <= target
        })
        .count();
    (below + 1).min(ratio.len())
}

/// Eigenvalues in descending order with matching eigenvector columns
fn sorted_eigen(matrix: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let size = matrix.nrows();
    let m = DMatrix::from_fn(size, size, |i, j| matrix[[i, j]]);
    let eigen = SymmetricEigen::new(m);

    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let values = order.iter().map(|&i| eigen.eigenvalues[i].max(0.0)).collect();
    let vectors = Array2::from_shape_fn((size, size), |(i, k)| eigen.eigenvectors[(i, order[k])]);
    (values, vectors)
}
