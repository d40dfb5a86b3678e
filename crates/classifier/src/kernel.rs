use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Gaussian radial basis function `exp(-gamma * |a - b|^2)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RbfKernel {
    pub gamma: f64,
}

impl RbfKernel {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    pub fn compute(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        let dist: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
        (-self.gamma * dist).exp()
    }

    /// Kernel between every row of `a` and every row of `b`
    pub fn matrix(&self, a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
        let a_norms: Array1<f64> = a.map_axis(Axis(1), |r| r.dot(&r));
        let b_norms: Array1<f64> = b.map_axis(Axis(1), |r| r.dot(&r));
        let dots = a.dot(&b.t());
        let rows: Vec<Vec<f64>> = (0..a.nrows())
            .into_par_iter()
            .map(|i| {
                (0..b.nrows())
                    .map(|j| {
                        let dist = (a_norms[i] + b_norms[j] - 2.0 * dots[[i, j]]).max(0.0);
                        (-self.gamma * dist).exp()
                    })
                    .collect()
            })
            .collect();
        Array2::from_shape_fn((a.nrows(), b.nrows()), |(i, j)| rows[i][j])
    }
}
