//! Sequential minimal optimization for the two-class C-SVC dual
//!
//! ```text
//! min  1/2 a^T Q a - e^T a
//! s.t. 0 <= a_i <= C_i,  y^T a = 0,  Q_ij = y_i y_j K_ij
//! ```
//!
//! Working pairs are chosen with second-order information and no shrinking
//! is applied.

use ndarray::Array2;
use tracing::warn;

const TAU: f64 = 1e-12;

/// Kernel rows for a subset of the training samples
pub struct KernelView<'a> {
    matrix: &'a Array2<f64>,
    indices: &'a [usize],
}

impl<'a> KernelView<'a> {
    pub fn new(matrix: &'a Array2<f64>, indices: &'a [usize]) -> Self {
        Self { matrix, indices }
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.matrix[[self.indices[a], self.indices[b]]]
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Dual solution of a binary problem
#[derive(Debug, Clone)]
pub struct BinarySolution {
    pub alpha: Vec<f64>,
    pub rho: f64,
    pub iterations: usize,
}

impl BinarySolution {
    /// `sum_i alpha_i y_i K(x_i, x) - rho` given kernel values against the
    /// training samples
    pub fn decision(&self, y: &[f64], kernel_row: impl Fn(usize) -> f64) -> f64 {
        let mut sum = 0.0;
        for (i, &a) in self.alpha.iter().enumerate() {
            if a > 0.0 {
                sum += a * y[i] * kernel_row(i);
            }
        }
        sum - self.rho
    }
}

struct Solver<'a> {
    kernel: &'a KernelView<'a>,
    y: &'a [f64],
    c: &'a [f64],
    alpha: Vec<f64>,
    gradient: Vec<f64>,
    diag: Vec<f64>,
}

impl Solver<'_> {
    fn q(&self, i: usize, j: usize) -> f64 {
        self.y[i] * self.y[j] * self.kernel.get(i, j)
    }

    fn is_upper(&self, i: usize) -> bool {
        self.alpha[i] >= self.c[i]
    }

    fn is_lower(&self, i: usize) -> bool {
        self.alpha[i] <= 0.0
    }

    fn select_working_set(&self, eps: f64) -> Option<(usize, usize)> {
        let n = self.y.len();
        let mut gmax = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..n {
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.gradient[t] >= gmax {
                    gmax = -self.gradient[t];
                    i_sel = Some(t);
                }
            } else if !self.is_lower(t) && self.gradient[t] >= gmax {
                gmax = self.gradient[t];
                i_sel = Some(t);
            }
        }
        let i = i_sel?;

        let mut gmax2 = f64::NEG_INFINITY;
        let mut j_sel = None;
        let mut obj_min = f64::INFINITY;
        for t in 0..n {
            let q_it = self.q(i, t);
            if self.y[t] > 0.0 {
                if !self.is_lower(t) {
                    let grad_diff = gmax + self.gradient[t];
                    gmax2 = gmax2.max(self.gradient[t]);
                    if grad_diff > 0.0 {
                        let quad = self.diag[i] + self.diag[t] - 2.0 * self.y[i] * q_it;
                        let obj = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                        if obj <= obj_min {
                            obj_min = obj;
                            j_sel = Some(t);
                        }
                    }
                }
            } else if !self.is_upper(t) {
                let grad_diff = gmax - self.gradient[t];
                gmax2 = gmax2.max(-self.gradient[t]);
                if grad_diff > 0.0 {
                    let quad = self.diag[i] + self.diag[t] + 2.0 * self.y[i] * q_it;
                    let obj = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                    if obj <= obj_min {
                        obj_min = obj;
                        j_sel = Some(t);
                    }
                }
            }
        }

        if gmax + gmax2 < eps {
            return None;
        }
        j_sel.map(|j| (i, j))
    }

    fn update(&mut self, i: usize, j: usize) {
        let (c_i, c_j) = (self.c[i], self.c[j]);
        let (old_i, old_j) = (self.alpha[i], self.alpha[j]);
        let q_ij = self.q(i, j);

        if self.y[i] != self.y[j] {
            let quad = (self.diag[i] + self.diag[j] + 2.0 * q_ij).max(TAU);
            let delta = (-self.gradient[i] - self.gradient[j]) / quad;
            let diff = old_i - old_j;
            let (mut ai, mut aj) = (old_i + delta, old_j + delta);
            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > c_i - c_j {
                if ai > c_i {
                    ai = c_i;
                    aj = c_i - diff;
                }
            } else if aj > c_j {
                aj = c_j;
                ai = c_j + diff;
            }
            self.alpha[i] = ai;
            self.alpha[j] = aj;
        } else {
            let quad = (self.diag[i] + self.diag[j] - 2.0 * q_ij).max(TAU);
            let delta = (self.gradient[i] - self.gradient[j]) / quad;
            let sum = old_i + old_j;
            let (mut ai, mut aj) = (old_i - delta, old_j + delta);
            if sum > c_i {
                if ai > c_i {
                    ai = c_i;
                    aj = sum - c_i;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c_j {
                if aj > c_j {
                    aj = c_j;
                    ai = sum - c_j;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
            self.alpha[i] = ai;
            self.alpha[j] = aj;
        }

        let d_i = self.alpha[i] - old_i;
        let d_j = self.alpha[j] - old_j;
        for t in 0..self.y.len() {
            self.gradient[t] += self.q(i, t) * d_i + self.q(j, t) * d_j;
        }
    }

    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free = 0usize;
        let mut free_sum = 0.0;

        for t in 0..self.y.len() {
            let yg = self.y[t] * self.gradient[t];
            if self.is_upper(t) {
                if self.y[t] < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if self.is_lower(t) {
                if self.y[t] > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                free += 1;
                free_sum += yg;
            }
        }

        if free > 0 { free_sum / free as f64 } else { (upper + lower) / 2.0 }
    }
}

/// Solve one binary problem. `y` holds +1/-1 labels, `c` per-sample bounds.
pub fn solve(
    kernel: &KernelView<'_>,
    y: &[f64],
    c: &[f64],
    tolerance: f64,
    max_iterations: usize,
) -> BinarySolution {
    let n = y.len();
    let diag = (0..n).map(|i| kernel.get(i, i)).collect();
    let mut solver = Solver {
        kernel,
        y,
        c,
        alpha: vec![0.0; n],
        gradient: vec![-1.0; n],
        diag,
    };

    let limit = max_iterations.max(100 * n);
    let mut iterations = 0;
    while iterations < limit {
        let Some((i, j)) = solver.select_working_set(tolerance) else {
            break;
        };
        solver.update(i, j);
        iterations += 1;
    }
    if iterations >= limit {
        warn!("SMO reached the iteration limit ({}) before converging", limit);
    }

    let rho = solver.rho();
    BinarySolution {
        alpha: solver.alpha,
        rho,
        iterations,
    }
}
