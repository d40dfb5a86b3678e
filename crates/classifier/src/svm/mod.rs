//! One-vs-one RBF support vector classification with calibrated
//! probabilities

pub mod probability;
pub mod smo;

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::ClassifierConfig,
    error::{ClassifierError, Result},
    kernel::RbfKernel,
};
use smo::{KernelView, solve};

/// Binary machine separating `classes[positive]` from `classes[negative]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PairMachine {
    positive: usize,
    negative: usize,
    /// `(support vector index, alpha * y)`
    coef: Vec<(usize, f64)>,
    rho: f64,
    prob_a: f64,
    prob_b: f64,
}

impl PairMachine {
    fn decision(&self, kernel_row: &[f64]) -> f64 {
        self.coef.iter().map(|&(sv, c)| c * kernel_row[sv]).sum::<f64>() - self.rho
    }
}

/// Fitted multi-class SVC.
///
/// Probabilities are produced for every label in `0..n_labels`; labels never
/// seen during training get probability 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svc {
    kernel: RbfKernel,
    n_labels: usize,
    /// Labels present in the training data, ascending
    classes: Vec<usize>,
    support_vectors: Array2<f64>,
    pairs: Vec<PairMachine>,
}

/// `n / (n_classes * n_k)` for every class present
fn balanced_weights(labels: &[usize], classes: &[usize]) -> BTreeMap<usize, f64> {
    let n = labels.len() as f64;
    classes
        .iter()
        .map(|&class| {
            let count = labels.iter().filter(|&&l| l == class).count() as f64;
            (class, n / (classes.len() as f64 * count))
        })
        .collect()
}

impl Svc {
    /// Train on the rows of `x` with label indices below `n_labels`
    pub fn fit(
        x: &Array2<f64>,
        labels: &[usize],
        n_labels: usize,
        gamma: f64,
        config: &ClassifierConfig,
    ) -> Result<Self> {
        if x.nrows() != labels.len() {
            return Err(ClassifierError::InvalidTrainingSet(format!(
                "{} samples but {} labels",
                x.nrows(),
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_labels) {
            return Err(ClassifierError::InvalidTrainingSet(format!(
                "label index {bad} out of range"
            )));
        }
        let mut classes: Vec<usize> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::InvalidTrainingSet(
                "at least two classes are required".to_string(),
            ));
        }

        let kernel = RbfKernel::new(gamma);
        let gram = kernel.matrix(x, x);
        let weights = balanced_weights(labels, &classes);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut sv_index: BTreeMap<usize, usize> = BTreeMap::new();
        let mut raw_pairs = Vec::new();

        for a in 0..classes.len() {
            for b in a + 1..classes.len() {
                let indices: Vec<usize> = (0..labels.len())
                    .filter(|&i| labels[i] == classes[a] || labels[i] == classes[b])
                    .collect();
                let y: Vec<f64> = indices
                    .iter()
                    .map(|&i| if labels[i] == classes[a] { 1.0 } else { -1.0 })
                    .collect();
                let c: Vec<f64> = indices
                    .iter()
                    .map(|&i| config.c * weights[&labels[i]])
                    .collect();

                let (prob_a, prob_b) = calibrate(&gram, &indices, &y, &c, config, &mut rng);

                let view = KernelView::new(&gram, &indices);
                let solution = solve(&view, &y, &c, config.tolerance, config.max_iterations);
                debug!(
                    "Pair ({}, {}) converged in {} iterations",
                    classes[a], classes[b], solution.iterations
                );

                let coef: Vec<(usize, f64)> = solution
                    .alpha
                    .iter()
                    .enumerate()
                    .filter(|(_, alpha)| **alpha > 0.0)
                    .map(|(local, &alpha)| (indices[local], alpha * y[local]))
                    .collect();
                for &(global, _) in &coef {
                    let next = sv_index.len();
                    sv_index.entry(global).or_insert(next);
                }
                raw_pairs.push((a, b, coef, solution.rho, prob_a, prob_b));
            }
        }

        let mut sv_rows: Vec<(usize, usize)> = sv_index.iter().map(|(&g, &s)| (s, g)).collect();
        sv_rows.sort_unstable();
        let support_vectors = x.select(Axis(0), &sv_rows.iter().map(|&(_, g)| g).collect::<Vec<_>>());

        let pairs = raw_pairs
            .into_iter()
            .map(|(positive, negative, coef, rho, prob_a, prob_b)| PairMachine {
                positive,
                negative,
                coef: coef.into_iter().map(|(g, c)| (sv_index[&g], c)).collect(),
                rho,
                prob_a,
                prob_b,
            })
            .collect();

        info!(
            "Trained SVC on {} samples, {} classes, {} support vectors",
            x.nrows(),
            classes.len(),
            support_vectors.nrows()
        );

        Ok(Self {
            kernel,
            n_labels,
            classes,
            support_vectors,
            pairs,
        })
    }

    pub fn gamma(&self) -> f64 {
        self.kernel.gamma
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.nrows()
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features() {
            return Err(ClassifierError::FeatureDimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok(())
    }

    /// Pairwise decision values, one row per sample, pairs in training order
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        let k = self.kernel.matrix(x, &self.support_vectors);
        let mut out = Array2::zeros((x.nrows(), self.pairs.len()));
        for (i, row) in k.rows().into_iter().enumerate() {
            let row = row.to_vec();
            for (p, pair) in self.pairs.iter().enumerate() {
                out[[i, p]] = pair.decision(&row);
            }
        }
        Ok(out)
    }

    /// Label with the most pairwise votes, ties to the lower label
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let decisions = self.decision_function(x)?;
        Ok(decisions
            .rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0usize; self.classes.len()];
                for (pair, &d) in self.pairs.iter().zip(row.iter()) {
                    if d > 0.0 {
                        votes[pair.positive] += 1;
                    } else {
                        votes[pair.negative] += 1;
                    }
                }
                let mut best = 0;
                for (c, &v) in votes.iter().enumerate() {
                    if v > votes[best] {
                        best = c;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    /// Class probabilities, one row per sample, `n_labels` columns
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let decisions = self.decision_function(x)?;
        let k = self.classes.len();
        let mut out = Array2::zeros((x.nrows(), self.n_labels));

        for (i, row) in decisions.rows().into_iter().enumerate() {
            let mut r = vec![vec![0.0f64; k]; k];
            for (pair, &d) in self.pairs.iter().zip(row.iter()) {
                let p = probability::clamp_pairwise(probability::sigmoid_predict(
                    d,
                    pair.prob_a,
                    pair.prob_b,
                ));
                r[pair.positive][pair.negative] = p;
                r[pair.negative][pair.positive] = 1.0 - p;
            }
            for (c, p) in probability::couple(&r).into_iter().enumerate() {
                out[[i, self.classes[c]]] = p;
            }
        }
        Ok(out)
    }
}

/// Sigmoid parameters for one pair from internal cross-validated decision
/// values
fn calibrate(
    gram: &Array2<f64>,
    indices: &[usize],
    y: &[f64],
    c: &[f64],
    config: &ClassifierConfig,
    rng: &mut StdRng,
) -> (f64, f64) {
    let n = indices.len();
    let folds = config.probability_folds;
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);

    let mut decision = vec![0.0f64; n];
    for fold in 0..folds {
        let begin = fold * n / folds;
        let end = (fold + 1) * n / folds;
        let held_out = &perm[begin..end];
        let train: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();

        let positives = train.iter().filter(|&&t| y[t] > 0.0).count();
        let negatives = train.len() - positives;

        if positives == 0 || negatives == 0 {
            let value = match (positives, negatives) {
                (0, 0) => 0.0,
                (_, 0) => 1.0,
                _ => -1.0,
            };
            for &h in held_out {
                decision[h] = value;
            }
            continue;
        }

        let train_global: Vec<usize> = train.iter().map(|&t| indices[t]).collect();
        let train_y: Vec<f64> = train.iter().map(|&t| y[t]).collect();
        let train_c: Vec<f64> = train.iter().map(|&t| c[t]).collect();
        let view = KernelView::new(gram, &train_global);
        let solution = solve(&view, &train_y, &train_c, config.tolerance, config.max_iterations);

        for &h in held_out {
            let global = indices[h];
            decision[h] = solution.decision(&train_y, |t| gram[[train_global[t], global]]);
        }
    }

    let positive: Vec<bool> = y.iter().map(|&v| v > 0.0).collect();
    probability::sigmoid_train(&decision, &positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Three well separated 2-D blobs, label 3 never appears
    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let centres = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (label, &(cx, cy)) in centres.iter().enumerate() {
            for k in 0..8 {
                let angle = k as f64 * std::f64::consts::PI / 4.0;
                let radius = 0.3 + 0.05 * k as f64;
                rows.push(cx + radius * angle.cos());
                rows.push(cy + radius * angle.sin());
                labels.push(label);
            }
        }
        (Array2::from_shape_vec((labels.len(), 2), rows).unwrap(), labels)
    }

    #[test]
    fn test_fits_and_predicts_blobs() {
        let (x, labels) = blobs();
        let svc = Svc::fit(&x, &labels, 4, 0.5, &ClassifierConfig::default()).unwrap();
        assert_eq!(svc.classes(), &[0, 1, 2]);
        assert_eq!(svc.predict(&x).unwrap(), labels);

        let probe = ndarray::array![[4.1, 0.1], [0.1, 3.9]];
        assert_eq!(svc.predict(&probe).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let (x, labels) = blobs();
        let svc = Svc::fit(&x, &labels, 4, 0.5, &ClassifierConfig::default()).unwrap();
        let proba = svc.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (24, 4));
        for (row, &label) in proba.rows().into_iter().zip(&labels) {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert_eq!(row[3], 0.0);
            let best = (0..4).max_by(|&a, &b| row[a].total_cmp(&row[b])).unwrap();
            assert_eq!(best, label);
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let (x, labels) = blobs();
        let config = ClassifierConfig::default();
        let a = Svc::fit(&x, &labels, 4, 0.5, &config).unwrap();
        let b = Svc::fit(&x, &labels, 4, 0.5, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_balanced_weights() {
        let weights = balanced_weights(&[0, 0, 0, 1], &[0, 1]);
        assert_relative_eq!(weights[&0], 4.0 / 6.0);
        assert_relative_eq!(weights[&1], 2.0);
    }

    #[test]
    fn test_rejects_single_class() {
        let x = Array2::zeros((3, 2));
        let err = Svc::fit(&x, &[1, 1, 1], 4, 1.0, &ClassifierConfig::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidTrainingSet(_)));
    }

    #[test]
    fn test_feature_dimension_is_checked() {
        let (x, labels) = blobs();
        let svc = Svc::fit(&x, &labels, 4, 0.5, &ClassifierConfig::default()).unwrap();
        let err = svc.predict(&Array2::zeros((1, 3))).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::FeatureDimensionMismatch { expected: 2, actual: 3 }
        ));
    }
}
