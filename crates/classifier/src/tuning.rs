//! Stratified splitting, cross-validation and hyperparameter grid search

use ndarray::{Array2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use weather_common::WeatherClass;

use crate::{
    config::{ClassifierConfig, Gamma, GridSearchConfig},
    error::{ClassifierError, Result},
    metrics::accuracy,
    model::FittedPipeline,
};

/// Sample indices of each class, in input order
fn indices_by_class(labels: &[WeatherClass]) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); WeatherClass::COUNT];
    for (i, label) in labels.iter().enumerate() {
        groups[label.index()].push(i);
    }
    groups
}

/// Test indices of `k` stratified folds. The m-th sample of every class
/// goes to fold `m % k`, so class proportions are kept in each fold.
pub fn stratified_folds(labels: &[WeatherClass], k: usize) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(ClassifierError::InvalidHyperparameter(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    if labels.len() < k {
        return Err(ClassifierError::InvalidTrainingSet(format!(
            "{} samples cannot be split into {k} folds",
            labels.len()
        )));
    }

    let mut folds = vec![Vec::new(); k];
    for group in indices_by_class(labels) {
        for (m, index) in group.into_iter().enumerate() {
            folds[m % k].push(index);
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// Seeded stratified train/test split. Every class with at least two samples
/// contributes at least one test sample and keeps at least one for training.
pub fn stratified_split(
    labels: &[WeatherClass],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::InvalidHyperparameter(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut group in indices_by_class(labels) {
        group.shuffle(&mut rng);
        let n = group.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

fn select_labels(labels: &[WeatherClass], indices: &[usize]) -> Vec<WeatherClass> {
    indices.iter().map(|&i| labels[i]).collect()
}

/// Mean held-out accuracy over stratified folds
pub fn cross_val_accuracy(
    x: &Array2<f64>,
    labels: &[WeatherClass],
    config: &ClassifierConfig,
    k: usize,
) -> Result<f64> {
    if x.nrows() != labels.len() {
        return Err(ClassifierError::InvalidTrainingSet(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            labels.len()
        )));
    }
    let folds = stratified_folds(labels, k)?;
    let mut total = 0.0;
    for test in &folds {
        let train: Vec<usize> = (0..labels.len()).filter(|i| test.binary_search(i).is_err()).collect();
        let model = FittedPipeline::fit(
            &x.select(Axis(0), &train),
            &select_labels(labels, &train),
            config,
        )?;
        let predicted = model.predict(&x.select(Axis(0), test))?;
        total += accuracy(&select_labels(labels, test), &predicted);
    }
    Ok(total / folds.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub c: f64,
    pub gamma: Gamma,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_c: f64,
    pub best_gamma: Gamma,
    pub best_score: f64,
    /// Every evaluated point in grid order (C outer, gamma inner)
    pub points: Vec<GridPoint>,
}

/// Exhaustive search over `grid`, scoring each point by stratified
/// cross-validated accuracy. Ties go to the earliest point in grid order.
pub fn grid_search(
    x: &Array2<f64>,
    labels: &[WeatherClass],
    base: &ClassifierConfig,
    grid: &GridSearchConfig,
) -> Result<GridSearchResult> {
    if grid.c_values.is_empty() || grid.gamma_values.is_empty() {
        return Err(ClassifierError::InvalidHyperparameter("empty search grid".to_string()));
    }

    let candidates: Vec<(f64, Gamma)> = grid
        .c_values
        .iter()
        .flat_map(|&c| grid.gamma_values.iter().map(move |&gamma| (c, gamma)))
        .collect();
    info!(
        "Grid search over {} candidates with {}-fold cross-validation",
        candidates.len(),
        grid.folds
    );

    let points = candidates
        .into_par_iter()
        .map(|(c, gamma)| {
            let config = ClassifierConfig { c, gamma, ..base.clone() };
            config.validate()?;
            let score = cross_val_accuracy(x, labels, &config, grid.folds)?;
            debug!("C={} gamma={}: accuracy {:.4}", c, gamma, score);
            Ok(GridPoint { c, gamma, score })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut best = 0;
    for (i, point) in points.iter().enumerate().skip(1) {
        if point.score > points[best].score {
            best = i;
        }
    }
    let GridPoint { c, gamma, score } = points[best].clone();
    info!("Best parameters: C={} gamma={} (cv accuracy {:.4})", c, gamma, score);

    Ok(GridSearchResult {
        best_c: c,
        best_gamma: gamma,
        best_score: score,
        points,
    })
}
