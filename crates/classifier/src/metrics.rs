use std::fmt;

use serde::{Deserialize, Serialize};
use weather_common::WeatherClass;

/// Fraction of matching labels; 0 for empty input
pub fn accuracy(truth: &[WeatherClass], predicted: &[WeatherClass]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// Counts indexed `[truth][predicted]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; WeatherClass::COUNT]; WeatherClass::COUNT],
}

impl ConfusionMatrix {
    pub fn new(truth: &[WeatherClass], predicted: &[WeatherClass]) -> Self {
        let mut counts = [[0; WeatherClass::COUNT]; WeatherClass::COUNT];
        for (t, p) in truth.iter().zip(predicted) {
            counts[t.index()][p.index()] += 1;
        }
        Self { counts }
    }

    pub fn get(&self, truth: WeatherClass, predicted: WeatherClass) -> usize {
        self.counts[truth.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..WeatherClass::COUNT).map(|i| self.counts[i][i]).sum()
    }

    fn support(&self, class: WeatherClass) -> usize {
        self.counts[class.index()].iter().sum()
    }

    fn predicted_count(&self, class: WeatherClass) -> usize {
        self.counts.iter().map(|row| row[class.index()]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for class in WeatherClass::ALL {
            write!(f, "{:>10}", class.name())?;
        }
        writeln!(f)?;
        for truth in WeatherClass::ALL {
            write!(f, "{:>10}", truth.name())?;
            for predicted in WeatherClass::ALL {
                write!(f, "{:>10}", self.get(truth, predicted))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub class: WeatherClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision, recall and F1 plus overall accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassScores>,
    pub confusion: ConfusionMatrix,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ClassificationReport {
    pub fn new(truth: &[WeatherClass], predicted: &[WeatherClass]) -> Self {
        let confusion = ConfusionMatrix::new(truth, predicted);
        let classes = WeatherClass::ALL
            .iter()
            .map(|&class| {
                let tp = confusion.get(class, class);
                let precision = ratio(tp, confusion.predicted_count(class));
                let recall = ratio(tp, confusion.support(class));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScores {
                    class,
                    precision,
                    recall,
                    f1,
                    support: confusion.support(class),
                }
            })
            .collect();
        Self {
            accuracy: ratio(confusion.correct(), confusion.total()),
            classes,
            confusion,
        }
    }

    /// Unweighted mean F1 over classes with support
    pub fn macro_f1(&self) -> f64 {
        let supported: Vec<_> = self.classes.iter().filter(|s| s.support > 0).collect();
        if supported.is_empty() {
            return 0.0;
        }
        supported.iter().map(|s| s.f1).sum::<f64>() / supported.len() as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>10}{:>11}{:>10}{:>10}{:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for s in &self.classes {
            writeln!(
                f,
                "{:>10}{:>11.2}{:>10.2}{:>10.2}{:>10}",
                s.class.name(),
                s.precision,
                s.recall,
                s.f1,
                s.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "macro f1: {:.4}", self.macro_f1())?;
        writeln!(f)?;
        write!(f, "{}", self.confusion)
    }
}
