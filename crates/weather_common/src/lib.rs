//! # Weather Common - Shared Types and Utilities
//!
//! Shared data structures for the weather classification workspace: the
//! canonical class list, per-class confidences and the sorted confidence list
//! handed from the classifier to the decision fusion engine.
//!
//! ## Example
//!
//! ```rust
//! use weather_common::{ConfidenceList, WeatherClass};
//!
//! // Probabilities are indexed by the canonical class order
//! let list = ConfidenceList::from_probabilities(&[0.10, 0.05, 0.80, 0.05]).unwrap();
//! assert_eq!(list.top().unwrap().class, WeatherClass::Cerah);
//! assert_eq!(list.top().unwrap().percent, 80.0);
//! ```

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;

/// Result type for shared weather operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Standard error type for shared weather operations
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Unknown weather class: {0}")]
    UnknownClass(String),

    #[error("Class index {0} is out of range")]
    ClassIndexOutOfRange(usize),

    #[error("Expected {expected} probabilities, got {actual}")]
    ProbabilityCount { expected: usize, actual: usize },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Weather categories recognised by the classifier.
///
/// The declaration order is the label index order used by training data,
/// persisted models and probability vectors. Do not reorder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum WeatherClass {
    /// Cloudy sky
    Berawan,
    /// Rain
    Hujan,
    /// Sunny / clear sky
    Cerah,
    /// Fog or haze
    Berkabut,
}

impl WeatherClass {
    /// All classes in label index order
    pub const ALL: [WeatherClass; 4] = [
        WeatherClass::Berawan,
        WeatherClass::Hujan,
        WeatherClass::Cerah,
        WeatherClass::Berkabut,
    ];

    /// Number of classes
    pub const COUNT: usize = Self::ALL.len();

    /// Label index of this class
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a class by label index
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(CommonError::ClassIndexOutOfRange(index))
    }

    /// Canonical display name (also the dataset directory name)
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Canonical class names in label index order
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Parse a class name, ignoring ASCII case
    pub fn parse(name: &str) -> Result<Self> {
        name.trim()
            .parse()
            .map_err(|_| CommonError::UnknownClass(name.to_string()))
    }
}

/// A single (class, confidence) pair with the confidence in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassConfidence {
    pub class: WeatherClass,
    /// Confidence in percent, in `[0, 100]`
    pub percent: f64,
}

impl ClassConfidence {
    /// Create a new confidence pair
    pub fn new(class: WeatherClass, percent: f64) -> Self {
        Self { class, percent }
    }

    /// Confidence as a probability in `[0, 1]`
    pub fn probability(&self) -> f64 {
        self.percent / 100.0
    }
}

/// Confidences sorted by percent descending, ties broken by class index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfidenceList {
    entries: Vec<ClassConfidence>,
}

impl ConfidenceList {
    /// Build a list from arbitrary entries, sorting them into canonical order
    pub fn new(entries: Vec<ClassConfidence>) -> Self {
        let mut list = Self { entries };
        list.sort();
        list
    }

    /// Build a list from a probability row indexed by class.
    ///
    /// Percentages are rounded to two decimals.
    pub fn from_probabilities(probabilities: &[f64]) -> Result<Self> {
        if probabilities.len() != WeatherClass::COUNT {
            return Err(CommonError::ProbabilityCount {
                expected: WeatherClass::COUNT,
                actual: probabilities.len(),
            });
        }

        let mut entries = Vec::with_capacity(probabilities.len());
        for (class, &p) in WeatherClass::ALL.iter().zip(probabilities) {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(CommonError::InvalidValue {
                    message: format!("probability for {class} must be in [0, 1], got {p}"),
                });
            }
            entries.push(ClassConfidence::new(*class, round_percent(p * 100.0)));
        }

        Ok(Self::new(entries))
    }

    /// Re-sort into canonical order (percent descending, then class index)
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.percent
                .total_cmp(&a.percent)
                .then_with(|| a.class.index().cmp(&b.class.index()))
        });
    }

    /// Highest-confidence entry
    pub fn top(&self) -> Option<&ClassConfidence> {
        self.entries.first()
    }

    /// Entry at the given rank (0 = highest)
    pub fn get(&self, rank: usize) -> Option<&ClassConfidence> {
        self.entries.get(rank)
    }

    /// Confidence of a class, 0 when absent
    pub fn percent_of(&self, class: WeatherClass) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.class == class)
            .map_or(0.0, |entry| entry.percent)
    }

    /// Sum of all percentages
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.percent).sum()
    }

    pub fn entries(&self) -> &[ClassConfidence] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassConfidence> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ClassConfidence> for ConfidenceList {
    fn from_iter<I: IntoIterator<Item = ClassConfidence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Utility functions for file handling
pub mod utils {
    use std::path::Path;

    /// File extensions accepted as input photographs
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

    /// Check if a file extension indicates a supported image file
    pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
        get_file_extension(path)
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Ensure output directory exists
    pub fn ensure_output_dir<P: AsRef<Path>>(path: P) -> super::Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_index_round_trip() {
        for (i, class) in WeatherClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(WeatherClass::from_index(i).unwrap(), *class);
        }
        assert!(WeatherClass::from_index(4).is_err());
    }

    #[test]
    fn test_class_names_follow_label_order() {
        assert_eq!(WeatherClass::names(), &["Berawan", "Hujan", "Cerah", "Berkabut"]);
        assert_eq!(WeatherClass::Cerah.to_string(), "Cerah");
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!(WeatherClass::parse("hujan").unwrap(), WeatherClass::Hujan);
        assert_eq!(WeatherClass::parse(" BERKABUT ").unwrap(), WeatherClass::Berkabut);
        assert!(WeatherClass::parse("Salju").is_err());
    }

    #[test]
    fn test_from_probabilities_sorts_descending() {
        let list = ConfidenceList::from_probabilities(&[0.2, 0.1, 0.6, 0.1]).unwrap();
        let classes: Vec<_> = list.iter().map(|c| c.class).collect();
        assert_eq!(
            classes,
            vec![WeatherClass::Cerah, WeatherClass::Berawan, WeatherClass::Hujan, WeatherClass::Berkabut]
        );
        assert!((list.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_break_by_class_index() {
        let list = ConfidenceList::new(vec![
            ClassConfidence::new(WeatherClass::Berkabut, 25.0),
            ClassConfidence::new(WeatherClass::Cerah, 25.0),
            ClassConfidence::new(WeatherClass::Hujan, 25.0),
            ClassConfidence::new(WeatherClass::Berawan, 25.0),
        ]);
        let classes: Vec<_> = list.iter().map(|c| c.class).collect();
        assert_eq!(classes, WeatherClass::ALL.to_vec());
    }

    #[test]
    fn test_percentages_are_rounded() {
        let list = ConfidenceList::from_probabilities(&[0.123456, 0.2, 0.3, 0.376544]).unwrap();
        assert_eq!(list.percent_of(WeatherClass::Berawan), 12.35);
    }

    #[test]
    fn test_rejects_bad_probability_rows() {
        assert!(ConfidenceList::from_probabilities(&[0.5, 0.5]).is_err());
        assert!(ConfidenceList::from_probabilities(&[f64::NAN, 0.5, 0.25, 0.25]).is_err());
    }

    #[test]
    fn test_file_utilities() {
        assert!(utils::is_image_file("photo.JPG"));
        assert!(!utils::is_image_file("clip.mp4"));
        assert!(utils::is_image_file("a/b/photo.Png"));
        assert!(!utils::is_image_file("a/b/README"));
    }
}
