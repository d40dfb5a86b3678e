//! # Weather Decision Fusion
//!
//! Turns a ranked list of class confidences into a single human-facing
//! verdict: a label, an icon key and an explanation. Rules are evaluated in
//! a fixed order and the first match wins:
//!
//! 1. no data
//! 2. high entropy, reported as "Cuaca Campuran"
//! 3. a dominant top class
//! 4. combination rules over the leading classes
//! 5. the top class, optionally naming a secondary influence
//!
//! ```rust
//! use fusion::decide;
//! use weather_common::{ClassConfidence, ConfidenceList, WeatherClass};
//!
//! let confidences: ConfidenceList = [
//!     ClassConfidence::new(WeatherClass::Cerah, 90.0),
//!     ClassConfidence::new(WeatherClass::Berawan, 6.0),
//!     ClassConfidence::new(WeatherClass::Hujan, 3.0),
//!     ClassConfidence::new(WeatherClass::Berkabut, 1.0),
//! ]
//! .into_iter()
//! .collect();
//! let verdict = decide(&confidences);
//! assert_eq!(verdict.prediction, "Cerah");
//! assert_eq!(verdict.icon_key, "cerah");
//! ```

pub mod config;
pub mod engine;
pub mod entropy;
pub mod icon;
pub mod rules;
pub mod verdict;

pub use config::FusionConfig;
pub use engine::FusionEngine;
pub use entropy::shannon_entropy;
pub use icon::sanitize_icon_key;
pub use rules::{Ranking, Rule, STANDARD_RULES};
pub use verdict::{RuleKind, Verdict};

use weather_common::ConfidenceList;

/// Decide with the standard rules and thresholds
pub fn decide(confidences: &ConfidenceList) -> Verdict {
    FusionEngine::default().decide(confidences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_common::{ClassConfidence, WeatherClass::*, WeatherClass};

    fn list(entries: &[(WeatherClass, f64)]) -> ConfidenceList {
        entries.iter().map(|&(c, p)| ClassConfidence::new(c, p)).collect()
    }

    #[test]
    fn test_empty_is_unknown() {
        let verdict = decide(&ConfidenceList::default());
        assert_eq!(verdict.prediction, "Tidak Diketahui");
        assert_eq!(verdict.icon_key, "default");
        assert_eq!(verdict.rule, RuleKind::NoData);
        assert!(!verdict.explanation.is_empty());
    }

    #[test]
    fn test_dominant_class() {
        let verdict = decide(&list(&[(Cerah, 90.0), (Berawan, 5.0), (Hujan, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.prediction, "Cerah");
        assert_eq!(verdict.icon_key, "cerah");
        assert_eq!(verdict.rule, RuleKind::Dominant);
    }

    #[test]
    fn test_dominant_threshold_is_inclusive() {
        let verdict = decide(&list(&[(Hujan, 75.0), (Berawan, 20.0), (Cerah, 4.0), (Berkabut, 1.0)]));
        assert_eq!(verdict.rule, RuleKind::Dominant);
        assert_eq!(verdict.prediction, "Hujan");
    }

    #[test]
    fn test_near_uniform_is_mixed() {
        let verdict = decide(&list(&[(Hujan, 30.0), (Cerah, 28.0), (Berawan, 24.0), (Berkabut, 18.0)]));
        assert_eq!(verdict.prediction, "Cuaca Campuran");
        assert_eq!(verdict.rule, RuleKind::Mixed);
        // Icon comes from the top class
        assert_eq!(verdict.icon_key, "hujan");
        assert!(verdict.explanation.contains("<strong>Hujan</strong> (30%)"));
        assert!(verdict.explanation.contains("<strong>Cerah</strong> (28%)"));
        assert!(verdict.explanation.contains("(1.97)"));
    }

    #[test]
    fn test_close_pairs_above_entropy_gate_are_mixed() {
        // Entropies of about 1.76 and 1.90, both over the 1.6 gate
        let sunny_cloudy = list(&[(Cerah, 40.0), (Berawan, 38.0), (Hujan, 12.0), (Berkabut, 10.0)]);
        let cloudy_rain = list(&[(Berawan, 35.0), (Hujan, 33.0), (Cerah, 17.0), (Berkabut, 15.0)]);
        assert_eq!(decide(&sunny_cloudy).prediction, "Cuaca Campuran");
        assert_eq!(decide(&cloudy_rain).prediction, "Cuaca Campuran");
    }

    #[test]
    fn test_rain_with_fog() {
        let verdict = decide(&list(&[(Berkabut, 45.0), (Hujan, 40.0), (Berawan, 14.0), (Cerah, 1.0)]));
        assert_eq!(verdict.prediction, "Hujan Disertai Kabut");
        assert_eq!(verdict.icon_key, "hujan_berkabut");
        assert_eq!(verdict.rule, RuleKind::RainWithFog);
    }

    #[test]
    fn test_overcast() {
        let verdict = decide(&list(&[(Berawan, 55.0), (Hujan, 40.0), (Cerah, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.prediction, "Mendung");
        assert_eq!(verdict.icon_key, "mendung");

        // Either order of the top two
        let verdict = decide(&list(&[(Hujan, 55.0), (Berawan, 40.0), (Cerah, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.rule, RuleKind::Overcast);
    }

    #[test]
    fn test_partly_cloudy() {
        let verdict = decide(&list(&[(Cerah, 55.0), (Berawan, 40.0), (Hujan, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.prediction, "Cerah Berawan");
        assert_eq!(verdict.icon_key, "cerah_berawan");
        assert_eq!(verdict.rule, RuleKind::PartlyCloudy);
    }

    #[test]
    fn test_sunshower() {
        let verdict = decide(&list(&[(Hujan, 55.0), (Cerah, 40.0), (Berawan, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.prediction, "Hujan Cerah (Sunshower)");
        assert_eq!(verdict.icon_key, "hujan_cerah");
        assert_eq!(verdict.rule, RuleKind::Sunshower);
    }

    #[test]
    fn test_rain_with_fog_needs_combined_mass() {
        // All three lead but only carry 65% together
        let verdict = decide(&list(&[(Hujan, 30.0), (Berawan, 25.0), (Berkabut, 10.0)]));
        assert_ne!(verdict.rule, RuleKind::RainWithFog);
        assert_eq!(verdict.prediction, "Mendung");
    }

    #[test]
    fn test_fallback_with_secondary_influence() {
        let verdict = decide(&list(&[(Berkabut, 60.0), (Berawan, 30.0), (Cerah, 6.0), (Hujan, 4.0)]));
        assert_eq!(verdict.prediction, "Berkabut");
        assert_eq!(verdict.icon_key, "berkabut");
        assert_eq!(verdict.rule, RuleKind::TopClass);
        assert!(verdict.explanation.contains("pengaruh sekunder"));
    }

    #[test]
    fn test_unsorted_input_is_reranked() {
        let entries = vec![
            ClassConfidence::new(Berkabut, 2.0),
            ClassConfidence::new(Cerah, 90.0),
            ClassConfidence::new(Hujan, 3.0),
            ClassConfidence::new(Berawan, 5.0),
        ];
        // Bypass the sorting constructor
        let json = serde_json::json!({ "entries": entries });
        let unsorted: ConfidenceList = serde_json::from_value(json).unwrap();
        assert_eq!(unsorted.top().unwrap().class, Berkabut);
        assert_eq!(decide(&unsorted).prediction, "Cerah");
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = FusionEngine::new(FusionConfig { dominant_percent: 50.0, ..Default::default() });
        let verdict = engine.decide(&list(&[(Berawan, 55.0), (Hujan, 40.0), (Cerah, 3.0), (Berkabut, 2.0)]));
        assert_eq!(verdict.rule, RuleKind::Dominant);
        assert_eq!(verdict.prediction, "Berawan");
    }

    #[test]
    fn test_engine_without_rules_falls_back() {
        let engine = FusionEngine::with_rules(FusionConfig::default(), Vec::new());
        let verdict = engine.decide(&list(&[(Hujan, 30.0), (Cerah, 28.0), (Berawan, 24.0), (Berkabut, 18.0)]));
        assert_eq!(verdict.rule, RuleKind::TopClass);
        assert_eq!(verdict.prediction, "Hujan");
    }
}
