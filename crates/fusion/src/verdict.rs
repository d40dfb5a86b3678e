use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::icon::{DEFAULT_ICON, sanitize_icon_key};

/// Which decision rule produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleKind {
    NoData,
    Mixed,
    Dominant,
    RainWithFog,
    Overcast,
    PartlyCloudy,
    Sunshower,
    TopClass,
}

/// Human-facing outcome of the decision rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    /// Display label, a class name or a composite such as "Mendung"
    pub prediction: String,
    /// Icon file stem
    pub icon_key: String,
    /// Explanation with `<strong>` emphasis around class names
    pub explanation: String,
    pub rule: RuleKind,
}

impl Verdict {
    /// Verdict whose icon is derived from `icon_label`
    pub fn new(
        rule: RuleKind,
        prediction: impl Into<String>,
        icon_label: &str,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            prediction: prediction.into(),
            icon_key: sanitize_icon_key(icon_label),
            explanation: explanation.into(),
            rule,
        }
    }

    pub fn unknown() -> Self {
        Self {
            prediction: "Tidak Diketahui".to_string(),
            icon_key: DEFAULT_ICON.to_string(),
            explanation: "Data probabilitas tidak tersedia.".to_string(),
            rule: RuleKind::NoData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown() {
        let verdict = Verdict::unknown();
        assert_eq!(verdict.prediction, "Tidak Diketahui");
        assert_eq!(verdict.icon_key, "default");
        assert!(!verdict.explanation.is_empty());
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(RuleKind::RainWithFog.to_string(), "rain_with_fog");
        let json = serde_json::to_string(&RuleKind::TopClass).unwrap();
        assert_eq!(json, "\"top_class\"");
    }
}
