use tracing::debug;
use weather_common::ConfidenceList;

use crate::{
    config::FusionConfig,
    rules::{Ranking, Rule, STANDARD_RULES, top_class},
    verdict::Verdict,
};

/// Evaluates an ordered rule table against confidence lists
#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: FusionConfig,
    rules: Vec<Rule>,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

impl FusionEngine {
    /// Engine with the standard rule table
    pub fn new(config: FusionConfig) -> Self {
        Self::with_rules(config, STANDARD_RULES.to_vec())
    }

    pub fn with_rules(config: FusionConfig, rules: Vec<Rule>) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn decide(&self, confidences: &ConfidenceList) -> Verdict {
        let Some(ranking) = Ranking::new(confidences, &self.config) else {
            return Verdict::unknown();
        };

        let verdict = self
            .rules
            .iter()
            .find(|rule| (rule.guard)(&ranking))
            .map_or_else(|| top_class(&ranking), |rule| (rule.build)(&ranking));
        debug!(
            "Fused {} (entropy {:.3}) via {}",
            verdict.prediction,
            ranking.entropy(),
            verdict.rule
        );
        verdict
    }
}
