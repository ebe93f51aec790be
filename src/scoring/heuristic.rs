// Heuristic (rule-based) aggregator
// Scores a feature set against the declarative policy table

use crate::analysis::FeatureSet;
use crate::scoring::config::{AnalyzerRule, EngineConfig};
use crate::scoring::types::{ComponentScore, ScoreComponents};

/// Aggregate score and the per-rule breakdown behind it
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    /// Likelihood of synthetic origin, in [0, 1]
    pub score: f64,

    pub components: ScoreComponents,

    /// Too little of the policy was measured; `score` is the neutral score
    pub insufficient_evidence: bool,
}

/// Weighted rule-based scorer
#[derive(Debug, Clone)]
pub struct HeuristicAggregator {
    rules: Vec<AnalyzerRule>,
    neutral_score: f64,
    min_measured_weight: f64,
}

impl HeuristicAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        HeuristicAggregator {
            rules: config.rules.clone(),
            neutral_score: config.neutral_score,
            min_measured_weight: config.min_measured_weight,
        }
    }

    /// Score a feature set.
    /// When no rule can read a value, or the measured rules carry less than
    /// `min_measured_weight` of the total weight, the neutral score is returned.
    pub fn aggregate(&self, features: &FeatureSet) -> AggregateScore {
        let components = ScoreComponents::new(
            self.rules
                .iter()
                .map(|rule| score_rule(rule, features))
                .collect(),
        );

        let insufficient_evidence = components.all_indeterminate()
            || components.measured_weight() < self.min_measured_weight;

        let score = if insufficient_evidence {
            self.neutral_score
        } else {
            components.total().clamp(0.0, 1.0)
        };

        AggregateScore {
            score,
            components,
            insufficient_evidence,
        }
    }
}

fn score_rule(rule: &AnalyzerRule, features: &FeatureSet) -> ComponentScore {
    let value = features.get(rule.signal);

    let (contribution, triggered) = match value {
        Some(v) => {
            let outcome = rule.comparison.evaluate(v, rule.margin);
            (outcome.fraction * rule.weight, outcome.triggered)
        }
        None => (0.0, false),
    };

    ComponentScore {
        analyzer: rule.analyzer,
        signal: rule.signal,
        value,
        weight: rule.weight,
        contribution,
        triggered,
    }
}
