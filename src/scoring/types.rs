// Scoring types
// Per-rule score components, the final verdict and the full analysis record

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, FeatureSet, Signal};

/// Final two-way decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    AiGenerated,
    Human,
}

impl Classification {
    /// `score >= threshold` is AI_GENERATED, anything lower HUMAN
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Classification::AiGenerated
        } else {
            Classification::Human
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "AI_GENERATED",
            Classification::Human => "HUMAN",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one policy rule scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub analyzer: Analyzer,
    pub signal: Signal,

    /// Measured value, `None` when indeterminate
    pub value: Option<f64>,

    pub weight: f64,

    /// Weight actually added to the score, in [0, weight]
    pub contribution: f64,

    /// Value fell on the suspicious side of the threshold
    pub triggered: bool,
}

impl ComponentScore {
    pub fn is_indeterminate(&self) -> bool {
        self.value.is_none()
    }

    /// Contribution as a share of the rule weight
    pub fn suspicion(&self) -> f64 {
        if self.weight > 0.0 {
            self.contribution / self.weight
        } else {
            0.0
        }
    }
}

/// Per-rule breakdown in policy-table order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreComponents {
    components: Vec<ComponentScore>,
}

impl ScoreComponents {
    pub fn new(components: Vec<ComponentScore>) -> Self {
        ScoreComponents { components }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentScore> {
        self.components.iter()
    }

    pub fn get(&self, analyzer: Analyzer) -> Option<&ComponentScore> {
        self.components.iter().find(|c| c.analyzer == analyzer)
    }

    /// Triggered analyzers in fixed priority order
    pub fn triggered(&self) -> Vec<Analyzer> {
        Analyzer::ALL
            .into_iter()
            .filter(|&a| self.get(a).is_some_and(|c| c.triggered))
            .collect()
    }

    /// True when no rule could read a value
    pub fn all_indeterminate(&self) -> bool {
        self.components.iter().all(ComponentScore::is_indeterminate)
    }

    /// Share of total rule weight whose signal was measured, in [0, 1]
    pub fn measured_weight(&self) -> f64 {
        let total: f64 = self.components.iter().map(|c| c.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let measured: f64 = self
            .components
            .iter()
            .filter(|c| !c.is_indeterminate())
            .map(|c| c.weight)
            .sum();
        measured / total
    }

    /// Number of rules whose signal was measured
    pub fn measured_count(&self) -> usize {
        self.components.iter().filter(|c| !c.is_indeterminate()).count()
    }

    /// Sum of contributions, unclamped
    pub fn total(&self) -> f64 {
        self.components.iter().map(|c| c.contribution).sum()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Classification result returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub classification: Classification,

    /// Aggregate likelihood of synthetic origin, in [0, 1]
    pub confidence_score: f64,

    pub explanation: String,
}

/// Verdict plus everything that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub features: FeatureSet,
    pub components: ScoreComponents,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_threshold_is_inclusive() {
        assert_eq!(Classification::from_score(0.5, 0.5), Classification::AiGenerated);
        assert_eq!(Classification::from_score(0.4999, 0.5), Classification::Human);
        assert_eq!(Classification::from_score(1.0, 0.5), Classification::AiGenerated);
        assert_eq!(Classification::from_score(0.0, 0.5), Classification::Human);
    }

    #[test]
    fn test_classification_serde() {
        assert_eq!(
            serde_json::to_string(&Classification::AiGenerated).unwrap(),
            "\"AI_GENERATED\""
        );
        assert_eq!(serde_json::to_string(&Classification::Human).unwrap(), "\"HUMAN\"");
        assert_eq!(Classification::Human.to_string(), "HUMAN");
    }

    #[test]
    fn test_verdict_uses_camel_case() {
        let verdict = Verdict {
            classification: Classification::Human,
            confidence_score: 0.25,
            explanation: "natural".to_string(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["confidenceScore"], 0.25);
        assert_eq!(json["classification"], "HUMAN");
    }

    #[test]
    fn test_triggered_follows_priority_order() {
        let component = |analyzer: Analyzer, signal: Signal, triggered: bool| ComponentScore {
            analyzer,
            signal,
            value: Some(0.0),
            weight: 0.1,
            contribution: if triggered { 0.1 } else { 0.0 },
            triggered,
        };
        let components = ScoreComponents::new(vec![
            component(Analyzer::Statistical, Signal::Kurtosis, true),
            component(Analyzer::Pitch, Signal::PitchVariability, true),
            component(Analyzer::Energy, Signal::EnergyConsistency, false),
        ]);

        assert_eq!(
            components.triggered(),
            vec![Analyzer::Pitch, Analyzer::Statistical]
        );
        assert!((components.total() - 0.2).abs() < 1e-12);
        assert!(!components.all_indeterminate());
        assert_eq!(components.measured_count(), 3);
        assert!((components.measured_weight() - 1.0).abs() < 1e-12);
    }
}
