// Engine configuration
// Declarative policy table, decision threshold and analysis constants, loadable from TOML

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use crate::analysis::{Analyzer, FrameConfig, Signal};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Policy table has no rules")]
    NoRules,

    #[error("Rule weights sum to {0}, expected 1.0")]
    InvalidWeightSum(f64),

    #[error("Analyzer {0} appears in more than one rule")]
    DuplicateAnalyzer(Analyzer),

    #[error("Signal {signal:?} is not produced by the {analyzer} analyzer")]
    SignalMismatch { signal: Signal, analyzer: Analyzer },

    #[error("Invalid rule for {analyzer}: {reason}")]
    InvalidRule { analyzer: Analyzer, reason: String },

    #[error("Invalid frame configuration: {0}")]
    InvalidFrames(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read engine config: {0}")]
    Io(#[from] std::io::Error),
}

/// Which side of a threshold is suspicious
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum Comparison {
    /// Values at or below `threshold` trigger
    Below { threshold: f64 },

    /// Values at or above `threshold` trigger
    Above { threshold: f64 },

    /// Values at or beyond either edge of `[low, high]` trigger
    Outside { low: f64, high: f64 },
}

/// Outcome of testing one value against a rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    /// Share of the rule weight contributed, in [0, 1]
    pub fraction: f64,

    /// Value is on the suspicious side of the threshold
    pub triggered: bool,
}

impl Comparison {
    /// Full weight on the suspicious side, a linear ramp across `margin` on
    /// the natural side, nothing beyond it.
    pub fn evaluate(&self, value: f64, margin: f64) -> RuleOutcome {
        // Distance into the natural side; <= 0 means triggered
        let distance = match *self {
            Comparison::Below { threshold } => value - threshold,
            Comparison::Above { threshold } => threshold - value,
            Comparison::Outside { low, high } => (value - low).min(high - value),
        };

        if distance <= 0.0 {
            RuleOutcome {
                fraction: 1.0,
                triggered: true,
            }
        } else if margin > 0.0 && distance < margin {
            RuleOutcome {
                fraction: 1.0 - distance / margin,
                triggered: false,
            }
        } else {
            RuleOutcome {
                fraction: 0.0,
                triggered: false,
            }
        }
    }

    fn thresholds(&self) -> Vec<f64> {
        match *self {
            Comparison::Below { threshold } | Comparison::Above { threshold } => vec![threshold],
            Comparison::Outside { low, high } => vec![low, high],
        }
    }
}

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerRule {
    pub analyzer: Analyzer,
    pub signal: Signal,
    pub weight: f64,

    /// Width of the partial-credit ramp on the natural side of the threshold
    pub margin: f64,

    pub comparison: Comparison,
}

impl AnalyzerRule {
    fn new(analyzer: Analyzer, signal: Signal, weight: f64, comparison: Comparison, margin: f64) -> Self {
        AnalyzerRule {
            analyzer,
            signal,
            weight,
            margin,
            comparison,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRule {
            analyzer: self.analyzer,
            reason: reason.to_string(),
        };

        if self.signal.analyzer() != self.analyzer {
            return Err(ConfigError::SignalMismatch {
                signal: self.signal,
                analyzer: self.analyzer,
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(invalid("weight must be finite and non-negative"));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(invalid("margin must be finite and non-negative"));
        }
        if self.comparison.thresholds().iter().any(|t| !t.is_finite()) {
            return Err(invalid("thresholds must be finite"));
        }
        if let Comparison::Outside { low, high } = self.comparison {
            if low >= high {
                return Err(invalid("outside band needs low < high"));
            }
        }
        Ok(())
    }
}

/// Complete engine policy, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scores at or above this are classified AI_GENERATED
    pub decision_threshold: f64,

    /// Score reported when too little of the policy could be measured
    pub neutral_score: f64,

    /// Share of total rule weight that must be measured before the weighted
    /// sum is trusted; below it the neutral score is reported
    pub min_measured_weight: f64,

    /// Run the analyzers concurrently on the rayon pool
    pub parallel_extraction: bool,

    pub frames: FrameConfig,

    pub rules: Vec<AnalyzerRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            decision_threshold: 0.5,
            neutral_score: 0.5,
            min_measured_weight: 0.5,
            parallel_extraction: true,
            frames: FrameConfig::default(),
            rules: default_rules(),
        }
    }
}

/// Default policy table; pitch and spectral weigh most
pub fn default_rules() -> Vec<AnalyzerRule> {
    use Comparison::*;

    vec![
        AnalyzerRule::new(
            Analyzer::Pitch,
            Signal::PitchVariability,
            0.25,
            Below { threshold: 0.10 },
            0.15,
        ),
        AnalyzerRule::new(
            Analyzer::Spectral,
            Signal::SpectralCentroidVariation,
            0.22,
            Below { threshold: 0.20 },
            0.15,
        ),
        AnalyzerRule::new(
            Analyzer::Cepstral,
            Signal::MfccVariance,
            0.18,
            Below { threshold: 12.0 },
            18.0,
        ),
        AnalyzerRule::new(
            Analyzer::Energy,
            Signal::EnergyConsistency,
            0.15,
            Above { threshold: 0.75 },
            0.10,
        ),
        AnalyzerRule::new(
            Analyzer::Harmonic,
            Signal::HarmonicRatio,
            0.12,
            Outside { low: 0.30, high: 0.90 },
            0.05,
        ),
        AnalyzerRule::new(
            Analyzer::Statistical,
            Signal::Kurtosis,
            0.08,
            Below { threshold: 1.5 },
            1.0,
        ),
    ]
}

impl EngineConfig {
    /// Parse and validate a TOML policy
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML policy file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::NoRules);
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(rule.analyzer) {
                return Err(ConfigError::DuplicateAnalyzer(rule.analyzer));
            }
        }

        let total: f64 = self.rules.iter().map(|r| r.weight).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidWeightSum(total));
        }

        for (name, value) in [
            ("decision_threshold", self.decision_threshold),
            ("neutral_score", self.neutral_score),
            ("min_measured_weight", self.min_measured_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }

        validate_frames(&self.frames)
    }
}

fn validate_frames(frames: &FrameConfig) -> Result<(), ConfigError> {
    let fail = |reason: String| Err(ConfigError::InvalidFrames(reason));

    if frames.frame_length < 16 {
        return fail(format!("frame_length {} is below 16 samples", frames.frame_length));
    }
    if frames.hop_length == 0 || frames.hop_length > frames.frame_length {
        return fail(format!(
            "hop_length {} must be in 1..={}",
            frames.hop_length, frames.frame_length
        ));
    }
    if frames.n_mels == 0 || frames.n_mfcc < 2 || frames.n_mfcc > frames.n_mels {
        return fail(format!(
            "need 2 <= n_mfcc ({}) <= n_mels ({})",
            frames.n_mfcc, frames.n_mels
        ));
    }
    if !(frames.pitch_min_hz > 0.0 && frames.pitch_min_hz < frames.pitch_max_hz) {
        return fail(format!(
            "pitch range {}..{} Hz is empty",
            frames.pitch_min_hz, frames.pitch_max_hz
        ));
    }
    if !(frames.yin_threshold > 0.0 && frames.yin_threshold < 1.0) {
        return fail(format!("yin_threshold {} must lie in (0, 1)", frames.yin_threshold));
    }
    if !(frames.rolloff_percent > 0.0 && frames.rolloff_percent <= 1.0) {
        return fail(format!("rolloff_percent {} must lie in (0, 1]", frames.rolloff_percent));
    }
    if !frames.top_db.is_finite() || !frames.silence_db.is_finite() {
        return fail("top_db and silence_db must be finite".to_string());
    }
    if frames.hpss_kernel == 0 {
        return fail("hpss_kernel must be at least 1".to_string());
    }
    if frames.min_frames < 2 {
        return fail(format!("min_frames {} must be at least 2", frames.min_frames));
    }
    Ok(())
}
