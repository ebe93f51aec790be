// Detection engine
// Validates input, extracts features, aggregates, classifies and explains

use thiserror::Error;

use crate::analysis::extract_features;
use crate::audio::{InputError, Waveform};
use crate::scoring::config::{ConfigError, EngineConfig};
use crate::scoring::explainability::{build_explanation, insufficient_evidence};
use crate::scoring::heuristic::HeuristicAggregator;
use crate::scoring::types::{Analysis, Classification, Verdict};

/// Errors that can occur during classification
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] InputError),
}

/// Immutable classification engine, safe to share across threads
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    config: EngineConfig,
    aggregator: HeuristicAggregator,
}

impl DetectionEngine {
    /// Create an engine after validating its policy
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: EngineConfig) -> Self {
        DetectionEngine {
            aggregator: HeuristicAggregator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify a mono waveform
    pub fn classify(&self, samples: &[f32], sample_rate: u32) -> Result<Verdict, EngineError> {
        Ok(self.analyze(samples, sample_rate)?.verdict)
    }

    /// Classify and return the features and score breakdown as well
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<Analysis, EngineError> {
        let waveform = Waveform::from_slice(samples, sample_rate)?;
        Ok(self.analyze_waveform(&waveform))
    }

    /// Analyze an already validated waveform; never fails
    pub fn analyze_waveform(&self, waveform: &Waveform) -> Analysis {
        log::debug!(
            "Analyzing {:.2}s at {} Hz",
            waveform.duration_secs(),
            waveform.sample_rate()
        );

        let features = extract_features(
            waveform,
            &self.config.frames,
            self.config.parallel_extraction,
        );
        log::debug!("Features: {:?}", features);

        let aggregate = self.aggregator.aggregate(&features);
        log::debug!("Score components: {:?}", aggregate.components);

        let classification = Classification::from_score(aggregate.score, self.config.decision_threshold);
        let explanation = if aggregate.insufficient_evidence {
            insufficient_evidence(&aggregate.components)
        } else {
            build_explanation(&aggregate.components, classification)
        };

        Analysis {
            features,
            components: aggregate.components,
            verdict: Verdict {
                classification,
                confidence_score: aggregate.score,
                explanation,
            },
        }
    }
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::from_valid(EngineConfig::default())
    }
}

/// Classify with the default policy
pub fn classify(samples: &[f32], sample_rate: u32) -> Result<Verdict, EngineError> {
    DetectionEngine::default().classify(samples, sample_rate)
}
