// Scoring module
// Aggregates analyzer outputs into a verdict with an explanation

pub mod config;
pub mod engine;
pub mod explainability;
pub mod heuristic;
pub mod types;

pub use config::{AnalyzerRule, Comparison, ConfigError, EngineConfig};
pub use engine::{classify, DetectionEngine, EngineError};
pub use heuristic::{AggregateScore, HeuristicAggregator};
pub use types::{Analysis, Classification, ComponentScore, ScoreComponents, Verdict};
