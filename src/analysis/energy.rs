// Energy analysis
// Frame RMS level and how much it fluctuates

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::AnalysisInput;
use crate::audio::dsp;

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let config = input.config;
    let levels: Vec<f64> = dsp::frame_slices(input.waveform.samples(), config.frame_length, config.hop_length)
        .into_iter()
        .map(dsp::rms)
        .collect();
    describe_levels(&levels, config.min_frames)
}

/// Summarize a sequence of frame RMS levels
pub fn describe_levels(levels: &[f64], min_frames: usize) -> FeatureSet {
    let mut features = FeatureSet::new();

    let cv = if levels.len() >= min_frames {
        dsp::coefficient_of_variation(levels)
    } else {
        None
    };
    let Some(cv) = cv else {
        features.set_analyzer_indeterminate(Analyzer::Energy);
        return features;
    };

    let mean = dsp::mean(levels).unwrap_or_default();
    features.set(Signal::RmsMean, mean);
    features.set(Signal::RmsVariation, cv);
    features.set(Signal::EnergyConsistency, 1.0 / (1.0 + cv));

    let steps: Vec<f64> = levels.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    features.set_opt(Signal::Shimmer, dsp::mean(&steps).map(|s| s / mean));

    features
}
