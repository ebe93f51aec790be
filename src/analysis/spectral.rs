// Spectral shape analysis
// Per-frame centroid, rolloff, bandwidth and flatness, summarized over audible frames

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::AnalysisInput;
use crate::audio::dsp::{self, Spectrogram};

/// Frames more than this far below the loudest frame carry no usable shape
const AUDIBLE_RANGE_DB: f64 = 80.0;

/// Flatness power floor, relative to the frame's peak bin power (-100 dB)
const FLATNESS_FLOOR: f64 = 1e-10;

/// Shape descriptors of one magnitude frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameShape {
    pub centroid: f64,
    pub rolloff: f64,
    pub bandwidth: f64,
    pub flatness: f64,
}

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let spec = &input.spectrogram;
    let shapes: Vec<FrameShape> = spec
        .audible_frames(AUDIBLE_RANGE_DB)
        .into_iter()
        .filter_map(|i| frame_shape(spec, &spec.frames[i], input.config.rolloff_percent))
        .collect();

    let mut features = FeatureSet::new();
    if shapes.len() < input.config.min_frames {
        features.set_analyzer_indeterminate(Analyzer::Spectral);
        return features;
    }

    let centroids: Vec<f64> = shapes.iter().map(|s| s.centroid).collect();
    let rolloffs: Vec<f64> = shapes.iter().map(|s| s.rolloff).collect();
    let bandwidths: Vec<f64> = shapes.iter().map(|s| s.bandwidth).collect();
    let flatness: Vec<f64> = shapes.iter().map(|s| s.flatness).collect();

    features.set_opt(Signal::SpectralCentroidMean, dsp::mean(&centroids));
    features.set_opt(Signal::SpectralCentroidVariance, dsp::variance(&centroids));
    features.set_opt(
        Signal::SpectralCentroidVariation,
        dsp::coefficient_of_variation(&centroids),
    );
    features.set_opt(Signal::SpectralRolloffMean, dsp::mean(&rolloffs));
    features.set_opt(Signal::SpectralRolloffVariance, dsp::variance(&rolloffs));
    features.set_opt(Signal::SpectralBandwidthMean, dsp::mean(&bandwidths));
    features.set_opt(Signal::SpectralBandwidthVariance, dsp::variance(&bandwidths));
    features.set_opt(Signal::SpectralFlatnessMean, dsp::mean(&flatness));

    features
}

/// Shape of a single frame, `None` for an all-zero frame
pub fn frame_shape(spec: &Spectrogram, magnitudes: &[f32], rolloff_percent: f64) -> Option<FrameShape> {
    let total: f64 = magnitudes.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return None;
    }

    let centroid = magnitudes
        .iter()
        .enumerate()
        .map(|(k, &m)| spec.bin_frequency(k) * m as f64)
        .sum::<f64>()
        / total;

    let bandwidth = (magnitudes
        .iter()
        .enumerate()
        .map(|(k, &m)| m as f64 * (spec.bin_frequency(k) - centroid).powi(2))
        .sum::<f64>()
        / total)
        .sqrt();

    let target = rolloff_percent * total;
    let mut cumulative = 0.0;
    let mut rolloff_bin = magnitudes.len().saturating_sub(1);
    for (k, &m) in magnitudes.iter().enumerate() {
        cumulative += m as f64;
        if cumulative >= target {
            rolloff_bin = k;
            break;
        }
    }

    let peak = magnitudes.iter().fold(0.0_f64, |acc, &m| acc.max(m as f64));
    let floor = peak * peak * FLATNESS_FLOOR;
    let powers: Vec<f64> = magnitudes
        .iter()
        .map(|&m| ((m as f64) * (m as f64)).max(floor))
        .collect();
    let log_mean = powers.iter().map(|p| p.ln()).sum::<f64>() / powers.len() as f64;
    let arithmetic = powers.iter().sum::<f64>() / powers.len() as f64;
    let flatness = log_mean.exp() / arithmetic;

    Some(FrameShape {
        centroid,
        rolloff: spec.bin_frequency(rolloff_bin),
        bandwidth,
        flatness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_signals::{noise, sine, tone_noise_alternating};
    use crate::analysis::FrameConfig;
    use crate::audio::Waveform;

    fn features_for(samples: Vec<f32>) -> FeatureSet {
        let waveform = Waveform::new(samples, 16000).unwrap();
        let config = FrameConfig::default();
        extract(&AnalysisInput::prepare(&waveform, &config))
    }

    #[test]
    fn test_tone_centroid_is_stable() {
        let features = features_for(sine(1000.0, 0.5, 16000, 1.0));

        let centroid = features.get(Signal::SpectralCentroidMean).unwrap();
        assert!((centroid - 1000.0).abs() < 100.0, "centroid {}", centroid);
        assert!(features.get(Signal::SpectralCentroidVariation).unwrap() < 0.02);
        assert!(features.get(Signal::SpectralFlatnessMean).unwrap() < 0.1);
    }

    #[test]
    fn test_noise_is_flat_and_bright() {
        let features = features_for(noise(0.5, 16000, 5));

        assert!(features.get(Signal::SpectralCentroidMean).unwrap() > 3000.0);
        assert!(features.get(Signal::SpectralFlatnessMean).unwrap() > 0.3);
        assert!(features.get(Signal::SpectralRolloffMean).unwrap() > 5000.0);
    }

    #[test]
    fn test_alternating_content_varies() {
        let features = features_for(tone_noise_alternating(16000, 3.0, 0.5));
        assert!(features.get(Signal::SpectralCentroidVariation).unwrap() > 0.35);
    }

    #[test]
    fn test_flatness_ignores_level() {
        let samples = sine(440.0, 0.5, 16000, 0.5);
        let spec = Spectrogram::compute(&samples, 16000, 2048, 512);
        let loud = &spec.frames[0];
        let quiet: Vec<f32> = loud.iter().map(|&m| m * 1e-4).collect();

        let loud = frame_shape(&spec, loud, 0.85).unwrap().flatness;
        let quiet = frame_shape(&spec, &quiet, 0.85).unwrap().flatness;
        assert!(loud > 0.0);
        assert!((loud - quiet).abs() <= loud * 1e-3, "{} vs {}", loud, quiet);
    }

    #[test]
    fn test_silence_is_indeterminate() {
        let features = features_for(vec![0.0; 16000]);
        assert!(features.analyzer_indeterminate(Analyzer::Spectral));
        assert_eq!(features.len(), Analyzer::Spectral.signals().len());
    }
}
