// Statistical analysis
// Zero-crossing behaviour and the shape of the raw amplitude distribution

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::AnalysisInput;
use crate::audio::dsp;

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let samples = input.waveform.samples();
    let mut features = FeatureSet::new();

    let Some(moments) = Moments::of(samples) else {
        features.set_analyzer_indeterminate(Analyzer::Statistical);
        return features;
    };
    features.set(Signal::Skewness, moments.skewness());
    features.set(Signal::Kurtosis, moments.excess_kurtosis());

    let config = input.config;
    let rates: Vec<f64> = dsp::frame_slices(samples, config.frame_length, config.hop_length)
        .into_iter()
        .map(zero_crossing_rate)
        .collect();
    features.set_opt(Signal::ZeroCrossingRate, dsp::mean(&rates));
    if rates.len() >= config.min_frames {
        features.set_opt(Signal::ZeroCrossingVariation, dsp::std_dev(&rates));
    } else {
        features.set_indeterminate(Signal::ZeroCrossingVariation);
    }

    features
}

/// Sign changes per sample pair
pub fn zero_crossing_rate(samples: &[f32]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings = samples
        .windows(2)
        .filter(|w| (w[1] >= 0.0) != (w[0] >= 0.0))
        .count();

    crossings as f64 / (samples.len() - 1) as f64
}

/// Central moments of the amplitude distribution
#[derive(Debug, Clone, Copy)]
struct Moments {
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    /// `None` for a flat signal, where the shape is undefined
    fn of(samples: &[f32]) -> Option<Self> {
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &s in samples {
            let d = s as f64 - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);

        // Relative to the signal's own scale, so gain does not matter
        let peak = samples.iter().fold(0.0_f64, |acc, &s| acc.max((s as f64).abs()));
        if m2 <= (peak * 1e-7).powi(2) {
            return None;
        }

        Some(Moments { m2, m3, m4 })
    }

    fn skewness(&self) -> f64 {
        self.m3 / self.m2.powf(1.5)
    }

    fn excess_kurtosis(&self) -> f64 {
        self.m4 / (self.m2 * self.m2) - 3.0
    }
}
