// Harmonic analysis
// Median-filter harmonic/percussive separation and the harmonic energy share

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::AnalysisInput;
use crate::audio::dsp;

/// Harmonic and percussive energy of a magnitude spectrogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicSplit {
    pub harmonic_energy: f64,
    pub percussive_energy: f64,
}

impl HarmonicSplit {
    /// Harmonic share of the separated energy, `None` when both parts are empty
    pub fn ratio(&self) -> Option<f64> {
        let total = self.harmonic_energy + self.percussive_energy;
        (total > 0.0).then(|| self.harmonic_energy / total)
    }
}

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let split = separate(&input.spectrogram.frames, input.config.hpss_kernel);

    let mut features = FeatureSet::new();
    match split.ratio() {
        Some(ratio) => features.set(Signal::HarmonicRatio, ratio),
        None => features.set_analyzer_indeterminate(Analyzer::Harmonic),
    }
    features
}

/// Split spectrogram energy with soft (Wiener, power 2) masks.
///
/// The harmonic estimate is a median along time for each bin, the percussive
/// estimate a median along frequency for each frame. Windows are truncated at
/// the edges.
pub fn separate(frames: &[Vec<f32>], kernel: usize) -> HarmonicSplit {
    let empty = HarmonicSplit {
        harmonic_energy: 0.0,
        percussive_energy: 0.0,
    };
    let Some(bins) = frames.first().map(Vec::len) else {
        return empty;
    };
    let half = kernel.max(1) / 2;
    let count = frames.len();

    let mut scratch: Vec<f32> = Vec::with_capacity(2 * half + 1);

    // Time-direction medians, stored [frame][bin]
    let mut harmonic = vec![vec![0.0_f32; bins]; count];
    for bin in 0..bins {
        for t in 0..count {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(count);
            scratch.clear();
            scratch.extend(frames[lo..hi].iter().map(|f| f[bin]));
            harmonic[t][bin] = dsp::median_in_place(&mut scratch);
        }
    }

    let mut split = empty;
    let mut percussive = vec![0.0_f32; bins];
    for (t, frame) in frames.iter().enumerate() {
        for (k, value) in percussive.iter_mut().enumerate() {
            let lo = k.saturating_sub(half);
            let hi = (k + half + 1).min(bins);
            scratch.clear();
            scratch.extend_from_slice(&frame[lo..hi]);
            *value = dsp::median_in_place(&mut scratch);
        }

        for k in 0..bins {
            let s = frame[k] as f64;
            if s <= 0.0 {
                continue;
            }
            let h = (harmonic[t][k] as f64).powi(2);
            let p = (percussive[k] as f64).powi(2);
            let mask_h = if h + p > 0.0 { h / (h + p) } else { 0.5 };

            split.harmonic_energy += (mask_h * s).powi(2);
            split.percussive_energy += ((1.0 - mask_h) * s).powi(2);
        }
    }

    split
}
