// Cepstral analysis
// Mel-frequency cepstral coefficients and their variability over time

use std::f64::consts::PI;

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::AnalysisInput;
use crate::audio::dsp::{self, Spectrogram};

/// Converts frequency in Hz to the HTK mel scale
fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// One triangular mel filter, stored from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

impl MelFilter {
    fn apply(&self, power: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(power.iter().skip(self.start))
            .map(|(w, p)| w * p)
            .sum()
    }
}

/// Triangular mel filterbank over `0..sample_rate/2`
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
}

impl MelFilterBank {
    pub fn new(num_mels: usize, fft_size: usize, sample_rate: u32) -> Self {
        let half_fft = fft_size / 2 + 1;
        let high_mel = hz_to_mel(sample_rate as f64 / 2.0);
        let step = high_mel / (num_mels + 1) as f64;

        let mut bins: Vec<usize> = (0..num_mels + 2)
            .map(|i| {
                let hz = mel_to_hz(i as f64 * step);
                let bin = (hz * fft_size as f64 / sample_rate as f64).round() as usize;
                bin.min(half_fft - 1)
            })
            .collect();

        // Every filter spans at least one bin
        for i in 1..bins.len() {
            if bins[i] <= bins[i - 1] {
                bins[i] = bins[i - 1] + 1;
            }
        }

        let filters = bins
            .windows(3)
            .map(|w| {
                let (left, center, right) = (w[0], w[1], w[2]);
                let last = right.min(half_fft - 1);
                let weights = (left..=last)
                    .map(|k| {
                        if k < center {
                            (k - left) as f64 / (center - left) as f64
                        } else {
                            (right - k) as f64 / (right - center) as f64
                        }
                    })
                    .collect();
                MelFilter { start: left, weights }
            })
            .collect();

        MelFilterBank { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Mel band energies of one power-spectrum frame
    pub fn apply(&self, power: &[f64]) -> Vec<f64> {
        self.filters.iter().map(|f| f.apply(power)).collect()
    }
}

/// Orthonormal DCT-II basis, `n_out` rows over `n_in` inputs
fn dct_basis(n_out: usize, n_in: usize) -> Vec<Vec<f64>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                .collect()
        })
        .collect()
}

/// MFCC matrix `[frame][coefficient]` of a magnitude spectrogram.
///
/// Log mel energies are referenced to the loudest cell and floored `top_db`
/// below it, so the result does not depend on input gain. Empty when the
/// spectrogram is silent.
pub fn mfcc(spec: &Spectrogram, n_mels: usize, n_mfcc: usize, top_db: f64) -> Vec<Vec<f64>> {
    if spec.is_empty() || n_mels == 0 {
        return Vec::new();
    }

    let bank = MelFilterBank::new(n_mels, spec.frame_length, spec.sample_rate);
    let mel: Vec<Vec<f64>> = spec
        .frames
        .iter()
        .map(|frame| {
            let power: Vec<f64> = frame.iter().map(|&m| (m as f64) * (m as f64)).collect();
            bank.apply(&power)
        })
        .collect();

    let reference = mel.iter().flatten().cloned().fold(0.0_f64, f64::max);
    if reference <= 0.0 {
        return Vec::new();
    }
    let floor = 10f64.powf(-top_db.abs() / 10.0);

    let basis = dct_basis(n_mfcc.min(n_mels), n_mels);
    mel.iter()
        .map(|bands| {
            let log_mel: Vec<f64> = bands
                .iter()
                .map(|&e| 10.0 * (e / reference).max(floor).log10())
                .collect();
            basis
                .iter()
                .map(|row| row.iter().zip(log_mel.iter()).map(|(b, x)| b * x).sum())
                .collect()
        })
        .collect()
}

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let config = input.config;
    let coefficients = mfcc(&input.spectrogram, config.n_mels, config.n_mfcc, config.top_db);

    let mut features = FeatureSet::new();
    if coefficients.len() < config.min_frames || coefficients[0].len() < 2 {
        features.set_analyzer_indeterminate(Analyzer::Cepstral);
        return features;
    }

    // c0 tracks overall loudness and is left to the energy analyzer
    let n = coefficients[0].len();
    let variances: Vec<f64> = (1..n)
        .filter_map(|k| {
            let track: Vec<f64> = coefficients.iter().map(|frame| frame[k]).collect();
            dsp::variance(&track)
        })
        .collect();
    features.set_opt(Signal::MfccVariance, dsp::mean(&variances));

    let deltas: Vec<f64> = coefficients
        .windows(2)
        .flat_map(|pair| (1..n).map(move |k| pair[1][k] - pair[0][k]))
        .collect();
    features.set_opt(Signal::MfccDeltaStd, dsp::std_dev(&deltas));

    features
}
