// Feature analysis module
// Six independent analyzers run over one shared, read-only analysis input

pub mod cepstral;
pub mod energy;
pub mod harmonic;
pub mod pitch;
pub mod spectral;
pub mod statistical;
pub mod types;

#[cfg(test)]
pub(crate) mod test_signals;

pub use types::{Analyzer, FeatureSet, Signal};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audio::{Spectrogram, Waveform};

/// Framing and analysis constants.
///
/// Every threshold in the default policy table was chosen against these values,
/// so changing them shifts what the thresholds mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Analysis frame and FFT size in samples
    pub frame_length: usize,

    /// Advance between frames in samples
    pub hop_length: usize,

    /// Triangular mel bands feeding the cepstrum
    pub n_mels: usize,

    /// Cepstral coefficients kept per frame
    pub n_mfcc: usize,

    /// Dynamic range (dB below the loudest mel cell) kept before the DCT
    pub top_db: f64,

    /// Lowest fundamental frequency searched (Hz)
    pub pitch_min_hz: f64,

    /// Highest fundamental frequency searched (Hz)
    pub pitch_max_hz: f64,

    /// YIN absolute threshold on the cumulative-mean-normalized difference
    pub yin_threshold: f64,

    /// Frames quieter than this many dB below the loudest frame are unvoiced
    pub silence_db: f64,

    /// Fraction of spectral magnitude below the rolloff frequency
    pub rolloff_percent: f64,

    /// Median filter length for harmonic/percussive separation (frames and bins)
    pub hpss_kernel: usize,

    /// Minimum frames before a variance-based descriptor is reported
    pub min_frames: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            frame_length: 2048,
            hop_length: 512,
            n_mels: 40,
            n_mfcc: 20,
            top_db: 80.0,
            pitch_min_hz: 60.0,
            pitch_max_hz: 500.0,
            yin_threshold: 0.15,
            silence_db: 40.0,
            rolloff_percent: 0.85,
            hpss_kernel: 31,
            min_frames: 3,
        }
    }
}

/// Immutable input shared by all analyzers of one request
pub struct AnalysisInput<'a> {
    pub waveform: &'a Waveform,
    pub config: &'a FrameConfig,

    /// STFT magnitude shared by the spectral, cepstral and harmonic analyzers
    pub spectrogram: Spectrogram,
}

impl<'a> AnalysisInput<'a> {
    pub fn prepare(waveform: &'a Waveform, config: &'a FrameConfig) -> Self {
        let spectrogram = Spectrogram::compute(
            waveform.samples(),
            waveform.sample_rate(),
            config.frame_length,
            config.hop_length,
        );

        AnalysisInput {
            waveform,
            config,
            spectrogram,
        }
    }
}

/// Run a single analyzer
pub fn run_analyzer(analyzer: Analyzer, input: &AnalysisInput) -> FeatureSet {
    match analyzer {
        Analyzer::Pitch => pitch::extract(input),
        Analyzer::Spectral => spectral::extract(input),
        Analyzer::Cepstral => cepstral::extract(input),
        Analyzer::Energy => energy::extract(input),
        Analyzer::Harmonic => harmonic::extract(input),
        Analyzer::Statistical => statistical::extract(input),
    }
}

/// Extract the complete feature set for a waveform.
/// With `parallel` set, the six analyzers run concurrently on the rayon pool.
pub fn extract_features(waveform: &Waveform, config: &FrameConfig, parallel: bool) -> FeatureSet {
    let input = AnalysisInput::prepare(waveform, config);

    let partials: Vec<FeatureSet> = if parallel {
        Analyzer::ALL
            .par_iter()
            .map(|&analyzer| run_analyzer(analyzer, &input))
            .collect()
    } else {
        Analyzer::ALL
            .iter()
            .map(|&analyzer| run_analyzer(analyzer, &input))
            .collect()
    };

    partials.into_iter().fold(FeatureSet::new(), FeatureSet::merge)
}
