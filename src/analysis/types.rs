// Feature analysis types
// Analyzer identities, named scalar signals and the per-request feature set

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six independent feature analyzers.
/// Declaration order is the fixed priority order used in explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Fundamental frequency track stability
    Pitch,

    /// Uniformity of spectral shape across frames
    Spectral,

    /// Timbral uniformity via mel-frequency cepstral coefficients
    Cepstral,

    /// Loudness fluctuation between frames
    Energy,

    /// Balance of tonal and noise-like content
    Harmonic,

    /// Shape of the raw amplitude distribution
    Statistical,
}

impl Analyzer {
    /// All analyzers in explanation priority order
    pub const ALL: [Analyzer; 6] = [
        Analyzer::Pitch,
        Analyzer::Spectral,
        Analyzer::Cepstral,
        Analyzer::Energy,
        Analyzer::Harmonic,
        Analyzer::Statistical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Analyzer::Pitch => "pitch",
            Analyzer::Spectral => "spectral",
            Analyzer::Cepstral => "cepstral",
            Analyzer::Energy => "energy",
            Analyzer::Harmonic => "harmonic",
            Analyzer::Statistical => "statistical",
        }
    }

    /// Signals this analyzer is responsible for producing
    pub fn signals(&self) -> &'static [Signal] {
        match self {
            Analyzer::Pitch => &[
                Signal::PitchMean,
                Signal::PitchVariability,
                Signal::PitchRange,
                Signal::PitchJitter,
            ],
            Analyzer::Spectral => &[
                Signal::SpectralCentroidMean,
                Signal::SpectralCentroidVariance,
                Signal::SpectralCentroidVariation,
                Signal::SpectralRolloffMean,
                Signal::SpectralRolloffVariance,
                Signal::SpectralBandwidthMean,
                Signal::SpectralBandwidthVariance,
                Signal::SpectralFlatnessMean,
            ],
            Analyzer::Cepstral => &[Signal::MfccVariance, Signal::MfccDeltaStd],
            Analyzer::Energy => &[
                Signal::RmsMean,
                Signal::RmsVariation,
                Signal::EnergyConsistency,
                Signal::Shimmer,
            ],
            Analyzer::Harmonic => &[Signal::HarmonicRatio],
            Analyzer::Statistical => &[
                Signal::ZeroCrossingRate,
                Signal::ZeroCrossingVariation,
                Signal::Skewness,
                Signal::Kurtosis,
            ],
        }
    }
}

impl std::fmt::Display for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named scalar descriptors produced by the analyzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Mean voiced fundamental frequency (Hz)
    PitchMean,
    /// Coefficient of variation of the voiced pitch track
    PitchVariability,
    /// Max minus min voiced pitch (Hz)
    PitchRange,
    /// Mean absolute frame-to-frame pitch change over mean pitch
    PitchJitter,

    /// Mean spectral centroid (Hz)
    SpectralCentroidMean,
    /// Variance of the spectral centroid (Hz²)
    SpectralCentroidVariance,
    /// Coefficient of variation of the spectral centroid
    SpectralCentroidVariation,
    SpectralRolloffMean,
    SpectralRolloffVariance,
    SpectralBandwidthMean,
    SpectralBandwidthVariance,
    /// Mean Wiener entropy (geometric over arithmetic mean power)
    SpectralFlatnessMean,

    /// Mean per-coefficient variance of MFCC 1..n
    MfccVariance,
    /// Standard deviation of frame-to-frame MFCC deltas
    MfccDeltaStd,

    /// Mean frame RMS
    RmsMean,
    /// Coefficient of variation of frame RMS
    RmsVariation,
    /// 1 / (1 + RMS coefficient of variation), in (0, 1]
    EnergyConsistency,
    /// Mean absolute frame-to-frame RMS change over mean RMS
    Shimmer,

    /// Harmonic energy over harmonic + percussive energy, in [0, 1]
    HarmonicRatio,

    /// Mean per-frame zero-crossing rate (crossings per sample)
    ZeroCrossingRate,
    /// Standard deviation of the per-frame zero-crossing rate
    ZeroCrossingVariation,
    /// Skewness of the amplitude distribution
    Skewness,
    /// Excess kurtosis of the amplitude distribution
    Kurtosis,
}

impl Signal {
    /// The analyzer that produces this signal
    pub fn analyzer(&self) -> Analyzer {
        match self {
            Signal::PitchMean | Signal::PitchVariability | Signal::PitchRange | Signal::PitchJitter => {
                Analyzer::Pitch
            }
            Signal::SpectralCentroidMean
            | Signal::SpectralCentroidVariance
            | Signal::SpectralCentroidVariation
            | Signal::SpectralRolloffMean
            | Signal::SpectralRolloffVariance
            | Signal::SpectralBandwidthMean
            | Signal::SpectralBandwidthVariance
            | Signal::SpectralFlatnessMean => Analyzer::Spectral,
            Signal::MfccVariance | Signal::MfccDeltaStd => Analyzer::Cepstral,
            Signal::RmsMean | Signal::RmsVariation | Signal::EnergyConsistency | Signal::Shimmer => {
                Analyzer::Energy
            }
            Signal::HarmonicRatio => Analyzer::Harmonic,
            Signal::ZeroCrossingRate
            | Signal::ZeroCrossingVariation
            | Signal::Skewness
            | Signal::Kurtosis => Analyzer::Statistical,
        }
    }
}

/// Named measurements for one request.
///
/// A stored `None` is the indeterminate sentinel: the analyzer ran but the input
/// gave it nothing meaningful to measure. Every stored `Some` value is finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet {
    values: BTreeMap<Signal, Option<f64>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measurement; non-finite values are stored as indeterminate
    pub fn set(&mut self, signal: Signal, value: f64) {
        let value = if value.is_finite() { Some(value) } else { None };
        self.values.insert(signal, value);
    }

    /// Record an optional measurement (`None` = indeterminate)
    pub fn set_opt(&mut self, signal: Signal, value: Option<f64>) {
        match value {
            Some(v) => self.set(signal, v),
            None => self.set_indeterminate(signal),
        }
    }

    pub fn set_indeterminate(&mut self, signal: Signal) {
        self.values.insert(signal, None);
    }

    /// Mark every signal of an analyzer as indeterminate
    pub fn set_analyzer_indeterminate(&mut self, analyzer: Analyzer) {
        for &signal in analyzer.signals() {
            self.set_indeterminate(signal);
        }
    }

    /// Finite value of a signal, `None` when indeterminate or never recorded
    pub fn get(&self, signal: Signal) -> Option<f64> {
        self.values.get(&signal).copied().flatten()
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.values.contains_key(&signal)
    }

    pub fn is_indeterminate(&self, signal: Signal) -> bool {
        self.get(signal).is_none()
    }

    /// True when none of the analyzer's signals carry a value
    pub fn analyzer_indeterminate(&self, analyzer: Analyzer) -> bool {
        analyzer.signals().iter().all(|&s| self.is_indeterminate(s))
    }

    /// Combine the disjoint outputs of two analyzers
    pub fn merge(mut self, other: FeatureSet) -> FeatureSet {
        self.values.extend(other.values);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, Option<f64>)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_becomes_indeterminate() {
        let mut features = FeatureSet::new();
        features.set(Signal::PitchVariability, f64::NAN);
        features.set(Signal::Kurtosis, f64::INFINITY);
        features.set(Signal::Skewness, 0.3);

        assert!(features.contains(Signal::PitchVariability));
        assert!(features.is_indeterminate(Signal::PitchVariability));
        assert!(features.is_indeterminate(Signal::Kurtosis));
        assert_eq!(features.get(Signal::Skewness), Some(0.3));
    }

    #[test]
    fn test_every_signal_has_one_owner() {
        for analyzer in Analyzer::ALL {
            for signal in analyzer.signals() {
                assert_eq!(signal.analyzer(), analyzer);
            }
        }
    }

    #[test]
    fn test_analyzer_indeterminate() {
        let mut features = FeatureSet::new();
        features.set_analyzer_indeterminate(Analyzer::Energy);
        assert!(features.analyzer_indeterminate(Analyzer::Energy));

        features.set(Signal::RmsMean, 0.1);
        assert!(!features.analyzer_indeterminate(Analyzer::Energy));
    }

    #[test]
    fn test_merge() {
        let mut a = FeatureSet::new();
        a.set(Signal::PitchMean, 200.0);
        let mut b = FeatureSet::new();
        b.set(Signal::HarmonicRatio, 0.6);

        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(Signal::HarmonicRatio), Some(0.6));
    }

    #[test]
    fn test_serializes_snake_case_keys() {
        let mut features = FeatureSet::new();
        features.set(Signal::SpectralCentroidMean, 1500.0);
        features.set_indeterminate(Signal::PitchVariability);

        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["spectral_centroid_mean"], 1500.0);
        assert!(json["pitch_variability"].is_null());
    }
}
