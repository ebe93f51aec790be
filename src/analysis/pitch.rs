// Pitch analysis
// YIN fundamental-frequency tracking and stability descriptors of the voiced track

use crate::analysis::types::{Analyzer, FeatureSet, Signal};
use crate::analysis::{AnalysisInput, FrameConfig};
use crate::audio::dsp::{self, Correlator};

pub fn extract(input: &AnalysisInput) -> FeatureSet {
    let track = estimate_pitch_track(
        input.waveform.samples(),
        input.waveform.sample_rate(),
        input.config,
    );
    describe_track(&track, input.config.min_frames)
}

/// Voiced fundamental-frequency estimates (Hz) in frame order.
/// Unvoiced and quiet frames are omitted.
pub fn estimate_pitch_track(samples: &[f32], sample_rate: u32, config: &FrameConfig) -> Vec<f64> {
    let frames = dsp::frame_slices(samples, config.frame_length, config.hop_length);
    let levels: Vec<f64> = frames.iter().map(|f| dsp::rms(f)).collect();

    let loudest = levels.iter().cloned().fold(0.0_f64, f64::max);
    if loudest <= 0.0 {
        return Vec::new();
    }
    let gate = loudest * 10f64.powf(-config.silence_db.abs() / 20.0);

    let sr = sample_rate as f64;
    let tracker = YinTracker {
        correlator: Correlator::new(config.frame_length),
        min_lag: ((sr / config.pitch_max_hz).floor() as usize).max(2),
        max_lag: (sr / config.pitch_min_hz).ceil() as usize,
        threshold: config.yin_threshold,
        sample_rate: sr,
    };

    frames
        .iter()
        .zip(levels)
        .filter(|(_, level)| *level > gate)
        .filter_map(|(frame, _)| tracker.estimate(frame))
        .collect()
}

struct YinTracker {
    correlator: Correlator,
    min_lag: usize,
    max_lag: usize,
    threshold: f64,
    sample_rate: f64,
}

impl YinTracker {
    /// f0 of one frame, `None` when no lag dips below the threshold
    fn estimate(&self, frame: &[f32]) -> Option<f64> {
        let n = frame.len();
        let max_lag = self.max_lag.min(n / 2);
        if max_lag <= self.min_lag + 1 {
            return None;
        }

        // Fixed integration window so every lag sums the same number of terms
        let window = n - max_lag;
        let correlation = self.correlator.cross_correlate(&frame[..window], frame);
        if correlation.len() <= max_lag {
            return None;
        }

        let mut energy = vec![0.0_f64; n + 1];
        for (j, &s) in frame.iter().enumerate() {
            energy[j + 1] = energy[j] + (s as f64) * (s as f64);
        }

        // Cumulative mean normalized difference
        let mut cmnd = vec![1.0_f64; max_lag + 1];
        let mut running = 0.0;
        for tau in 1..=max_lag {
            let head = energy[window];
            let shifted = energy[tau + window] - energy[tau];
            let diff = (head + shifted - 2.0 * correlation[tau]).max(0.0);

            running += diff;
            cmnd[tau] = if running > 0.0 {
                diff * tau as f64 / running
            } else {
                1.0
            };
        }

        let mut tau = self.min_lag;
        while tau <= max_lag {
            if cmnd[tau] < self.threshold {
                while tau < max_lag && cmnd[tau + 1] < cmnd[tau] {
                    tau += 1;
                }
                let f0 = self.sample_rate / refine_lag(&cmnd, tau);
                return (f0.is_finite() && f0 > 0.0).then_some(f0);
            }
            tau += 1;
        }

        None
    }
}

/// Parabolic interpolation around a local minimum
fn refine_lag(curve: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= curve.len() {
        return tau as f64;
    }
    let (a, b, c) = (curve[tau - 1], curve[tau], curve[tau + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return tau as f64;
    }
    tau as f64 + (0.5 * (a - c) / denom).clamp(-1.0, 1.0)
}

/// Summarize a voiced pitch track
pub fn describe_track(track: &[f64], min_frames: usize) -> FeatureSet {
    let mut features = FeatureSet::new();
    if track.len() < min_frames.max(2) {
        features.set_analyzer_indeterminate(Analyzer::Pitch);
        return features;
    }

    let mean = dsp::mean(track);
    features.set_opt(Signal::PitchMean, mean);
    features.set_opt(Signal::PitchVariability, dsp::coefficient_of_variation(track));

    let max = track.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = track.iter().cloned().fold(f64::INFINITY, f64::min);
    features.set(Signal::PitchRange, max - min);

    let steps: Vec<f64> = track.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let jitter = match (dsp::mean(&steps), mean) {
        (Some(step), Some(m)) if m > 0.0 => Some(step / m),
        _ => None,
    };
    features.set_opt(Signal::PitchJitter, jitter);

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_signals::{noise, sine, vibrato};

    #[test]
    fn test_steady_tone_pitch() {
        let config = FrameConfig::default();
        let samples = sine(220.0, 0.5, 16000, 1.0);
        let track = estimate_pitch_track(&samples, 16000, &config);

        assert!(track.len() >= 20);
        let features = describe_track(&track, config.min_frames);
        let mean = features.get(Signal::PitchMean).unwrap();
        assert!((mean - 220.0).abs() < 2.0, "mean pitch {}", mean);
        assert!(features.get(Signal::PitchVariability).unwrap() < 0.01);
    }

    #[test]
    fn test_vibrato_is_variable() {
        let config = FrameConfig::default();
        let samples = vibrato(220.0, 50.0, 1.0, 0.5, 44100, 2.0);
        let features = describe_track(&estimate_pitch_track(&samples, 44100, &config), config.min_frames);

        assert!(features.get(Signal::PitchVariability).unwrap() > 0.1);
        assert!(features.get(Signal::PitchRange).unwrap() > 60.0);
    }

    #[test]
    fn test_silence_has_no_track() {
        let config = FrameConfig::default();
        assert!(estimate_pitch_track(&vec![0.0; 16000], 16000, &config).is_empty());

        let features = describe_track(&[], config.min_frames);
        assert!(features.analyzer_indeterminate(Analyzer::Pitch));
        assert!(features.contains(Signal::PitchJitter));
    }

    #[test]
    fn test_noise_is_mostly_unvoiced() {
        let config = FrameConfig::default();
        let samples = noise(0.5, 16000, 3);
        let frames = dsp::frame_count(samples.len(), config.frame_length, config.hop_length);
        let track = estimate_pitch_track(&samples, 16000, &config);
        assert!(track.len() < frames / 2);
    }

    #[test]
    fn test_refine_lag_vertex() {
        // Parabola with its minimum at 4.25
        let curve: Vec<f64> = (0..8).map(|i| (i as f64 - 4.25).powi(2)).collect();
        assert!((refine_lag(&curve, 4) - 4.25).abs() < 1e-9);
    }
}
