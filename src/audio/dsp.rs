// Shared DSP primitives
// Framing, Hann windowing, STFT, FFT correlation and summary statistics

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Number of analysis frames for a signal of `len` samples.
/// A signal shorter than one frame still yields a single (zero-padded) frame.
pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len == 0 || frame_length == 0 || hop_length == 0 {
        return 0;
    }
    if len <= frame_length {
        1
    } else {
        (len - frame_length) / hop_length + 1
    }
}

/// Split samples into frames of `frame_length` advancing by `hop_length`.
/// Only full frames are returned, except when the whole signal is shorter than
/// one frame, in which case the single returned slice is the whole signal.
pub fn frame_slices(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<&[f32]> {
    let count = frame_count(samples.len(), frame_length, hop_length);
    (0..count)
        .map(|i| {
            let start = i * hop_length;
            let end = (start + frame_length).min(samples.len());
            &samples[start..end]
        })
        .collect()
}

/// Periodic Hann window
pub fn hann_window(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Root-mean-square of a frame
pub fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// Magnitude spectrogram (short-time Fourier transform)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude frames, each holding `frame_length / 2 + 1` bins
    pub frames: Vec<Vec<f32>>,

    /// Sample rate of the analysed signal in Hz
    pub sample_rate: u32,

    /// FFT size in samples
    pub frame_length: usize,
}

impl Spectrogram {
    /// Compute the Hann-windowed STFT magnitude of `samples`.
    /// Short final segments are dropped; a signal shorter than one frame is zero-padded.
    pub fn compute(samples: &[f32], sample_rate: u32, frame_length: usize, hop_length: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_length.max(1));
        let window = hann_window(frame_length);

        let slices = frame_slices(samples, frame_length, hop_length);
        let mut frames = Vec::with_capacity(slices.len());
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        for (index, slice) in slices.iter().enumerate() {
            input.iter_mut().for_each(|v| *v = 0.0);
            for (dst, (&s, &w)) in input.iter_mut().zip(slice.iter().zip(window.iter())) {
                *dst = s * w;
            }

            if let Err(e) = fft.process(&mut input, &mut spectrum) {
                log::warn!("STFT frame {} skipped: {}", index, e);
                continue;
            }

            frames.push(spectrum.iter().map(|c| c.norm()).collect());
        }

        Spectrogram {
            frames,
            sample_rate,
            frame_length,
        }
    }

    /// Number of frequency bins per frame
    pub fn bin_count(&self) -> usize {
        self.frame_length / 2 + 1
    }

    /// Centre frequency of a bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        if self.frame_length == 0 {
            return 0.0;
        }
        bin as f64 * self.sample_rate as f64 / self.frame_length as f64
    }

    /// Total power (sum of squared magnitudes) of each frame
    pub fn frame_energies(&self) -> Vec<f64> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|&m| (m as f64) * (m as f64)).sum())
            .collect()
    }

    /// Indices of frames whose power lies within `floor_db` of the loudest frame.
    /// Returns an empty list when every frame is digitally silent.
    pub fn audible_frames(&self, floor_db: f64) -> Vec<usize> {
        let energies = self.frame_energies();
        let max_energy = energies.iter().cloned().fold(0.0_f64, f64::max);
        if max_energy <= 0.0 {
            return Vec::new();
        }
        let floor = max_energy * 10f64.powf(-floor_db.abs() / 10.0);
        energies
            .iter()
            .enumerate()
            .filter(|(_, e)| **e > floor)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Linear cross-correlation via zero-padded FFT
pub struct Correlator {
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    fft_size: usize,
}

impl Correlator {
    /// Plan transforms for signals of up to `frame_length` samples
    pub fn new(frame_length: usize) -> Self {
        let fft_size = (2 * frame_length.max(1)).next_power_of_two();
        let mut planner = RealFftPlanner::<f32>::new();
        Correlator {
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
            fft_size,
        }
    }

    fn spectrum(&self, samples: &[f32]) -> Option<Vec<Complex<f32>>> {
        let n = samples.len().min(self.fft_size / 2);
        let mut input = self.forward.make_input_vec();
        input[..n].copy_from_slice(&samples[..n]);

        let mut spectrum = self.forward.make_output_vec();
        self.forward.process(&mut input, &mut spectrum).ok()?;
        Some(spectrum)
    }

    /// c[τ] = Σ_j head[j]·signal[j+τ] for τ in 0..=signal.len() - head.len()
    pub fn cross_correlate(&self, head: &[f32], signal: &[f32]) -> Vec<f64> {
        let signal = &signal[..signal.len().min(self.fft_size / 2)];
        if head.is_empty() || head.len() > signal.len() {
            return Vec::new();
        }
        let lags = signal.len() - head.len() + 1;

        let (Some(h), Some(s)) = (self.spectrum(head), self.spectrum(signal)) else {
            return vec![0.0; lags];
        };

        let mut product: Vec<Complex<f32>> = h.iter().zip(s.iter()).map(|(a, b)| a.conj() * b).collect();
        // DC and Nyquist bins of a real-signal product are real
        if let Some(first) = product.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = product.last_mut() {
            last.im = 0.0;
        }

        let mut output = self.inverse.make_output_vec();
        if self.inverse.process(&mut product, &mut output).is_err() {
            return vec![0.0; lags];
        }

        let scale = 1.0 / self.fft_size as f64;
        output[..lags].iter().map(|&v| v as f64 * scale).collect()
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance, `None` for an empty slice
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Standard deviation over mean. `None` when the mean is not strictly positive.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m <= f64::MIN_POSITIVE {
        return None;
    }
    std_dev(values).map(|s| s / m)
}

/// Median of a scratch buffer (reorders the buffer)
pub fn median_in_place(buffer: &mut [f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let mid = buffer.len() / 2;
    let (_, median, _) = buffer.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(0, 2048, 512), 0);
        assert_eq!(frame_count(100, 2048, 512), 1);
        assert_eq!(frame_count(2048, 2048, 512), 1);
        assert_eq!(frame_count(2048 + 512, 2048, 512), 2);
        assert_eq!(frame_count(2048 + 1023, 2048, 512), 2);
    }

    #[test]
    fn test_frame_slices_short_signal() {
        let samples = vec![0.5; 10];
        let frames = frame_slices(&samples, 2048, 512);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 10);
    }

    #[test]
    fn test_hann_window() {
        let window = hann_window(100);

        // Window should taper at edges
        assert!(window[0] < 0.1);
        assert!(window[99] < 0.1);
        assert!(window[50] > 0.9); // Peak in middle
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spectrogram_peak_bin() {
        let sample_rate = 16000;
        let samples: Vec<f32> = (0..8192)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sample_rate as f32).sin())
            .collect();

        let spec = Spectrogram::compute(&samples, sample_rate, 1024, 256);
        assert!(!spec.is_empty());
        assert_eq!(spec.frames[0].len(), spec.bin_count());

        let frame = &spec.frames[0];
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert!((spec.bin_frequency(peak_bin) - 1000.0).abs() < 20.0);
    }

    #[test]
    fn test_audible_frames_silence() {
        let spec = Spectrogram::compute(&vec![0.0; 4096], 16000, 1024, 512);
        assert!(spec.audible_frames(80.0).is_empty());
    }

    #[test]
    fn test_cross_correlation_matches_direct() {
        let signal: Vec<f32> = (0..64).map(|i| ((i * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let head = &signal[..40];
        let correlation = Correlator::new(signal.len()).cross_correlate(head, &signal);
        assert_eq!(correlation.len(), 25);

        for lag in [0usize, 1, 5, 24] {
            let direct: f64 = (0..head.len())
                .map(|j| head[j] as f64 * signal[j + lag] as f64)
                .sum();
            assert!(
                (correlation[lag] - direct).abs() < 1e-3,
                "lag {}: {} vs {}",
                lag,
                correlation[lag],
                direct
            );
        }
    }

    #[test]
    fn test_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(variance(&values), Some(4.0));
        assert_eq!(std_dev(&values), Some(2.0));
        assert_eq!(coefficient_of_variation(&values), Some(0.4));

        assert!(mean(&[]).is_none());
        assert!(coefficient_of_variation(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_median_in_place() {
        let mut buffer = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(median_in_place(&mut buffer), 3.0);
        assert_eq!(median_in_place(&mut []), 0.0);
    }
}
