// Validated analysis input
// A mono waveform plus its sample rate, checked once at the engine boundary

use thiserror::Error;

/// Reasons a waveform cannot be analysed at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Waveform contains no samples")]
    Empty,

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Waveform contains no finite samples")]
    NonFinite,
}

/// Immutable mono waveform owned by a single classification request
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Validate and wrap decoded samples.
    ///
    /// Rejects empty input, a zero sample rate, and input where no sample is finite.
    /// Isolated NaN/∞ samples in otherwise valid audio are replaced by silence so
    /// they cannot leak into feature values.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Result<Self, InputError> {
        if samples.is_empty() {
            return Err(InputError::Empty);
        }
        if sample_rate == 0 {
            return Err(InputError::InvalidSampleRate(sample_rate));
        }

        let non_finite = samples.iter().filter(|s| !s.is_finite()).count();
        if non_finite == samples.len() {
            return Err(InputError::NonFinite);
        }
        if non_finite > 0 {
            log::debug!("Replacing {} non-finite samples with silence", non_finite);
            for s in samples.iter_mut().filter(|s| !s.is_finite()) {
                *s = 0.0;
            }
        }

        Ok(Waveform {
            samples,
            sample_rate,
        })
    }

    /// Copy a borrowed slice into a validated waveform
    pub fn from_slice(samples: &[f32], sample_rate: u32) -> Result<Self, InputError> {
        Self::new(samples.to_vec(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
