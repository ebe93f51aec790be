// Audio processing module
// Decodes uploaded audio, validates waveforms and provides shared DSP primitives

pub mod dsp;
pub mod ingest;
pub mod waveform;

pub use dsp::{Correlator, Spectrogram};
pub use ingest::{decode_audio, AudioData, AudioError, AudioFormat};
pub use waveform::{InputError, Waveform};
