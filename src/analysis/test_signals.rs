// Deterministic test signals
// Synthetic tones, noise and speech-like material shared by analyzer tests

use std::f64::consts::PI;

/// Steady sine tone
pub fn sine(freq: f64, amplitude: f64, sample_rate: u32, secs: f64) -> Vec<f32> {
    let n = (secs * sample_rate as f64) as usize;
    (0..n)
        .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()) as f32)
        .collect()
}

/// Sine whose frequency swings sinusoidally around `center` by `depth` Hz
pub fn vibrato(center: f64, depth: f64, rate: f64, amplitude: f64, sample_rate: u32, secs: f64) -> Vec<f32> {
    let n = (secs * sample_rate as f64) as usize;
    let dt = 1.0 / sample_rate as f64;
    let mut phase = 0.0;
    (0..n)
        .map(|i| {
            let t = i as f64 * dt;
            let freq = center + depth * (2.0 * PI * rate * t).sin();
            phase += 2.0 * PI * freq * dt;
            (amplitude * phase.sin()) as f32
        })
        .collect()
}

/// Uniform white noise in [-amplitude, amplitude] from a fixed-seed LCG
pub fn noise(amplitude: f64, len: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            (amplitude * (2.0 * unit - 1.0)) as f32
        })
        .collect()
}

/// Alternating segments of a 300 Hz tone and white noise
pub fn tone_noise_alternating(sample_rate: u32, secs: f64, segment_secs: f64) -> Vec<f32> {
    let segment = ((segment_secs * sample_rate as f64) as usize).max(1);
    let tone = sine(300.0, 0.5, sample_rate, segment_secs);
    let hiss = noise(0.5, segment, 7);
    let total = (secs * sample_rate as f64) as usize;

    (0..total)
        .map(|i| {
            let offset = i % segment;
            if (i / segment) % 2 == 0 {
                tone.get(offset).copied().unwrap_or(0.0)
            } else {
                hiss[offset]
            }
        })
        .collect()
}

/// Single-sample clicks every `interval_secs` over digital silence
pub fn impulse_train(sample_rate: u32, secs: f64, interval_secs: f64) -> Vec<f32> {
    let total = (secs * sample_rate as f64) as usize;
    let interval = ((interval_secs * sample_rate as f64) as usize).max(1);
    (0..total)
        .map(|i| if i % interval == interval / 2 { 0.9 } else { 0.0 })
        .collect()
}

/// Syllable-like material: gliding harmonic vowels, fricative noise, then pauses.
///
/// Every 0.4 s: 0.2 s of a harmonic tone whose f0 swings 100-260 Hz, 0.05 s of
/// noise and 0.15 s of silence.
pub fn speech_like(sample_rate: u32, secs: f64) -> Vec<f32> {
    let sr = sample_rate as f64;
    let total = (secs * sr) as usize;
    let syllable = (0.4 * sr) as usize;
    let voiced = (0.2 * sr) as usize;
    let fricative = (0.05 * sr) as usize;
    let hiss = noise(0.3, total, 11);

    let mut phase = 0.0;
    let mut out = Vec::with_capacity(total);
    for i in 0..total {
        let t = i as f64 / sr;
        let f0 = 180.0 + 80.0 * (2.0 * PI * 1.3 * t).sin();
        phase += 2.0 * PI * f0 / sr;

        let position = i % syllable;
        let sample = if position < voiced {
            let envelope = (PI * position as f64 / voiced as f64).sin();
            let tone: f64 = (1..=8).map(|k| (k as f64 * phase).sin() / k as f64).sum();
            0.4 * envelope * tone
        } else if position < voiced + fricative {
            hiss[i] as f64
        } else {
            0.0
        };
        out.push(sample as f32);
    }
    out
}

/// Multiply every sample by `gain`
pub fn scaled(samples: &[f32], gain: f32) -> Vec<f32> {
    samples.iter().map(|&s| s * gain).collect()
}
