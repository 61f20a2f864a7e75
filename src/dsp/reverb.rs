//! Convolution reverb against a synthetic impulse response.
//!
//! The impulse is decaying white noise, `noise * (1 - n/len)^3`, 2.5 s long,
//! generated on two independent channels. The two channels are normalized
//! together (RMS power, calibrated to -58 dB as a browser convolver does) and
//! averaged into one mono kernel, the same result a mono destination gets
//! from a stereo convolver.
//!
//! Convolution runs in the frequency domain with `rustfft`: one forward
//! transform per operand, a pointwise product, one inverse transform.

use log::debug;
use rand::Rng;
use rustfft::{Fft, FftPlanner};
use rustfft::num_complex::Complex;

/// Impulse length in seconds.
pub const IMPULSE_SECONDS: f64 = 2.5;

/// Exponent of the impulse's amplitude decay.
pub const IMPULSE_DECAY: f64 = 3.0;

/// Wet gain is `reverb * WET_SCALE`.
pub const WET_SCALE: f64 = 0.5;

const IMPULSE_CHANNELS: usize = 2;
const GAIN_CALIBRATION_DB: f64 = -58.0;
const GAIN_CALIBRATION_SAMPLE_RATE: f64 = 44_100.0;
const MIN_POWER: f64 = 0.000_125;

/// One channel of decaying noise.
pub fn impulse_channel<R: Rng>(length: usize, decay: f64, rng: &mut R) -> Vec<f64> {
    (0..length)
        .map(|j| {
            let envelope = (1.0 - j as f64 / length as f64).powf(decay);
            rng.gen_range(-1.0..=1.0) * envelope
        })
        .collect()
}

/// Gain that brings a multi-channel impulse to calibrated loudness.
pub fn normalization_scale(channels: &[Vec<f64>], sample_rate: f64) -> f64 {
    let samples: usize = channels.iter().map(Vec::len).sum();
    if samples == 0 {
        return 0.0;
    }
    let energy: f64 = channels.iter().flatten().map(|s| s * s).sum();
    let mut power = (energy / samples as f64).sqrt();
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }
    let calibration = 10.0_f64.powf(GAIN_CALIBRATION_DB * 0.05);
    calibration / power * (GAIN_CALIBRATION_SAMPLE_RATE / sample_rate)
}

/// Generate, normalize and collapse the stereo impulse into one mono kernel.
pub fn synthesize_impulse<R: Rng>(sample_rate: f64, rng: &mut R) -> Vec<f64> {
    let length = (sample_rate * IMPULSE_SECONDS) as usize;
    let channels: Vec<Vec<f64>> = (0..IMPULSE_CHANNELS)
        .map(|_| impulse_channel(length, IMPULSE_DECAY, &mut *rng))
        .collect();
    let scale = normalization_scale(&channels, sample_rate);

    (0..length)
        .map(|j| {
            let sum: f64 = channels.iter().map(|c| c[j]).sum();
            sum / IMPULSE_CHANNELS as f64 * scale
        })
        .collect()
}

/// Linear convolution, truncated to `signal.len()` samples.
pub fn convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let size = (signal.len() + kernel.len() - 1).next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let spectrum = |data: &[f64]| {
        let mut buf: Vec<Complex<f64>> = data.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buf.resize(size, Complex::new(0.0, 0.0));
        forward.process(&mut buf);
        buf
    };
    let mut acc = spectrum(signal);
    let kernel_spectrum = spectrum(kernel);
    for (a, k) in acc.iter_mut().zip(&kernel_spectrum) {
        *a *= *k;
    }
    inverse.process(&mut acc);

    // rustfft leaves the inverse unnormalized.
    let norm = 1.0 / size as f64;
    acc.iter().take(signal.len()).map(|c| c.re * norm).collect()
}

/// Parallel reverb send.
#[derive(Debug, Clone)]
pub struct ConvolutionReverb {
    impulse: Vec<f64>,
    /// Gain applied to the convolved signal.
    pub wet: f64,
}

impl ConvolutionReverb {
    /// Reverb with a freshly synthesized impulse and wet gain `amount * 0.5`.
    pub fn new<R: Rng>(sample_rate: f64, amount: f64, rng: &mut R) -> Self {
        let impulse = synthesize_impulse(sample_rate, rng);
        debug!("reverb impulse: {} frames, wet {}", impulse.len(), amount * WET_SCALE);
        ConvolutionReverb::from_impulse(impulse, amount * WET_SCALE)
    }

    pub fn from_impulse(impulse: Vec<f64>, wet: f64) -> Self {
        ConvolutionReverb { impulse, wet }
    }

    /// Add the wet signal for `input` into `bus`.
    pub fn accumulate(&self, input: &[f64], bus: &mut [f64]) {
        let wet = convolve(input, &self.impulse);
        for (out, w) in bus.iter_mut().zip(wet) {
            *out += w * self.wet;
        }
    }
}
