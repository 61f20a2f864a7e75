//! Biquad filter — Audio EQ Cookbook coefficients, cutoff automatable per sample.

use std::f64::consts::PI;

use crate::params::FilterType;

/// A biquad IIR filter (2nd order).
///
/// Implements the standard Direct Form II Transposed structure.
/// Coefficient formulas from the Audio EQ Cookbook (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    pub filter_type: FilterType,
    pub frequency: f64,
    pub q: f64,

    // Coefficients
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // State (Direct Form II Transposed)
    z1: f64,
    z2: f64,

    sample_rate: f64,
    dirty: bool,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, sample_rate: f64) -> Self {
        let mut f = BiquadFilter {
            filter_type,
            frequency: 1000.0,
            q: 0.707, // Butterworth
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
            dirty: true,
        };
        f.update_coefficients();
        f
    }

    pub fn with_params(filter_type: FilterType, frequency: f64, q: f64, sample_rate: f64) -> Self {
        let mut f = BiquadFilter::new(filter_type, sample_rate);
        f.frequency = frequency;
        f.q = q;
        f.update_coefficients();
        f
    }

    /// Recompute filter coefficients from current parameters.
    pub fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        let (b0, b1, b2) = match self.filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, -(1.0 + cos_w0), b0)
            }
            FilterType::Bandpass => (alpha, 0.0, -alpha),
            FilterType::Allpass => (1.0 - alpha, -2.0 * cos_w0, 1.0 + alpha),
        };

        // Normalize by a0
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
        self.dirty = false;
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, input: f64) -> f64 {
        if self.dirty {
            self.update_coefficients();
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Filter a buffer in place at the current, fixed cutoff.
    pub fn process_block(&mut self, samples: &mut [f64]) {
        for s in samples {
            *s = self.process(*s);
        }
    }

    /// Filter a buffer in place, following a per-sample cutoff.
    pub fn process_block_modulated(&mut self, samples: &mut [f64], cutoff: &[f64]) {
        for (s, &freq) in samples.iter_mut().zip(cutoff) {
            if freq != self.frequency {
                self.set_frequency(freq);
            }
            *s = self.process(*s);
        }
    }

    /// Set frequency and mark coefficients dirty.
    pub fn set_frequency(&mut self, freq: f64) {
        self.frequency = freq;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_peak(f: &mut BiquadFilter, freq: f64) -> f64 {
        let mut max_out = 0.0_f64;
        for i in 0..8820 {
            let t = i as f64 / 44100.0;
            let out = f.process((2.0 * PI * freq * t).sin());
            if i > 4410 {
                max_out = max_out.max(out.abs());
            }
        }
        max_out
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = BiquadFilter::with_params(FilterType::Lowpass, 5000.0, 0.707, 44100.0);

        // Feed DC signal (1.0): should converge to 1.0
        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(
            (output - 1.0).abs() < 0.001,
            "Lowpass should pass DC, got {output}"
        );
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = BiquadFilter::with_params(FilterType::Highpass, 1000.0, 0.707, 44100.0);

        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(output.abs() < 0.001, "Highpass should block DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = BiquadFilter::with_params(FilterType::Lowpass, 200.0, 0.707, 44100.0);
        let amp = sine_peak(&mut f, 10000.0);
        assert!(
            amp < 0.01,
            "Lowpass@200Hz should strongly attenuate 10kHz, got amplitude {amp}"
        );
    }

    #[test]
    fn bandpass_peaks_at_center() {
        let mut center = BiquadFilter::with_params(FilterType::Bandpass, 1000.0, 2.0, 44100.0);
        let mut off = BiquadFilter::with_params(FilterType::Bandpass, 1000.0, 2.0, 44100.0);
        let at_center = sine_peak(&mut center, 1000.0);
        let away = sine_peak(&mut off, 8000.0);
        assert!((at_center - 1.0).abs() < 0.02, "center gain {at_center}");
        assert!(away < 0.2, "off-center gain {away}");
    }

    #[test]
    fn allpass_keeps_magnitude() {
        for freq in [100.0, 1000.0, 6000.0] {
            let mut f = BiquadFilter::with_params(FilterType::Allpass, 1000.0, 1.0, 44100.0);
            let amp = sine_peak(&mut f, freq);
            assert!((amp - 1.0).abs() < 0.01, "allpass gain at {freq}: {amp}");
        }
    }

    #[test]
    fn modulated_block_follows_cutoff() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        let mut samples = vec![1.0; 64];
        let cutoff: Vec<f64> = (0..64).map(|i| 500.0 + i as f64 * 10.0).collect();
        f.process_block_modulated(&mut samples, &cutoff);
        assert_eq!(f.frequency, 1130.0);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn filter_output_finite() {
        let mut f = BiquadFilter::with_params(FilterType::Bandpass, 1000.0, 0.707, 44100.0);

        for i in 0..10000 {
            let input = if i % 100 == 0 { 1.0 } else { 0.0 };
            let out = f.process(input);
            assert!(out.is_finite(), "Filter output not finite at sample {i}");
        }
    }
}
