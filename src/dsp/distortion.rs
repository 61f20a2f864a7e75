//! Distortion / Waveshaping
//!
//! A waveshaper maps every sample through a fixed transfer curve. The curve
//! here is built once per render as a lookup table:
//!
//!   k        = amount * 100
//!   curve(x) = (3 + k) * x * 20° / (π + k * |x|)     (20° in radians)
//!
//! Small `k` keeps the curve nearly linear (and quiet, peaking near 0.33);
//! large `k` bends it into a hard knee that adds odd harmonics.
//!
//! Shaping creates harmonics above Nyquist, so the table is applied at 4x the
//! render rate: zero-stuff, low-pass, shape, low-pass, decimate.

use std::f64::consts::PI;

use super::filter::BiquadFilter;
use crate::params::FilterType;

/// Points in the transfer table.
pub const CURVE_SIZE: usize = 44_100;

/// Oversampling factor.
pub const OVERSAMPLE: usize = 4;

/// Anti-imaging / anti-aliasing cutoff as a fraction of the render rate.
const GUARD_BAND: f64 = 0.45;

/// Build the transfer table for `amount` in [0, 1].
pub fn distortion_curve(amount: f64) -> Vec<f64> {
    let k = amount * 100.0;
    let deg = PI / 180.0;
    (0..CURVE_SIZE)
        .map(|i| {
            let x = (i * 2) as f64 / CURVE_SIZE as f64 - 1.0;
            (3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())
        })
        .collect()
}

/// Table waveshaper with 4x oversampling.
#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: Vec<f64>,
    upsample: [BiquadFilter; 2],
    downsample: [BiquadFilter; 2],
}

impl WaveShaper {
    pub fn new(amount: f64, sample_rate: f64) -> Self {
        let fast_rate = sample_rate * OVERSAMPLE as f64;
        let guard = || {
            BiquadFilter::with_params(
                FilterType::Lowpass,
                sample_rate * GUARD_BAND,
                0.707,
                fast_rate,
            )
        };
        WaveShaper {
            curve: distortion_curve(amount),
            upsample: [guard(), guard()],
            downsample: [guard(), guard()],
        }
    }

    /// Read the table at `x`, linearly interpolated. Inputs beyond ±1 read the end points.
    pub fn shape(&self, x: f64) -> f64 {
        let last = self.curve.len() - 1;
        let v = last as f64 * 0.5 * (x + 1.0);
        if v <= 0.0 {
            return self.curve[0];
        }
        if v >= last as f64 {
            return self.curve[last];
        }
        let k = v as usize;
        let frac = v - k as f64;
        self.curve[k] + (self.curve[k + 1] - self.curve[k]) * frac
    }

    /// Shape a buffer in place.
    pub fn process_block(&mut self, samples: &mut [f64]) {
        for s in samples.iter_mut() {
            let mut last = 0.0;
            for phase in 0..OVERSAMPLE {
                // Zero-stuffing loses 1/OVERSAMPLE of the energy; restore it.
                let mut x = if phase == 0 { *s * OVERSAMPLE as f64 } else { 0.0 };
                for f in &mut self.upsample {
                    x = f.process(x);
                }
                let mut y = self.shape(x);
                for f in &mut self.downsample {
                    y = f.process(y);
                }
                last = y;
            }
            *s = last;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_has_expected_shape() {
        let curve = distortion_curve(0.5);
        assert_eq!(curve.len(), CURVE_SIZE);
        assert_eq!(curve[CURVE_SIZE / 2], 0.0);
        assert!(curve[0] < 0.0);
        assert!(curve.windows(2).all(|w| w[1] >= w[0]), "curve must be monotonic");
    }

    #[test]
    fn curve_endpoint_matches_formula() {
        let k = 80.0;
        let curve = distortion_curve(0.8);
        let expected = (3.0 + k) * -1.0 * 20.0 * (PI / 180.0) / (PI + k);
        assert!((curve[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn more_drive_bends_harder() {
        // Ratio of output at x = 0.1 to x = 1.0 grows with drive (harder knee).
        let soft = WaveShaper::new(0.01, 44100.0);
        let hard = WaveShaper::new(1.0, 44100.0);
        let knee = |w: &WaveShaper| w.shape(0.1) / w.shape(1.0);
        assert!(knee(&hard) > knee(&soft));
    }

    #[test]
    fn shape_clamps_outside_unit_range() {
        let w = WaveShaper::new(0.3, 44100.0);
        assert_eq!(w.shape(5.0), w.shape(1.0));
        assert_eq!(w.shape(-5.0), w.shape(-1.0));
        assert!(w.shape(0.0).abs() < 1e-3);
    }

    #[test]
    fn oversampled_block_is_finite_and_bounded() {
        let mut w = WaveShaper::new(1.0, 44100.0);
        let mut samples: Vec<f64> = (0..4410)
            .map(|i| (2.0 * PI * 440.0 * i as f64 / 44100.0).sin())
            .collect();
        w.process_block(&mut samples);
        assert!(samples.iter().all(|s| s.is_finite()));
        let peak = samples.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!(peak > 0.2 && peak < 0.6, "peak {peak}");
    }

    #[test]
    fn oversampling_preserves_low_frequencies() {
        // Near-linear curve: a 100 Hz tone comes through scaled, not dropped.
        let mut w = WaveShaper::new(0.0, 44100.0);
        let mut samples: Vec<f64> = (0..8820)
            .map(|i| 0.1 * (2.0 * PI * 100.0 * i as f64 / 44100.0).sin())
            .collect();
        w.process_block(&mut samples);
        let peak = samples[4410..].iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        let slope = 3.0 * 20.0 * (PI / 180.0) / PI;
        assert!((peak - 0.1 * slope).abs() < 0.005, "peak {peak}");
    }
}
