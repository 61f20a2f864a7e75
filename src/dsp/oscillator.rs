//! Anti-aliased oscillators using PolyBLEP, plus additive wavetables.

use std::f64::consts::PI;

use crate::params::HARMONIC_COUNT;

/// Samples per cycle in an additive wavetable.
const TABLE_SIZE: usize = 2048;

/// Supported periodic shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// One cycle of an additive waveform, peak-normalized to 1.
    Wavetable(Vec<f64>),
}

/// A band-limited oscillator driven by a per-sample frequency.
///
/// All shapes start at a zero crossing heading upward (square starts high).
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub shape: Shape,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(shape: Shape, sample_rate: f64) -> Self {
        Oscillator {
            shape,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Oscillator playing a weighted sum of sine partials.
    ///
    /// `harmonics[n]` is the amplitude of partial `n + 1`.
    pub fn additive(harmonics: &[f64; HARMONIC_COUNT], sample_rate: f64) -> Self {
        Oscillator::new(Shape::Wavetable(build_wavetable(harmonics)), sample_rate)
    }

    /// Generate the next sample at `frequency` Hz.
    pub fn next_sample(&mut self, frequency: f64) -> f64 {
        let inc = frequency / self.sample_rate;
        let sample = match &self.shape {
            Shape::Sine => (2.0 * PI * self.phase).sin(),
            Shape::Sawtooth => sawtooth(self.phase, inc),
            Shape::Square => square(self.phase, inc),
            Shape::Triangle => triangle(self.phase),
            Shape::Wavetable(table) => lookup(table, self.phase),
        };

        self.phase += inc;
        self.phase -= self.phase.floor();

        sample
    }
}

/// Rises from -1 to +1 and drops; shifted half a cycle so it starts at 0.
/// PolyBLEP corrects the discontinuity at the wrap.
fn sawtooth(phase: f64, inc: f64) -> f64 {
    let t = (phase + 0.5) % 1.0;
    2.0 * t - 1.0 - poly_blep(t, inc)
}

fn square(phase: f64, inc: f64) -> f64 {
    let mut value = if phase < 0.5 { 1.0 } else { -1.0 };
    value += poly_blep(phase, inc);
    value -= poly_blep((phase + 0.5) % 1.0, inc);
    value
}

/// Piecewise linear, shifted a quarter cycle so it starts at 0 rising.
fn triangle(phase: f64) -> f64 {
    let t = (phase + 0.25) % 1.0;
    if t < 0.5 {
        4.0 * t - 1.0
    } else {
        3.0 - 4.0 * t
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

fn build_wavetable(harmonics: &[f64; HARMONIC_COUNT]) -> Vec<f64> {
    let mut table: Vec<f64> = (0..TABLE_SIZE)
        .map(|j| {
            let x = 2.0 * PI * j as f64 / TABLE_SIZE as f64;
            harmonics
                .iter()
                .enumerate()
                .filter(|&(_, &amp)| amp != 0.0)
                .map(|(n, &amp)| amp * ((n + 1) as f64 * x).sin())
                .sum()
        })
        .collect();

    let peak = table.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
    if peak > 0.0 {
        for s in &mut table {
            *s /= peak;
        }
    }
    table
}

/// Linear-interpolated table read at phase [0, 1).
fn lookup(table: &[f64], phase: f64) -> f64 {
    let pos = phase * table.len() as f64;
    let i = pos as usize % table.len();
    let j = (i + 1) % table.len();
    let frac = pos - pos.floor();
    table[i] + (table[j] - table[i]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(shape: Shape) -> Vec<f64> {
        let mut osc = Oscillator::new(shape, 44100.0);
        (0..44100).map(|_| osc.next_sample(440.0)).collect()
    }

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Shape::Sine, 44100.0);
        let sample = osc.next_sample(440.0);
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn sine_range() {
        for s in run(Shape::Sine) {
            assert!((-1.0..=1.0).contains(&s), "Sine out of range: {s}");
        }
    }

    #[test]
    fn sawtooth_range() {
        for s in run(Shape::Sawtooth) {
            assert!((-1.5..=1.5).contains(&s), "Saw out of range: {s}");
        }
    }

    #[test]
    fn square_range() {
        for s in run(Shape::Square) {
            assert!((-1.5..=1.5).contains(&s), "Square out of range: {s}");
        }
    }

    #[test]
    fn triangle_range_and_start() {
        let samples = run(Shape::Triangle);
        assert!(samples[0].abs() < 1e-12);
        for s in samples {
            assert!((-1.0..=1.0).contains(&s), "Triangle out of range: {s}");
        }
    }

    #[test]
    fn frequency_sets_cycle_length() {
        // 100 Hz at 1 kHz: one cycle every 10 samples.
        let mut osc = Oscillator::new(Shape::Sine, 1000.0);
        let a: Vec<f64> = (0..20).map(|_| osc.next_sample(100.0)).collect();
        assert!((a[0] - a[10]).abs() < 1e-9);
        assert!((a[3] - a[13]).abs() < 1e-9);
    }

    #[test]
    fn fundamental_only_table_is_a_sine() {
        let mut h = [0.0; HARMONIC_COUNT];
        h[0] = 1.0;
        let mut table_osc = Oscillator::additive(&h, 44100.0);
        let mut sine = Oscillator::new(Shape::Sine, 44100.0);
        for _ in 0..2000 {
            let a = table_osc.next_sample(440.0);
            let b = sine.next_sample(440.0);
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn additive_table_is_peak_normalized() {
        let h = [1.0, 0.5, 0.33, 0.0, 0.2, 0.0, 0.0, 0.1];
        let table = build_wavetable(&h);
        let peak = table.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!((peak - 1.0).abs() < 1e-12);
    }

    #[test]
    fn silent_table_stays_silent() {
        let table = build_wavetable(&[0.0; HARMONIC_COUNT]);
        assert!(table.iter().all(|&s| s == 0.0));
    }
}
