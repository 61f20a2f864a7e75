//! Waveform source generator — the raw excitation signal.
//!
//! Periodic shapes follow a frequency timeline that starts at
//! `frequencyStart` and reaches `frequencyEnd` at `duration` (exponentially
//! when the two differ by more than 1 Hz, as a step otherwise). Every
//! source plays from t = 0 and is silent from t = `duration + release` on.

use log::debug;
use rand::Rng;

use super::automation::Automation;
use super::oscillator::{Oscillator, Shape};
use crate::params::{MIN_FREQUENCY, ParameterSet, Waveform};

/// Start and end differing by less than this are treated as no sweep (Hz).
const SWEEP_THRESHOLD: f64 = 1.0;

/// Oscillator frequency over time.
pub fn frequency_automation(params: &ParameterSet) -> Automation {
    let start = params.frequency_start.max(MIN_FREQUENCY);
    let end = params.frequency_end.max(MIN_FREQUENCY);

    let mut freq = Automation::new(start);
    freq.set_value_at(start, 0.0);
    if (start - end).abs() > SWEEP_THRESHOLD {
        freq.exponential_ramp_to(end, params.duration);
    } else {
        freq.set_value_at(end, params.duration);
    }
    freq
}

/// Number of frames the source is audible for.
pub fn active_frames(params: &ParameterSet, sample_rate: f64) -> usize {
    ((params.duration + params.release) * sample_rate).ceil() as usize
}

/// Render the excitation signal into a buffer of `num_samples` frames.
///
/// `rng` is drawn from only for the `noise` waveform.
pub fn generate<R: Rng>(
    params: &ParameterSet,
    sample_rate: f64,
    num_samples: usize,
    rng: &mut R,
) -> Vec<f64> {
    let active = active_frames(params, sample_rate).min(num_samples);
    debug!(
        "source {:?}: {active} active frames of {num_samples}",
        params.waveform
    );

    match params.waveform {
        Waveform::Noise => white_noise(active, num_samples, rng),
        Waveform::Pulse => pulse(params, sample_rate, active, num_samples),
        Waveform::Custom => {
            let harmonics = params.harmonics_or_fundamental();
            let osc = Oscillator::additive(&harmonics, sample_rate);
            run_oscillator(osc, params, sample_rate, active, num_samples)
        }
        Waveform::Sine => run_shape(Shape::Sine, params, sample_rate, active, num_samples),
        Waveform::Square => run_shape(Shape::Square, params, sample_rate, active, num_samples),
        Waveform::Sawtooth => {
            run_shape(Shape::Sawtooth, params, sample_rate, active, num_samples)
        }
        Waveform::Triangle => {
            run_shape(Shape::Triangle, params, sample_rate, active, num_samples)
        }
    }
}

fn run_shape(
    shape: Shape,
    params: &ParameterSet,
    sample_rate: f64,
    active: usize,
    num_samples: usize,
) -> Vec<f64> {
    let osc = Oscillator::new(shape, sample_rate);
    run_oscillator(osc, params, sample_rate, active, num_samples)
}

fn run_oscillator(
    mut osc: Oscillator,
    params: &ParameterSet,
    sample_rate: f64,
    active: usize,
    num_samples: usize,
) -> Vec<f64> {
    let freq = frequency_automation(params);
    let mut out = vec![0.0; num_samples];
    for (i, slot) in out.iter_mut().take(active).enumerate() {
        *slot = osc.next_sample(freq.value_at(i as f64 / sample_rate));
    }
    out
}

fn white_noise<R: Rng>(active: usize, num_samples: usize, rng: &mut R) -> Vec<f64> {
    let mut out = vec![0.0; num_samples];
    for slot in out.iter_mut().take(active) {
        *slot = rng.gen_range(-1.0..=1.0);
    }
    out
}

/// Two sawtooths on the same frequency timeline; the second is delayed by
/// `pulseWidth` of the *starting* period and inverted. The sum is halved.
///
/// The delay is fixed, so during a sweep the duty cycle drifts with the
/// instantaneous period. Exact only at constant frequency.
fn pulse(params: &ParameterSet, sample_rate: f64, active: usize, num_samples: usize) -> Vec<f64> {
    let saw = run_shape(Shape::Sawtooth, params, sample_rate, active, num_samples);
    let start = params.frequency_start.max(MIN_FREQUENCY);
    let offset = ((params.pulse_width / start) * sample_rate).round() as usize;

    (0..num_samples)
        .map(|i| {
            let delayed = if i >= offset { saw[i - offset] } else { 0.0 };
            0.5 * (saw[i] - delayed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SR: f64 = 44100.0;

    fn zero_crossings(samples: &[f64]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn sweep_is_exponential_when_far_apart() {
        let params = ParameterSet {
            frequency_start: 1000.0,
            frequency_end: 100.0,
            duration: 1.0,
            ..ParameterSet::default()
        };
        let f = frequency_automation(&params);
        assert!((f.value_at(0.0) - 1000.0).abs() < 1e-9);
        assert!((f.value_at(0.5) - 316.227_766).abs() < 1e-3);
        assert!((f.value_at(1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn near_equal_frequencies_step_at_duration() {
        let params = ParameterSet {
            frequency_start: 440.0,
            frequency_end: 440.5,
            duration: 1.0,
            ..ParameterSet::default()
        };
        let f = frequency_automation(&params);
        assert_eq!(f.value_at(0.99), 440.0);
        assert_eq!(f.value_at(1.0), 440.5);
    }

    #[test]
    fn zero_frequency_is_clamped_before_ramping() {
        let params = ParameterSet {
            frequency_start: 0.0,
            frequency_end: 800.0,
            duration: 1.0,
            ..ParameterSet::default()
        };
        let f = frequency_automation(&params);
        let mid = f.value_at(0.5);
        assert!(mid.is_finite() && mid > 0.0);
    }

    #[test]
    fn source_goes_silent_after_release() {
        let params = ParameterSet {
            waveform: Waveform::Square,
            duration: 0.1,
            release: 0.1,
            ..ParameterSet::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = generate(&params, SR, 22050, &mut rng);
        assert_eq!(out.len(), 22050);
        let active = active_frames(&params, SR);
        assert!(out[..active].iter().any(|&s| s != 0.0));
        assert!(out[active..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn noise_is_uniform_and_seeded() {
        let params = ParameterSet {
            waveform: Waveform::Noise,
            duration: 0.5,
            release: 0.0,
            ..ParameterSet::default()
        };
        let a = generate(&params, SR, 22050, &mut ChaCha8Rng::seed_from_u64(7));
        let b = generate(&params, SR, 22050, &mut ChaCha8Rng::seed_from_u64(7));
        let c = generate(&params, SR, 22050, &mut ChaCha8Rng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|s| (-1.0..=1.0).contains(s)));
        let mean = a.iter().sum::<f64>() / a.len() as f64;
        assert!(mean.abs() < 0.05, "white noise mean drifted: {mean}");
    }

    #[test]
    fn pulse_width_sets_duty_cycle() {
        // 100 Hz at 10 kHz: period 100 frames, 25% width -> 25-frame offset.
        let params = ParameterSet {
            waveform: Waveform::Pulse,
            frequency_start: 100.0,
            frequency_end: 100.0,
            duration: 1.0,
            release: 0.0,
            pulse_width: 0.25,
            ..ParameterSet::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = generate(&params, 10_000.0, 10_000, &mut rng);
        // After the first period the signal is a two-level pulse (apart from
        // PolyBLEP edges), so the share of frames above the mean tracks the width.
        let steady = &out[1000..9000];
        let mean = steady.iter().sum::<f64>() / steady.len() as f64;
        let high = steady.iter().filter(|&&s| s > mean).count() as f64 / steady.len() as f64;
        assert!((high - 0.25).abs() < 0.05 || (high - 0.75).abs() < 0.05, "duty {high}");
        assert!(steady.iter().all(|s| s.abs() <= 1.5));
    }

    #[test]
    fn custom_waveform_with_short_harmonics() {
        let params = ParameterSet {
            waveform: Waveform::Custom,
            harmonics: vec![0.0, 1.0],
            duration: 0.1,
            release: 0.0,
            frequency_start: 100.0,
            frequency_end: 100.0,
            ..ParameterSet::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = generate(&params, SR, 4410, &mut rng);
        // Only the second partial: 200 Hz -> 40 zero crossings in 0.1 s.
        let zc = zero_crossings(&out[1..]);
        assert!((38..=41).contains(&zc), "crossings {zc}");
    }

    #[test]
    fn empty_harmonics_do_not_crash() {
        let params = ParameterSet {
            waveform: Waveform::Custom,
            harmonics: vec![],
            ..ParameterSet::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = generate(&params, SR, 1000, &mut rng);
        assert!(out.iter().all(|s| s.is_finite()));
        assert!(out.iter().any(|&s| s != 0.0));
    }
}
