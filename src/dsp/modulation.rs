//! Filter cutoff modulation — LFO vibrato and envelope follow.
//!
//! The cutoff starts as a flat timeline at `filterFreq`. Envelope follow
//! replaces that timeline with exponential ADSR breakpoints; the LFO is then
//! added on top, sample by sample, for the whole render.

use std::f64::consts::PI;

use super::automation::Automation;
use super::envelope::Envelope;
use crate::params::ParameterSet;

/// Envelope-follow breakpoints are clamped into this band (Hz).
pub const ENV_CUTOFF_MIN: f64 = 20.0;
pub const ENV_CUTOFF_MAX: f64 = 22_000.0;

/// Lowest cutoff the filter ever receives (Hz).
const CUTOFF_FLOOR: f64 = 10.0;

/// Keep a cutoff inside (floor, Nyquist) for `sample_rate`.
pub fn clamp_cutoff(freq: f64, sample_rate: f64) -> f64 {
    freq.clamp(CUTOFF_FLOOR, sample_rate * 0.49)
}

/// Sine LFO, bipolar, scaled by `depth`.
#[derive(Debug, Clone)]
pub struct Lfo {
    pub rate: f64,
    pub depth: f64,
    phase: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new(rate: f64, depth: f64, sample_rate: f64) -> Self {
        Lfo {
            rate,
            depth,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn next_sample(&mut self) -> f64 {
        let out = self.depth * (2.0 * PI * self.phase).sin();
        self.phase += self.rate / self.sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

/// Cutoff frequency timeline for one render.
#[derive(Debug, Clone)]
pub struct CutoffModulation {
    base: Automation,
    lfo: Option<Lfo>,
    sample_rate: f64,
}

impl CutoffModulation {
    pub fn from_params(params: &ParameterSet, sample_rate: f64) -> Self {
        let base = if params.env_mod_active() {
            envelope_follow(params)
        } else {
            Automation::new(params.filter_freq)
        };
        let lfo = params.lfo_active().then(|| {
            Lfo::new(
                params.filter_mod_lfo_rate,
                params.filter_mod_lfo_depth,
                sample_rate,
            )
        });
        CutoffModulation {
            base,
            lfo,
            sample_rate,
        }
    }

    /// True when the cutoff never moves.
    pub fn is_static(&self) -> bool {
        self.lfo.is_none() && self.base.is_constant()
    }

    /// Cutoff for each of `num_samples` frames, kept inside (floor, Nyquist).
    pub fn render(&mut self, num_samples: usize) -> Vec<f64> {
        (0..num_samples)
            .map(|i| {
                let base = self.base.value_at(i as f64 / self.sample_rate);
                let wobble = self.lfo.as_mut().map_or(0.0, Lfo::next_sample);
                clamp_cutoff(base + wobble, self.sample_rate)
            })
            .collect()
    }
}

/// Cutoff ADSR: `filterFreq` → `+depth` → `+depth·sustain` → back to `filterFreq`.
///
/// Shares the amplitude envelope's timings. All transitions are exponential.
pub fn envelope_follow(params: &ParameterSet) -> Automation {
    let bp = Envelope::from_params(params).breakpoints();
    let base = clamp_env(params.filter_freq);
    let peak = clamp_env(params.filter_freq + params.filter_mod_env_depth);
    let held = clamp_env(params.filter_freq + params.filter_mod_env_depth * params.sustain);

    let mut cutoff = Automation::new(base);
    cutoff
        .set_value_at(base, 0.0)
        .exponential_ramp_to(peak, bp.attack_end)
        .exponential_ramp_to(held, bp.decay_end)
        .set_value_at(held, bp.release_start)
        .exponential_ramp_to(base, bp.release_end);
    cutoff
}

fn clamp_env(freq: f64) -> f64 {
    freq.clamp(ENV_CUTOFF_MIN, ENV_CUTOFF_MAX)
}
