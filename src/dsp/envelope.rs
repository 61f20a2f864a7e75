//! ADSR envelope — master gain as a breakpoint timeline.

use super::automation::Automation;
use crate::params::ParameterSet;

/// Shortest ramp segment (seconds). Zero-length segments are stretched to this.
pub const MIN_RAMP_TIME: f64 = 0.001;

/// ADSR envelope with linear attack/decay/release segments.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
    /// Time the release starts (end of the held portion).
    pub hold_until: f64,
}

/// Absolute times at which each envelope segment ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints {
    pub attack_end: f64,
    pub decay_end: f64,
    pub release_start: f64,
    pub release_end: f64,
}

impl Envelope {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64, hold_until: f64) -> Self {
        Envelope {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
            hold_until: hold_until.max(0.0),
        }
    }

    pub fn from_params(params: &ParameterSet) -> Self {
        Envelope::new(
            params.attack,
            params.decay,
            params.sustain,
            params.release,
            params.duration,
        )
    }

    pub fn breakpoints(&self) -> Breakpoints {
        let attack_end = self.attack.max(MIN_RAMP_TIME);
        Breakpoints {
            attack_end,
            decay_end: attack_end + self.decay.max(MIN_RAMP_TIME),
            release_start: self.hold_until,
            release_end: self.hold_until + self.release.max(MIN_RAMP_TIME),
        }
    }

    /// Gain curve peaking at `peak`: 0 → peak → sustain·peak → hold → 0.
    pub fn gain_automation(&self, peak: f64) -> Automation {
        let bp = self.breakpoints();
        let held = self.sustain * peak;

        let mut gain = Automation::new(0.0);
        gain.set_value_at(0.0, 0.0)
            .linear_ramp_to(peak, bp.attack_end)
            .linear_ramp_to(held, bp.decay_end)
            .set_value_at(held, bp.release_start)
            .linear_ramp_to(0.0, bp.release_end);
        gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(attack: f64, decay: f64, sustain: f64, release: f64, hold: f64) -> Automation {
        Envelope::new(attack, decay, sustain, release, hold).gain_automation(1.0)
    }

    #[test]
    fn starts_silent() {
        let g = env(0.01, 0.1, 0.7, 0.3, 1.0);
        assert_eq!(g.value_at(0.0), 0.0);
    }

    #[test]
    fn attack_reaches_peak() {
        let g = Envelope::new(0.01, 0.1, 0.5, 0.3, 1.0).gain_automation(0.8);
        assert!((g.value_at(0.005) - 0.4).abs() < 1e-9);
        assert!((g.value_at(0.01) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn sustain_holds() {
        let g = env(0.001, 0.001, 0.6, 0.3, 1.0);
        for t in [0.01, 0.5, 0.99] {
            let s = g.value_at(t);
            assert!((s - 0.6).abs() < 1e-9, "Should sustain at 0.6, got {s} at {t}");
        }
    }

    #[test]
    fn release_to_zero() {
        let g = env(0.01, 0.01, 0.7, 0.2, 0.5);
        assert!((g.value_at(0.6) - 0.35).abs() < 1e-9);
        assert_eq!(g.value_at(0.71), 0.0);
        assert_eq!(g.value_at(3.0), 0.0);
    }

    #[test]
    fn zero_length_segments_use_epsilon() {
        let e = Envelope::new(0.0, 0.0, 1.0, 0.0, 0.5);
        let bp = e.breakpoints();
        assert_eq!(bp.attack_end, MIN_RAMP_TIME);
        assert_eq!(bp.decay_end, 2.0 * MIN_RAMP_TIME);
        assert_eq!(bp.release_end, 0.5 + MIN_RAMP_TIME);

        let g = e.gain_automation(1.0);
        assert_eq!(g.value_at(0.0), 0.0);
        assert_eq!(g.value_at(0.25), 1.0);
        assert!(g.value_at(0.5 + MIN_RAMP_TIME / 2.0) < 1.0);
    }

    #[test]
    fn full_cycle_range() {
        let g = env(0.01, 0.05, 0.5, 0.1, 0.2);
        for s in g.render(44100.0, 44100) {
            assert!((0.0..=1.0).contains(&s), "Envelope out of range: {s}");
        }
    }
}
