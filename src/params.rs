//! Parameter set — the complete, JSON-serializable description of one sound.
//!
//! A `ParameterSet` may come from anywhere (a generation service, a manual
//! editor, the preset library). The engine never mutates it; rendering and
//! encoding work on a [`ParameterSet::clamped`] copy so malformed input
//! degrades into the nearest playable sound instead of failing.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SfxError};

/// Number of additive partials carried by the `custom` waveform.
pub const HARMONIC_COUNT: usize = 8;

/// Smallest frequency handed to an exponential ramp (Hz).
pub const MIN_FREQUENCY: f64 = 0.001;

/// Longest held portion accepted, in seconds.
pub const MAX_DURATION: f64 = 5.0;

/// Longest attack / decay / release segment accepted, in seconds.
pub const MAX_ENVELOPE_TIME: f64 = 5.0;

const MAX_FREQUENCY: f64 = 24_000.0;

// ── Enumerations ────────────────────────────────────────────

/// Excitation source shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
    Pulse,
    Custom,
}

impl Waveform {
    /// Parse a waveform tag. Unknown tags fall back to `Sine`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Waveform::Sine,
            "square" => Waveform::Square,
            "sawtooth" | "saw" => Waveform::Sawtooth,
            "triangle" => Waveform::Triangle,
            "noise" => Waveform::Noise,
            "pulse" => Waveform::Pulse,
            "custom" => Waveform::Custom,
            other => {
                warn!("unknown waveform '{other}', falling back to sine");
                Waveform::Sine
            }
        }
    }
}

impl<'de> Deserialize<'de> for Waveform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Waveform::parse(&tag))
    }
}

/// Response of the single biquad stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Allpass,
}

impl FilterType {
    /// Parse a filter tag. Unknown tags fall back to `Lowpass`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowpass" => FilterType::Lowpass,
            "highpass" => FilterType::Highpass,
            "bandpass" => FilterType::Bandpass,
            "allpass" => FilterType::Allpass,
            other => {
                warn!("unknown filter type '{other}', falling back to lowpass");
                FilterType::Lowpass
            }
        }
    }
}

impl<'de> Deserialize<'de> for FilterType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FilterType::parse(&tag))
    }
}

// ── Parameter Set ───────────────────────────────────────────

/// Everything needed to render (or MIDI-encode) one sound effect.
///
/// Every key is optional on the wire; missing keys take the values of
/// [`ParameterSet::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSet {
    pub waveform: Waveform,
    /// Oscillator frequency at t = 0 (Hz).
    pub frequency_start: f64,
    /// Oscillator frequency reached at t = `duration` (Hz).
    pub frequency_end: f64,
    /// Held portion before release, in seconds.
    pub duration: f64,
    pub attack: f64,
    pub decay: f64,
    /// Sustain gain fraction [0, 1].
    pub sustain: f64,
    pub release: f64,
    /// Master gain [0, 1].
    pub volume: f64,

    pub filter_type: FilterType,
    /// Filter cutoff (Hz).
    pub filter_freq: f64,
    /// Filter resonance.
    pub q_factor: f64,
    /// Cutoff LFO rate (Hz). Active only with a positive depth.
    pub filter_mod_lfo_rate: f64,
    /// Cutoff LFO depth (Hz).
    pub filter_mod_lfo_depth: f64,
    /// Cutoff envelope-follow depth (Hz).
    pub filter_mod_env_depth: f64,

    /// Waveshaper amount [0, 1].
    pub distortion: f64,
    /// Delay time in seconds [0, 1].
    pub delay_time: f64,
    /// Delay feedback [0, 1]; capped at 0.9 by the delay line.
    pub delay_feedback: f64,
    /// Reverb wetness [0, 1].
    pub reverb: f64,

    /// Duty cycle for the `pulse` waveform, (0, 1).
    pub pulse_width: f64,
    /// Partial amplitudes for the `custom` waveform. Index 0 is the fundamental.
    pub harmonics: Vec<f64>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        ParameterSet {
            waveform: Waveform::Sine,
            frequency_start: 440.0,
            frequency_end: 440.0,
            duration: 0.5,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.5,
            release: 0.2,
            volume: 0.5,
            filter_type: FilterType::Lowpass,
            filter_freq: 2000.0,
            q_factor: 1.0,
            filter_mod_lfo_rate: 0.0,
            filter_mod_lfo_depth: 0.0,
            filter_mod_env_depth: 0.0,
            distortion: 0.0,
            delay_time: 0.0,
            delay_feedback: 0.0,
            reverb: 0.0,
            pulse_width: 0.5,
            harmonics: vec![1.0],
        }
    }
}

impl ParameterSet {
    /// Parse a parameter set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Err(SfxError::Validation("empty parameter document".to_string()));
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON (camelCase keys).
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Return a copy with every field forced into its playable range.
    ///
    /// Non-finite values are replaced by the default for that field.
    pub fn clamped(&self) -> ParameterSet {
        let d = ParameterSet::default();
        ParameterSet {
            waveform: self.waveform,
            frequency_start: clamp_field(
                "frequencyStart",
                self.frequency_start,
                MIN_FREQUENCY,
                MAX_FREQUENCY,
                d.frequency_start,
            ),
            frequency_end: clamp_field(
                "frequencyEnd",
                self.frequency_end,
                MIN_FREQUENCY,
                MAX_FREQUENCY,
                d.frequency_end,
            ),
            duration: clamp_field("duration", self.duration, 0.0, MAX_DURATION, d.duration),
            attack: clamp_field("attack", self.attack, 0.0, MAX_ENVELOPE_TIME, d.attack),
            decay: clamp_field("decay", self.decay, 0.0, MAX_ENVELOPE_TIME, d.decay),
            sustain: clamp_field("sustain", self.sustain, 0.0, 1.0, d.sustain),
            release: clamp_field("release", self.release, 0.0, MAX_ENVELOPE_TIME, d.release),
            volume: clamp_field("volume", self.volume, 0.0, 1.0, d.volume),
            filter_type: self.filter_type,
            filter_freq: clamp_field(
                "filterFreq",
                self.filter_freq,
                10.0,
                MAX_FREQUENCY,
                d.filter_freq,
            ),
            q_factor: clamp_field("qFactor", self.q_factor, 0.0001, 1000.0, d.q_factor),
            filter_mod_lfo_rate: clamp_field(
                "filterModLfoRate",
                self.filter_mod_lfo_rate,
                0.0,
                100.0,
                0.0,
            ),
            filter_mod_lfo_depth: clamp_field(
                "filterModLfoDepth",
                self.filter_mod_lfo_depth,
                0.0,
                20_000.0,
                0.0,
            ),
            filter_mod_env_depth: clamp_field(
                "filterModEnvDepth",
                self.filter_mod_env_depth,
                0.0,
                20_000.0,
                0.0,
            ),
            distortion: clamp_field("distortion", self.distortion, 0.0, 1.0, 0.0),
            delay_time: clamp_field("delayTime", self.delay_time, 0.0, 1.0, 0.0),
            delay_feedback: clamp_field("delayFeedback", self.delay_feedback, 0.0, 1.0, 0.0),
            reverb: clamp_field("reverb", self.reverb, 0.0, 1.0, 0.0),
            pulse_width: clamp_field("pulseWidth", self.pulse_width, 0.01, 0.99, d.pulse_width),
            harmonics: self.harmonic_amplitudes().to_vec(),
        }
    }

    /// The eight partial amplitudes, zero-padded. Non-finite entries read as 0.
    pub fn harmonic_amplitudes(&self) -> [f64; HARMONIC_COUNT] {
        let mut table = [0.0; HARMONIC_COUNT];
        for (slot, &h) in table.iter_mut().zip(self.harmonics.iter()) {
            *slot = if h.is_finite() { h } else { 0.0 };
        }
        table
    }

    /// Partial amplitudes usable for additive synthesis.
    ///
    /// Fails when no partial carries any energy, or when the input holds
    /// non-finite values.
    pub fn resolve_harmonics(&self) -> Result<[f64; HARMONIC_COUNT]> {
        if let Some(bad) = self.harmonics.iter().position(|h| !h.is_finite()) {
            return Err(SfxError::Encoding(format!(
                "harmonic {bad} is not a finite number"
            )));
        }
        let table = self.harmonic_amplitudes();
        if table.iter().all(|&h| h == 0.0) {
            return Err(SfxError::Encoding(
                "harmonics contain no non-zero partial".to_string(),
            ));
        }
        Ok(table)
    }

    /// Like [`resolve_harmonics`](Self::resolve_harmonics), falling back to
    /// a fundamental-only table.
    pub fn harmonics_or_fundamental(&self) -> [f64; HARMONIC_COUNT] {
        self.resolve_harmonics().unwrap_or_else(|e| {
            warn!("{e}; using fundamental only");
            let mut fundamental = [0.0; HARMONIC_COUNT];
            fundamental[0] = 1.0;
            fundamental
        })
    }

    /// Cutoff LFO is active only when both rate and depth are positive.
    pub fn lfo_active(&self) -> bool {
        self.filter_mod_lfo_rate > 0.0 && self.filter_mod_lfo_depth > 0.0
    }

    pub fn env_mod_active(&self) -> bool {
        self.filter_mod_env_depth > 0.0
    }
}

fn clamp_field(name: &str, value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        warn!("{name} is not finite, using {fallback}");
        return fallback;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!("{name} = {value} out of range, clamped to {clamped}");
    }
    clamped
}
