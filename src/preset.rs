//! Built-in presets — a small factory library of ready-made sounds.

use serde::{Deserialize, Serialize};

use crate::params::{FilterType, ParameterSet, Waveform};

/// A named, described ParameterSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Stable identifier (e.g., "preset-laser-classic").
    pub id: String,
    pub name: String,
    pub description: String,
    pub params: ParameterSet,
}

impl Preset {
    fn new(id: &str, name: &str, description: &str, params: ParameterSet) -> Self {
        Preset {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            params,
        }
    }
}

/// Every factory preset, in display order.
pub fn all() -> Vec<Preset> {
    vec![
        Preset::new(
            "preset-laser-classic",
            "Classic Laser",
            "A retro sci-fi laser blast",
            ParameterSet {
                waveform: Waveform::Sawtooth,
                frequency_start: 1800.0,
                frequency_end: 200.0,
                duration: 0.15,
                attack: 0.0,
                decay: 0.1,
                sustain: 0.1,
                release: 0.05,
                volume: 0.6,
                filter_type: FilterType::Lowpass,
                filter_freq: 4000.0,
                q_factor: 1.0,
                distortion: 0.1,
                reverb: 0.1,
                ..ParameterSet::default()
            },
        ),
        Preset::new(
            "preset-jump-8bit",
            "8-Bit Jump",
            "Classic platformer jump sound",
            ParameterSet {
                waveform: Waveform::Square,
                frequency_start: 150.0,
                frequency_end: 800.0,
                duration: 0.2,
                attack: 0.01,
                decay: 0.15,
                sustain: 0.0,
                release: 0.05,
                volume: 0.5,
                filter_type: FilterType::Lowpass,
                filter_freq: 2000.0,
                q_factor: 1.0,
                ..ParameterSet::default()
            },
        ),
        Preset::new(
            "preset-explosion-heavy",
            "Heavy Explosion",
            "Deep, noisy explosion",
            ParameterSet {
                waveform: Waveform::Noise,
                frequency_start: 100.0,
                frequency_end: 40.0,
                duration: 1.2,
                attack: 0.02,
                decay: 0.8,
                sustain: 0.1,
                release: 0.4,
                volume: 0.8,
                filter_type: FilterType::Lowpass,
                filter_freq: 350.0,
                q_factor: 4.0,
                distortion: 0.8,
                reverb: 0.4,
                ..ParameterSet::default()
            },
        ),
        Preset::new(
            "preset-cyber-echo",
            "Cyber Echo",
            "Glitchy tech notification",
            ParameterSet {
                waveform: Waveform::Triangle,
                frequency_start: 2000.0,
                frequency_end: 1500.0,
                duration: 0.1,
                attack: 0.0,
                decay: 0.05,
                sustain: 0.1,
                release: 0.1,
                volume: 0.5,
                filter_type: FilterType::Highpass,
                filter_freq: 1200.0,
                q_factor: 2.0,
                distortion: 0.4,
                delay_time: 0.25,
                delay_feedback: 0.5,
                reverb: 0.2,
                ..ParameterSet::default()
            },
        ),
        Preset::new(
            "preset-cave-drip",
            "Cave Drip",
            "Atmospheric droplet with reverb",
            ParameterSet {
                waveform: Waveform::Sine,
                frequency_start: 1200.0,
                frequency_end: 1000.0,
                duration: 0.05,
                attack: 0.005,
                decay: 0.03,
                sustain: 0.0,
                release: 0.02,
                volume: 0.4,
                filter_type: FilterType::Lowpass,
                filter_freq: 3000.0,
                q_factor: 1.0,
                reverb: 0.9,
                ..ParameterSet::default()
            },
        ),
    ]
}

/// Look up a preset by id.
pub fn find(id: &str) -> Option<Preset> {
    all().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::renderer::{RenderConfig, render};

    #[test]
    fn ids_are_unique() {
        let presets = all();
        assert_eq!(presets.len(), 5);
        for (i, a) in presets.iter().enumerate() {
            for b in &presets[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn find_by_id() {
        let laser = find("preset-laser-classic").unwrap();
        assert_eq!(laser.name, "Classic Laser");
        assert_eq!(laser.params.waveform, Waveform::Sawtooth);
        assert!(find("preset-missing").is_none());
    }

    #[test]
    fn presets_are_already_in_range() {
        for preset in all() {
            let mut expected = preset.params.clone();
            expected.harmonics = expected.harmonic_amplitudes().to_vec();
            assert_eq!(preset.params.clamped(), expected, "{} needed clamping", preset.id);
        }
    }

    #[test]
    fn serializes_with_camel_case_params() {
        let json = serde_json::to_string(&find("preset-cyber-echo").unwrap()).unwrap();
        assert!(json.contains("\"id\":\"preset-cyber-echo\""));
        assert!(json.contains("\"filterType\":\"highpass\""));
        assert!(json.contains("\"delayTime\":0.25"));

        let back: Preset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, find("preset-cyber-echo").unwrap());
    }

    #[test]
    fn every_preset_renders() {
        for preset in all() {
            let buf = render(&preset.params, &RenderConfig::with_sample_rate(8000).seeded(3))
                .unwrap_or_else(|e| panic!("{} failed: {e}", preset.id));
            assert!(buf.peak() > 0.0, "{} is silent", preset.id);
        }
    }
}
