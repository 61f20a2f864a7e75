//! MIDI export — encodes a ParameterSet as a single-track Standard MIDI File.
//!
//! The file carries one note (the start pitch), a CC 74 cutoff value, and ten
//! pitch-bend events tracing the frequency sweep over the sound's duration.

use log::debug;

use crate::params::{MIN_FREQUENCY, ParameterSet};

pub const TICKS_PER_BEAT: u16 = 480;
pub const TEMPO_BPM: f64 = 120.0;

/// Pitch-bend events emitted across the duration.
pub const BEND_STEPS: u32 = 10;

/// Semitones covered by a full pitch-bend deflection.
pub const BEND_RANGE_SEMITONES: f64 = 2.0;

/// Cutoff frequency that maps to controller value 127.
pub const CUTOFF_REFERENCE_HZ: f64 = 10_000.0;

const VELOCITY: u8 = 0x64;
const BEND_MAX: u32 = 16_383;

// ── Status bytes (channel 0) ────────────────────────────────

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PITCH_BEND: u8 = 0xE0;
const CC_CUTOFF: u8 = 0x4A;

// ── Conversions ─────────────────────────────────────────────

/// Fractional MIDI note for a frequency (A4 = 440 Hz = 69).
pub fn frequency_to_note(frequency: f64) -> f64 {
    69.0 + 12.0 * (frequency.max(MIN_FREQUENCY) / 440.0).log2()
}

/// Nearest playable note number.
pub fn nearest_note(frequency: f64) -> u8 {
    frequency_to_note(frequency).round().clamp(0.0, 127.0) as u8
}

/// 14-bit bend value for an offset in semitones, centered at 8191.
pub fn pitch_bend_value(semitones: f64) -> u16 {
    let normalized = (semitones / BEND_RANGE_SEMITONES).clamp(-1.0, 1.0);
    let bend = ((normalized + 1.0) * 8191.5).floor();
    (bend.max(0.0) as u32).min(BEND_MAX) as u16
}

/// CC 74 value for a cutoff frequency.
pub fn cutoff_controller_value(filter_freq: f64) -> u8 {
    (filter_freq / CUTOFF_REFERENCE_HZ * 127.0)
        .clamp(0.0, 127.0)
        .floor() as u8
}

/// Variable-length quantity: 7 bits per byte, most significant first,
/// continuation bit on every byte but the last.
pub fn encode_variable_length(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    while value > 0x7F {
        value >>= 7;
        bytes.push(((value & 0x7F) as u8) | 0x80);
    }
    bytes.reverse();
    bytes
}

fn seconds_to_ticks(seconds: f64) -> u32 {
    (seconds * (TEMPO_BPM / 60.0) * TICKS_PER_BEAT as f64).floor() as u32
}

// ── Encoder ─────────────────────────────────────────────────

/// Encode `params` as a format-0 MIDI file.
///
/// Out-of-range parameters are clamped first, so any ParameterSet produces
/// a well-formed file.
pub fn encode(params: &ParameterSet) -> Vec<u8> {
    let params = params.clamped();
    let note = nearest_note(params.frequency_start);
    let start_note = frequency_to_note(params.frequency_start).round();

    let mut track = Vec::new();

    track.extend([0x00, NOTE_ON, note, VELOCITY]);
    track.extend([
        0x00,
        CONTROL_CHANGE,
        CC_CUTOFF,
        cutoff_controller_value(params.filter_freq),
    ]);

    let step_ticks = seconds_to_ticks(params.duration) / BEND_STEPS;
    for i in 1..=BEND_STEPS {
        let progress = i as f64 / BEND_STEPS as f64;
        let frequency =
            params.frequency_start + (params.frequency_end - params.frequency_start) * progress;
        let bend = pitch_bend_value(frequency_to_note(frequency) - start_note);

        track.extend(encode_variable_length(step_ticks));
        track.extend([PITCH_BEND, (bend & 0x7F) as u8, ((bend >> 7) & 0x7F) as u8]);
    }

    track.extend([0x00, NOTE_OFF, note, 0x00]);
    track.extend([0x00, 0xFF, 0x2F, 0x00]);

    let mut file = Vec::with_capacity(22 + track.len());
    file.extend_from_slice(b"MThd");
    file.extend(6u32.to_be_bytes());
    file.extend(0u16.to_be_bytes()); // format 0
    file.extend(1u16.to_be_bytes()); // one track
    file.extend(TICKS_PER_BEAT.to_be_bytes());

    file.extend_from_slice(b"MTrk");
    file.extend((track.len() as u32).to_be_bytes());
    file.extend(track);

    debug!("midi: note {note}, {step_ticks} ticks per bend step, {} bytes", file.len());
    file
}
