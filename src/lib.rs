pub mod dsp;
pub mod error;
pub mod midi;
pub mod params;
pub mod preset;

pub use crate::dsp::renderer::{RenderConfig, RenderedBuffer, render, render_with_rng};
pub use crate::error::SfxError;
pub use crate::params::{FilterType, ParameterSet, Waveform};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the sfxsynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Parse a JSON ParameterSet and render it at `sample_rate`.
pub fn render_json(params_json: &str, sample_rate: u32) -> error::Result<RenderedBuffer> {
    let params = ParameterSet::from_json(params_json)?;
    render(&params, &RenderConfig::with_sample_rate(sample_rate))
}

/// Parse a JSON ParameterSet and encode it as a MIDI file.
pub fn encode_midi_json(params_json: &str) -> error::Result<Vec<u8>> {
    let params = ParameterSet::from_json(params_json)?;
    Ok(midi::encode(&params))
}

/// WASM-exposed: render a JSON ParameterSet to mono f32 samples.
/// Returns the raw audio buffer for playback through an AudioBuffer.
#[wasm_bindgen]
pub fn render_sound_samples(params_json: &str, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let buffer =
        render_json(params_json, sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(buffer.samples)
}

/// WASM-exposed: render a JSON ParameterSet to a 16-bit mono WAV byte array.
#[wasm_bindgen]
pub fn render_sound_wav(params_json: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    render_json(params_json, sample_rate)
        .and_then(|buffer| buffer.to_wav_bytes())
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: encode a JSON ParameterSet as a Standard MIDI File.
#[wasm_bindgen]
pub fn encode_sound_midi(params_json: &str) -> Result<Vec<u8>, JsValue> {
    encode_midi_json(params_json).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: the factory presets as an array of `{ id, name, description, params }`.
#[wasm_bindgen]
pub fn list_presets() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&preset::all()).map_err(|e| JsValue::from_str(&format!("{e}")))
}
