//! Offline renderer — turns a ParameterSet into one mono buffer.
//!
//! Graph: source → filter → [distortion] → dry + [delay send] + [reverb send]
//! → master gain (ADSR) → clamp. Every call builds its own graph and buffer.

use std::io::{Cursor, Seek, Write};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::envelope::Envelope;
use super::pipeline::Pipeline;
use super::source;
use crate::error::{Result, SfxError};
use crate::params::ParameterSet;

/// Shortest buffer ever rendered, in seconds.
pub const MIN_RENDER_SECONDS: f64 = 0.1;

/// Delay tail is this many delay periods long.
pub const DELAY_TAIL_PERIODS: f64 = 5.0;

/// Fixed tail reserved for reverb, in seconds.
pub const REVERB_TAIL_SECONDS: f64 = 2.0;

pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Render settings that are not part of the sound itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    /// Seed for noise and reverb impulses. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: 44_100,
            seed: None,
        }
    }
}

impl RenderConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        RenderConfig {
            sample_rate,
            ..RenderConfig::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(SfxError::Render(format!(
                "sample rate {} outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Sample encoding for WAV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    Pcm16,
    Float32,
}

/// A rendered mono sound, samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl RenderedBuffer {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    /// Write a mono WAV stream.
    pub fn write_wav<W: Write + Seek>(&self, writer: W, format: WavFormat) -> Result<()> {
        let (bits_per_sample, sample_format) = match format {
            WavFormat::Pcm16 => (16, hound::SampleFormat::Int),
            WavFormat::Float32 => (32, hound::SampleFormat::Float),
        };
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample,
            sample_format,
        };
        let mut wav = hound::WavWriter::new(writer, spec)?;
        for &s in &self.samples {
            match format {
                WavFormat::Pcm16 => wav.write_sample(to_pcm16(s))?,
                WavFormat::Float32 => wav.write_sample(s)?,
            }
        }
        wav.finalize()?;
        Ok(())
    }

    /// 16-bit PCM WAV file as bytes.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        self.encode(WavFormat::Pcm16)
    }

    /// 32-bit float WAV file as bytes.
    pub fn to_wav_f32_bytes(&self) -> Result<Vec<u8>> {
        self.encode(WavFormat::Float32)
    }

    fn encode(&self, format: WavFormat) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_wav(&mut cursor, format)?;
        Ok(cursor.into_inner())
    }
}

fn to_pcm16(s: f32) -> i16 {
    (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Total render length in seconds: sound + release + effect tails.
///
/// Never shorter than [`MIN_RENDER_SECONDS`]. For very short sounds this
/// floor wins, so the buffer is longer than `duration + release + tails`
/// (e.g. 0.03 s of sound at 44.1 kHz still renders 4410 frames).
pub fn total_length(params: &ParameterSet) -> f64 {
    let delay_tail = if params.delay_time > 0.0 {
        params.delay_time * DELAY_TAIL_PERIODS
    } else {
        0.0
    };
    let reverb_tail = if params.reverb > 0.0 {
        REVERB_TAIL_SECONDS
    } else {
        0.0
    };
    (params.duration + params.release + delay_tail + reverb_tail).max(MIN_RENDER_SECONDS)
}

/// Number of frames rendered for `params` at `sample_rate`.
pub fn frame_count(params: &ParameterSet, sample_rate: u32) -> usize {
    (total_length(params) * sample_rate as f64).ceil() as usize
}

/// Render `params`, seeding randomness from `config.seed`.
pub fn render(params: &ParameterSet, config: &RenderConfig) -> Result<RenderedBuffer> {
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    render_with_rng(params, config, &mut rng)
}

/// Render `params` drawing noise and impulse samples from `rng`.
///
/// Out-of-range parameters are clamped first. Fails on an unsupported sample
/// rate or if the graph produces a non-finite sample.
pub fn render_with_rng<R: Rng>(
    params: &ParameterSet,
    config: &RenderConfig,
    rng: &mut R,
) -> Result<RenderedBuffer> {
    config.validate()?;
    let params = params.clamped();
    let sample_rate = config.sample_rate as f64;
    let frames = frame_count(&params, config.sample_rate);
    debug!(
        "render {:?} at {} Hz: {:.3} s, {frames} frames",
        params.waveform,
        config.sample_rate,
        total_length(&params)
    );

    let signal = source::generate(&params, sample_rate, frames, rng);
    let mut pipeline = Pipeline::from_params(&params, sample_rate, rng);
    let bus = pipeline.process(signal);

    let gain = Envelope::from_params(&params).gain_automation(params.volume);
    let output = bus.output(&gain, sample_rate);

    if let Some(i) = output.iter().position(|s| !s.is_finite()) {
        return Err(SfxError::Render(format!("non-finite sample at frame {i}")));
    }
    Ok(RenderedBuffer {
        samples: output.into_iter().map(|s| s as f32).collect(),
        sample_rate: config.sample_rate,
    })
}
