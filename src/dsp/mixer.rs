//! Mixer — the master bus. Dry and wet paths sum here, then the master
//! gain curve is applied.

use super::automation::Automation;

/// A summing bus that accumulates audio from every path.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    buffer: Vec<f64>,
}

impl Mixer {
    /// A silent bus of `num_samples` frames.
    pub fn new(num_samples: usize) -> Self {
        Mixer {
            buffer: vec![0.0; num_samples],
        }
    }

    /// Add a whole path, frame by frame. Frames past the bus end are dropped.
    pub fn add_block(&mut self, samples: &[f64]) {
        for (out, &s) in self.buffer.iter_mut().zip(samples) {
            *out += s;
        }
    }

    /// Raw bus, for sends that accumulate in place.
    pub fn bus_mut(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

    /// The summed bus shaped by `gain`, clamped to [-1, 1].
    pub fn output(&self, gain: &Automation, sample_rate: f64) -> Vec<f64> {
        self.buffer
            .iter()
            .enumerate()
            .map(|(i, &s)| (s * gain.value_at(i as f64 / sample_rate)).clamp(-1.0, 1.0))
            .collect()
    }
}
