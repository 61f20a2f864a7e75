//! Effects pipeline — an ordered list of tagged stages over one buffer.
//!
//! Insert stages (filter, distortion) rewrite the signal in place. Send
//! stages (delay, reverb) read the post-insert signal and add their wet
//! output to the master bus next to the dry copy, so every send hears the
//! same input regardless of how many sends run before it.

use log::debug;
use rand::Rng;

use super::delay::FeedbackDelay;
use super::distortion::WaveShaper;
use super::filter::BiquadFilter;
use super::mixer::Mixer;
use super::modulation::{CutoffModulation, clamp_cutoff};
use super::reverb::ConvolutionReverb;
use crate::params::ParameterSet;

/// Stage tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Filter,
    Distortion,
    Delay,
    Reverb,
}

/// Where a stage's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Routing {
    /// Replaces the signal.
    Insert,
    /// Adds a wet copy to the master bus.
    Send,
}

#[derive(Debug, Clone)]
pub enum Stage {
    Filter {
        filter: BiquadFilter,
        cutoff: CutoffModulation,
    },
    Distortion(WaveShaper),
    Delay(FeedbackDelay),
    Reverb(ConvolutionReverb),
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Filter { .. } => StageKind::Filter,
            Stage::Distortion(_) => StageKind::Distortion,
            Stage::Delay(_) => StageKind::Delay,
            Stage::Reverb(_) => StageKind::Reverb,
        }
    }

    pub fn routing(&self) -> Routing {
        match self {
            Stage::Filter { .. } | Stage::Distortion(_) => Routing::Insert,
            Stage::Delay(_) | Stage::Reverb(_) => Routing::Send,
        }
    }

    fn process_in_place(&mut self, signal: &mut [f64]) {
        match self {
            Stage::Filter { filter, cutoff } => {
                if cutoff.is_static() {
                    filter.process_block(signal);
                } else {
                    let freqs = cutoff.render(signal.len());
                    filter.process_block_modulated(signal, &freqs);
                }
            }
            Stage::Distortion(shaper) => shaper.process_block(signal),
            Stage::Delay(_) | Stage::Reverb(_) => {}
        }
    }

    fn accumulate(&mut self, input: &[f64], bus: &mut [f64]) {
        match self {
            Stage::Delay(delay) => delay.accumulate(input, bus),
            Stage::Reverb(reverb) => reverb.accumulate(input, bus),
            Stage::Filter { .. } | Stage::Distortion(_) => {}
        }
    }
}

/// The enabled stages for one render, inserts ahead of sends.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(mut stages: Vec<Stage>) -> Self {
        // Stable: relative order within each routing class is kept.
        stages.sort_by_key(Stage::routing);
        Pipeline { stages }
    }

    /// Build the stages `params` enables. The filter is always present.
    ///
    /// `rng` is drawn from only when reverb is enabled.
    pub fn from_params<R: Rng>(params: &ParameterSet, sample_rate: f64, rng: &mut R) -> Self {
        let mut stages = vec![Stage::Filter {
            filter: BiquadFilter::with_params(
                params.filter_type,
                clamp_cutoff(params.filter_freq, sample_rate),
                params.q_factor,
                sample_rate,
            ),
            cutoff: CutoffModulation::from_params(params, sample_rate),
        }];
        if params.distortion > 0.0 {
            stages.push(Stage::Distortion(WaveShaper::new(params.distortion, sample_rate)));
        }
        if params.delay_time > 0.0 {
            stages.push(Stage::Delay(FeedbackDelay::new(
                sample_rate,
                params.delay_time,
                params.delay_feedback,
            )));
        }
        if params.reverb > 0.0 {
            stages.push(Stage::Reverb(ConvolutionReverb::new(
                sample_rate,
                params.reverb,
                rng,
            )));
        }

        let pipeline = Pipeline::new(stages);
        debug!("pipeline stages: {:?}", pipeline.kinds());
        pipeline
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Run every stage and return the master bus (before the gain envelope).
    pub fn process(&mut self, mut signal: Vec<f64>) -> Mixer {
        let mut mixer = Mixer::new(signal.len());
        let mut dry_added = false;

        for stage in &mut self.stages {
            match stage.routing() {
                Routing::Insert => stage.process_in_place(&mut signal),
                Routing::Send => {
                    if !dry_added {
                        mixer.add_block(&signal);
                        dry_added = true;
                    }
                    stage.accumulate(&signal, mixer.bus_mut());
                }
            }
        }
        if !dry_added {
            mixer.add_block(&signal);
        }
        mixer
    }
}
