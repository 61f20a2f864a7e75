//! DSP — offline synthesis and processing for one-shot sound effects.
//!
//! Everything renders in a single pass into owned buffers, so identical
//! parameters and seed give identical output on every platform.

pub mod automation;
pub mod delay;
pub mod distortion;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod modulation;
pub mod oscillator;
pub mod pipeline;
pub mod renderer;
pub mod reverb;
pub mod source;
