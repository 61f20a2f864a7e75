//! Feedback delay — a bounded circular buffer with write-back.
//!
//! The delay's output is fed back into its own input; that loop is the only
//! cycle in the signal topology. It lives entirely inside this buffer: each
//! step reads the delayed sample, then writes `input + delayed * feedback`.

/// Feedback is capped here so the loop always loses energy.
pub const MAX_FEEDBACK: f64 = 0.9;

/// Fixed gain applied to the delay's output before it joins the master bus.
pub const WET_GAIN: f64 = 0.3;

/// Longest supported delay time, in seconds.
pub const MAX_DELAY_SECONDS: f64 = 1.0;

/// A mono feedback delay line that outputs only the wet signal.
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    buffer: Vec<f64>,
    write_pos: usize,
    delay_samples: usize,

    /// Feedback amount, already capped at [`MAX_FEEDBACK`].
    pub feedback: f64,
    /// Output gain of the wet signal.
    pub wet: f64,
}

impl FeedbackDelay {
    /// Create a delay of `delay_time` seconds.
    pub fn new(sample_rate: f64, delay_time: f64, feedback: f64) -> Self {
        let delay_time = delay_time.clamp(0.0, MAX_DELAY_SECONDS);
        let delay_samples = ((delay_time * sample_rate).round() as usize).max(1);
        Self {
            buffer: vec![0.0; delay_samples],
            write_pos: 0,
            delay_samples,
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
            wet: WET_GAIN,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Push one input sample, returning the wet output.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        // The buffer is exactly one delay long, so the oldest sample sits
        // at the write position.
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed * self.wet
    }

    /// Add the wet output for `input` into `bus`.
    pub fn accumulate(&mut self, input: &[f64], bus: &mut [f64]) {
        for (out, &x) in bus.iter_mut().zip(input) {
            *out += self.process(x);
        }
    }
}
