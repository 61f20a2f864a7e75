//! Parameter automation — breakpoint timelines for frequency, cutoff and gain.
//!
//! A timeline is a list of breakpoints sorted by time. Each breakpoint says
//! how the value travels *into* it from the previous one: a step (jump at
//! the breakpoint), a linear ramp, or an exponential ramp. Before the first
//! breakpoint the timeline holds its default value; after the last it holds
//! the last value.

/// How the value approaches a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Step,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Breakpoint {
    time: f64,
    value: f64,
    curve: Curve,
}

/// A time-varying parameter value.
#[derive(Debug, Clone)]
pub struct Automation {
    default_value: f64,
    points: Vec<Breakpoint>,
}

impl Automation {
    pub fn new(default_value: f64) -> Self {
        Automation {
            default_value,
            points: Vec::new(),
        }
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint { time, value, curve: Curve::Step })
    }

    /// Ramp linearly from the previous breakpoint, reaching `value` at `time`.
    pub fn linear_ramp_to(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint { time, value, curve: Curve::Linear })
    }

    /// Ramp exponentially from the previous breakpoint, reaching `value` at `time`.
    ///
    /// Both endpoints must be non-zero and share a sign; otherwise the
    /// segment holds the previous value until `time`. Callers clamp
    /// frequencies to a positive epsilon before calling this.
    pub fn exponential_ramp_to(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint { time, value, curve: Curve::Exponential })
    }

    /// Breakpoints at equal times keep their insertion order.
    fn insert(&mut self, point: Breakpoint) -> &mut Self {
        let time = point.time.max(0.0);
        let idx = self.points.partition_point(|p| p.time <= time);
        self.points.insert(idx, Breakpoint { time, ..point });
        self
    }

    /// Value of the parameter at `t` seconds.
    pub fn value_at(&self, t: f64) -> f64 {
        let next = self.points.partition_point(|p| p.time <= t);
        let (t0, v0) = match next.checked_sub(1) {
            Some(i) => (self.points[i].time, self.points[i].value),
            None => (0.0, self.default_value),
        };

        let Some(target) = self.points.get(next) else {
            return v0;
        };
        let span = target.time - t0;
        if span <= 0.0 {
            return v0;
        }
        let frac = ((t - t0) / span).clamp(0.0, 1.0);

        match target.curve {
            Curve::Step => v0,
            Curve::Linear => v0 + (target.value - v0) * frac,
            Curve::Exponential => {
                let v1 = target.value;
                if v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
                    v0
                } else {
                    v0 * (v1 / v0).powf(frac)
                }
            }
        }
    }

    /// True when the value never changes.
    pub fn is_constant(&self) -> bool {
        self.points.iter().all(|p| p.value == self.default_value)
    }

    /// Sample the timeline once per frame.
    pub fn render(&self, sample_rate: f64, num_samples: usize) -> Vec<f64> {
        (0..num_samples)
            .map(|i| self.value_at(i as f64 / sample_rate))
            .collect()
    }
}
