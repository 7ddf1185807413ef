/// Single-pole IIR low-pass filter (exponential moving average).
///
/// The first finite sample seeds the output. Non-finite samples are ignored
/// and the previous output is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPass {
    alpha:       f64,
    y:           f64,
    initialized: bool,
}

impl LowPass {
    /// Creates a filter with smoothing factor `alpha`, clamped to `[0, 1]`.
    ///
    /// `alpha = 1` passes the input through.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha:       alpha.clamp(0.0, 1.0),
            y:           0.0,
            initialized: false,
        }
    }

    /// A filter with time constant `tau` sampled every `dt` seconds.
    pub fn from_time_constant(tau: f64, dt: f64) -> Self {
        if tau <= 0.0 {
            return Self::new(1.0);
        }
        Self::new(1.0 - (-dt / tau).exp())
    }

    /// Feeds one sample and returns the new output.
    pub fn push(&mut self, x: f64) -> f64 {
        if !x.is_finite() {
            return self.y;
        }
        if !self.initialized {
            self.y = x;
            self.initialized = true;
            return self.y;
        }
        self.y = self.alpha * x + (1.0 - self.alpha) * self.y;
        self.y
    }
}
