use serde::Serialize;

/// The steady-state DC motor model `V = ks·sgn(v) + kv·v`.
///
/// Units follow whatever the gains were characterized in. The shooter uses
/// volts per RPM, the indexer volts per rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SimpleMotorFeedforward {
    /// Voltage to overcome static friction.
    pub ks: f64,
    /// Voltage per unit of velocity.
    pub kv: f64,
}

impl SimpleMotorFeedforward {
    pub const fn new(ks: f64, kv: f64) -> Self { Self { ks, kv } }

    /// Voltage to hold `velocity` steadily.
    pub fn calculate(&self, velocity: f64) -> f64 { self.ks * sign(velocity) + self.kv * velocity }
}

/// Like `f64::signum`, but zero maps to zero.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
