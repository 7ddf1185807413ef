use super::abscap;

/// A discrete PID controller.
///
/// The controller is stateless with respect to time: the caller passes the
/// period on every [`calculate`](Pid::calculate). The integral term is capped
/// so that `ki * integral` never exceeds the output limit on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    kp:                 f64,
    ki:                 f64,
    kd:                 f64,
    output_limit:       f64,
    tolerance:          f64,
    velocity_tolerance: f64,
    error:              f64,
    velocity_error:     f64,
    integral:           f64,
    has_measurement:    bool,
}

impl Pid {
    /// Creates a controller with an unlimited output and a 0.05 tolerance.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            output_limit: f64::INFINITY,
            tolerance: 0.05,
            velocity_tolerance: f64::INFINITY,
            error: 0.0,
            velocity_error: 0.0,
            integral: 0.0,
            has_measurement: false,
        }
    }

    /// Caps the output magnitude to `limit`.
    pub fn with_output_limit(mut self, limit: f64) -> Self {
        self.output_limit = limit.abs();
        self
    }

    /// Replaces the gains. Accumulated state is kept.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// The current `(kp, ki, kd)`.
    pub fn gains(&self) -> (f64, f64, f64) { (self.kp, self.ki, self.kd) }

    /// Sets the band [`at_setpoint`](Pid::at_setpoint) accepts.
    ///
    /// Pass `f64::INFINITY` as `velocity` to only check position.
    pub fn set_tolerance(&mut self, position: f64, velocity: f64) {
        self.tolerance = position.abs();
        self.velocity_tolerance = velocity.abs();
    }

    /// Error from the last [`calculate`](Pid::calculate).
    pub fn error(&self) -> f64 { self.error }

    /// Runs one period and returns the capped output.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64, dt: f64) -> f64 {
        let perror = self.error;
        self.error = setpoint - measurement;

        // no derivative kick on the first sample
        self.velocity_error = if self.has_measurement && dt > 0.0 {
            (self.error - perror) / dt
        } else {
            0.0
        };
        self.has_measurement = true;

        if self.ki != 0.0 {
            self.integral += self.error * dt;
            let i_max = self.output_limit / self.ki.abs();
            self.integral = self.integral.clamp(-i_max, i_max);
        }

        let u = self.kp * self.error + self.ki * self.integral + self.kd * self.velocity_error;
        abscap(u, self.output_limit)
    }

    /// Whether the last measurement was inside both tolerance bands.
    pub fn at_setpoint(&self) -> bool {
        self.has_measurement
            && self.error.abs() < self.tolerance
            && self.velocity_error.abs() < self.velocity_tolerance
    }

    /// Clears the integral and the derivative history.
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.velocity_error = 0.0;
        self.integral = 0.0;
        self.has_measurement = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        assert_eq!(pid.calculate(1.0, 4.0, 0.02), 6.0);
        assert_eq!(pid.error(), 3.0);
    }

    #[test]
    fn first_sample_has_no_derivative() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        assert_eq!(pid.calculate(0.0, 10.0, 0.02), 0.0);
        // error falls from 10 to 9 over 20 ms
        let out = pid.calculate(1.0, 10.0, 0.02);
        assert!((out - -50.0).abs() < 1e-9);
    }

    #[test]
    fn output_is_capped() {
        let mut pid = Pid::new(100.0, 0.0, 0.0).with_output_limit(12.0);
        assert_eq!(pid.calculate(0.0, 1.0, 0.02), 12.0);
        assert_eq!(pid.calculate(0.0, -1.0, 0.02), -12.0);
    }

    #[test]
    fn integral_winds_up_to_limit_only() {
        let mut pid = Pid::new(0.0, 1.0, 0.0).with_output_limit(12.0);
        let mut out = 0.0;
        for _ in 0..10_000 {
            out = pid.calculate(0.0, 5.0, 0.02);
        }
        assert_eq!(out, 12.0);
        // unwinding starts right away instead of after the surplus drains
        let out = pid.calculate(0.0, -5.0, 0.02);
        assert!(out < 12.0);
    }

    #[test]
    fn at_setpoint_checks_both_bands() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        pid.set_tolerance(0.1, 1.0);
        assert!(!pid.at_setpoint());
        pid.calculate(0.95, 1.0, 0.02);
        assert!(pid.at_setpoint());
        // error jumps by 0.05 in 20 ms, 2.5/s
        pid.calculate(1.0, 1.0, 0.02);
        assert!(!pid.at_setpoint());
    }

    #[test]
    fn reset_forgets_history() {
        let mut pid = Pid::new(0.0, 1.0, 1.0);
        pid.calculate(0.0, 1.0, 0.02);
        pid.calculate(0.5, 1.0, 0.02);
        pid.reset();
        assert!(!pid.at_setpoint());
        assert_eq!(pid.calculate(0.0, 0.0, 0.02), 0.0);
    }
}
