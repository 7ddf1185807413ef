use super::{
    pid::Pid,
    profile::{Constraints, State, TrapezoidProfile},
};

/// A PID controller that tracks a trapezoidal profile.
///
/// Instead of handing the PID the goal directly, every period advances an
/// internal setpoint one step along the profile and feeds the PID that
/// setpoint. Big target jumps then turn into smooth, limited moves.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledPid {
    pid:      Pid,
    profile:  TrapezoidProfile,
    goal:     State,
    setpoint: State,
}

impl ProfiledPid {
    pub fn new(kp: f64, ki: f64, kd: f64, constraints: Constraints) -> Self {
        Self {
            pid:      Pid::new(kp, ki, kd),
            profile:  TrapezoidProfile::new(constraints),
            goal:     State::default(),
            setpoint: State::default(),
        }
    }

    /// Caps the output magnitude to `limit`.
    pub fn with_output_limit(mut self, limit: f64) -> Self {
        self.pid = self.pid.with_output_limit(limit);
        self
    }

    /// Replaces the PID gains.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) { self.pid.set_gains(kp, ki, kd); }

    pub fn gains(&self) -> (f64, f64, f64) { self.pid.gains() }

    /// Replaces the velocity and acceleration bounds of the profile.
    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.profile = TrapezoidProfile::new(constraints);
    }

    pub fn constraints(&self) -> Constraints { self.profile.constraints }

    /// Position tolerance for [`at_goal`](ProfiledPid::at_goal).
    pub fn set_tolerance(&mut self, position: f64) { self.pid.set_tolerance(position, f64::INFINITY); }

    /// Sets a goal to arrive at with zero velocity.
    pub fn set_goal(&mut self, position: f64) { self.goal = State::new(position, 0.0); }

    /// The profile state the PID is currently chasing.
    pub fn setpoint(&self) -> State { self.setpoint }

    /// Error between the profile setpoint and the last measurement.
    pub fn position_error(&self) -> f64 { self.pid.error() }

    /// Advances the profile by `dt` and returns the PID output for it.
    pub fn calculate(&mut self, measurement: f64, dt: f64) -> f64 {
        self.setpoint = self.profile.calculate(dt, self.setpoint, self.goal);
        self.pid.calculate(measurement, self.setpoint.position, dt)
    }

    /// The measurement is within tolerance of the current profile setpoint.
    pub fn at_setpoint(&self) -> bool { self.pid.at_setpoint() }

    /// The profile has finished and the measurement is within tolerance of
    /// the goal.
    pub fn at_goal(&self) -> bool { self.at_setpoint() && self.goal == self.setpoint }

    /// Restarts the profile from a measured position at rest.
    pub fn reset(&mut self, measured_position: f64) {
        self.pid.reset();
        self.setpoint = State::new(measured_position, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_output_is_gentle() {
        let mut ppid = ProfiledPid::new(10.0, 0.0, 0.0, Constraints::new(1.0, 1.0));
        ppid.reset(0.0);
        ppid.set_goal(1.0);
        let u = ppid.calculate(0.0, 0.02);
        // one step of the profile moves 0.0002, so the output is tiny
        assert!(u > 0.0 && u < 0.01);
    }

    #[test]
    fn at_goal_waits_for_profile() {
        let mut ppid = ProfiledPid::new(10.0, 0.0, 0.0, Constraints::new(1.0, 1.0));
        ppid.set_tolerance(0.05);
        ppid.reset(0.0);
        ppid.set_goal(1.0);
        // a perfect tracker is always at the setpoint, but not at the goal yet
        ppid.calculate(0.0, 0.02);
        let tracked = ppid.setpoint().position;
        ppid.calculate(tracked, 0.02);
        assert!(ppid.at_setpoint());
        assert!(!ppid.at_goal());

        for _ in 0..200 {
            let tracked = ppid.setpoint().position;
            ppid.calculate(tracked, 0.02);
        }
        assert!(ppid.at_goal());
        assert_eq!(ppid.setpoint(), State::new(1.0, 0.0));
    }

    #[test]
    fn reset_moves_setpoint_to_measurement() {
        let mut ppid = ProfiledPid::new(1.0, 0.0, 0.0, Constraints::new(1.0, 1.0));
        ppid.set_goal(1.0);
        ppid.reset(0.7);
        assert_eq!(ppid.setpoint(), State::new(0.7, 0.0));
        assert!(!ppid.at_goal());
    }
}
