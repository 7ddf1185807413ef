use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    constants::{LOOP_PERIOD_SECS, MAX_VOLTAGE, arm},
    error::{InvalidTargetSnafu, Result},
    motion::{profile::Constraints, profiled::ProfiledPid},
    peripherals::{ArmInputs, ArmIo, PerMotor, mean},
    tunable::{ConsumerId, TunableNumber, TunableStore, changed_any},
};

/// Where the arm is in its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArmState {
    /// No target was ever set; the motors are not driven.
    Idle,
    /// Moving towards the target.
    Seeking,
    /// Within tolerance of the target with the profile finished.
    AtGoal,
}

/// Forces `output` to zero where it would drive the arm past a soft limit.
///
/// At or above the upper limit the arm may only go down, at or below the
/// lower limit it may only go up.
pub fn soft_limit(angle_deg: f64, output: f64) -> f64 {
    if (angle_deg >= arm::SOFT_LIMIT_UPPER_DEG && output > 0.0)
        || (angle_deg <= arm::SOFT_LIMIT_LOWER_DEG && output < 0.0)
    {
        0.0
    } else {
        output
    }
}

struct ArmTunables {
    kp:                 TunableNumber,
    ki:                 TunableNumber,
    kd:                 TunableNumber,
    max_velocity:       TunableNumber,
    max_acceleration:   TunableNumber,
    position_tolerance: TunableNumber,
}

impl ArmTunables {
    fn register(store: &TunableStore) -> Self {
        Self {
            kp:                 store.number("Arm/Kp").with_default(arm::KP),
            ki:                 store.number("Arm/Ki").with_default(arm::KI),
            kd:                 store.number("Arm/Kd").with_default(arm::KD),
            max_velocity:       store.number("Arm/MaxVelocityRad").with_default(arm::MAX_VELOCITY_RAD),
            max_acceleration:   store
                .number("Arm/MaxAccelerationRad")
                .with_default(arm::MAX_ACCELERATION_RAD),
            position_tolerance: store
                .number("Arm/PositionToleranceDeg")
                .with_default(arm::POSITION_TOLERANCE_DEG),
        }
    }

    fn apply(&self, controller: &mut ProfiledPid) {
        controller.set_gains(self.kp.get(), self.ki.get(), self.kd.get());
        controller.set_constraints(Constraints::new(
            self.max_velocity.get(),
            self.max_acceleration.get(),
        ));
        controller.set_tolerance(self.position_tolerance.get().to_radians());
    }
}

/// Diagnostics of one arm period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmTelemetry {
    pub state:               ArmState,
    /// Measured angle, degrees above horizontal.
    pub angle_deg:           f64,
    /// Goal of the current move.
    pub target_angle_deg:    f64,
    /// Where the profile wants the arm this period.
    pub setpoint_deg:        f64,
    /// Profile setpoint minus measured angle.
    pub position_error_deg:  f64,
    /// Shoulder motor acceleration, rad/s².
    pub acceleration:        f64,
    /// PID output before the soft limit and the mirror.
    pub voltage_command_pid: f64,
    /// Voltage sent to the motors.
    pub voltage_command:     f64,
    pub current_amps:        PerMotor,
    /// Latched goal-reached flag.
    pub reached_goal:        bool,
    /// Live goal check.
    pub at_goal:             bool,
}

/// Profiled position control of the shoulder.
///
/// Every period the controller advances a trapezoidal profile towards the
/// held goal and runs a PID on the measured angle against it. The output is
/// cut at the soft limits and negated, since the shoulder motors are mounted
/// mirrored.
///
/// # Example
///
/// ```
/// use talos::{
///     mechanism::arm::Arm,
///     peripherals::sim::ArmIoSim,
///     tunable::TunableStore,
/// };
///
/// let mut arm = Arm::new(ArmIoSim::starting_at(30.0), &TunableStore::new());
/// arm.set_target_pos(45.0).unwrap();
/// for _ in 0..250 {
///     arm.periodic(true);
/// }
/// assert!(arm.reached_goal());
/// assert!((arm.angle_deg() - 45.0).abs() < 2.0);
/// ```
pub struct Arm<I = Box<dyn ArmIo>> {
    io:                  I,
    inputs:              ArmInputs,
    controller:          ProfiledPid,
    tunables:            ArmTunables,
    consumer:            ConsumerId,
    target_angle_deg:    f64,
    target_set:          bool,
    reached_goal:        bool,
    voltage_command_pid: f64,
    voltage_command:     f64,
    prev_velocity:       f64,
    prev_accel_sample:   f64,
    acceleration:        f64,
}

impl<I: ArmIo> Arm<I> {
    /// Builds the controller, registers its tunables in `store` and takes a
    /// first reading so the first target starts from the real angle.
    pub fn new(mut io: I, store: &TunableStore) -> Self {
        let tunables = ArmTunables::register(store);
        let mut controller = ProfiledPid::new(
            arm::KP,
            arm::KI,
            arm::KD,
            Constraints::new(arm::MAX_VELOCITY_RAD, arm::MAX_ACCELERATION_RAD),
        )
        .with_output_limit(MAX_VOLTAGE);
        tunables.apply(&mut controller);

        io.set_brake_mode(true);
        let mut inputs = ArmInputs::default();
        io.read(&mut inputs);
        controller.reset(inputs.angle_rad);
        controller.set_goal(arm::INITIAL_TARGET_DEG.to_radians());
        info!("Arm controller initialized at {:.1} deg", inputs.angle_deg);
        let prev_velocity = mean(&inputs.velocity_rad_per_sec);

        Self {
            io,
            inputs,
            controller,
            tunables,
            consumer: ConsumerId::next(),
            target_angle_deg: arm::INITIAL_TARGET_DEG,
            target_set: false,
            reached_goal: true,
            voltage_command_pid: 0.0,
            voltage_command: 0.0,
            prev_velocity,
            prev_accel_sample: 0.0,
            acceleration: 0.0,
        }
    }

    /// Runs one control period.
    pub fn periodic(&mut self, enabled: bool) {
        self.io.read(&mut self.inputs);
        self.update_tunables();

        // average of the last two velocity derivatives
        let velocity = mean(&self.inputs.velocity_rad_per_sec);
        let sample = (velocity - self.prev_velocity) / LOOP_PERIOD_SECS;
        self.acceleration = (sample + self.prev_accel_sample) / 2.0;
        self.prev_velocity = velocity;
        self.prev_accel_sample = sample;

        if !enabled || !self.target_set {
            // hold the profile on the measured angle so enabling never jumps
            self.controller.reset(self.inputs.angle_rad);
            self.voltage_command_pid = 0.0;
            self.voltage_command = 0.0;
            self.io.set_voltage(0.0);
            return;
        }

        self.voltage_command_pid = self
            .controller
            .calculate(self.inputs.angle_rad, LOOP_PERIOD_SECS);

        if !self.reached_goal {
            self.reached_goal = self.controller.at_goal();
            if self.reached_goal {
                info!(
                    "Arm reached goal {:.1} deg at {:.1} deg",
                    self.target_angle_deg, self.inputs.angle_deg
                );
            }
        }

        let limited = soft_limit(self.inputs.angle_deg, self.voltage_command_pid);
        self.voltage_command = -limited;
        self.io.set_voltage(self.voltage_command);
    }

    fn update_tunables(&mut self) {
        let t = &self.tunables;
        if changed_any(self.consumer, &[
            &t.kp,
            &t.ki,
            &t.kd,
            &t.max_velocity,
            &t.max_acceleration,
            &t.position_tolerance,
        ]) {
            t.apply(&mut self.controller);
            debug!(
                "Arm tunables pushed: gains {:?}, constraints {:?}",
                self.controller.gains(),
                self.controller.constraints()
            );
        }
    }

    /// Moves the goal to `angle_deg`.
    ///
    /// Targets outside the arm's travel are rejected without touching any
    /// state.
    pub fn set_target_pos(&mut self, angle_deg: f64) -> Result<()> {
        if !(arm::MIN_TARGET_DEG..=arm::MAX_TARGET_DEG).contains(&angle_deg) {
            warn!("Arm target {} deg rejected", angle_deg);
            return InvalidTargetSnafu {
                angle_deg,
                min_deg: arm::MIN_TARGET_DEG,
                max_deg: arm::MAX_TARGET_DEG,
            }
            .fail();
        }
        self.target_angle_deg = angle_deg;
        self.controller.set_goal(angle_deg.to_radians());
        self.controller.reset(self.inputs.angle_rad);
        self.reached_goal = false;
        self.target_set = true;
        Ok(())
    }

    /// Overrides the goal-reached latch.
    pub fn set_reached_target(&mut self, reached: bool) { self.reached_goal = reached; }

    /// Idle until the first target, then seeking or at goal per the latch.
    pub fn state(&self) -> ArmState {
        if !self.target_set {
            ArmState::Idle
        } else if self.reached_goal {
            ArmState::AtGoal
        } else {
            ArmState::Seeking
        }
    }

    /// Measured angle as of the last period, degrees above horizontal.
    pub fn angle_deg(&self) -> f64 { self.inputs.angle_deg }

    /// Last accepted target, degrees.
    pub fn target_angle_deg(&self) -> f64 { self.target_angle_deg }

    /// Acceleration of the shoulder motors, rad/s², averaged over the last
    /// two periods.
    pub fn acceleration(&self) -> f64 { self.acceleration }

    /// Raw PID output before the soft limit and the mirror.
    pub fn voltage_command_pid(&self) -> f64 { self.voltage_command_pid }

    /// Voltage sent to the motors this period.
    pub fn voltage_command(&self) -> f64 { self.voltage_command }

    /// Current drawn by each shoulder motor, amps.
    pub fn output_current(&self) -> &PerMotor { &self.inputs.current_amps }

    /// Latched goal-reached flag.
    pub fn reached_goal(&self) -> bool { self.reached_goal }

    /// Live goal check of the profiled controller.
    pub fn is_at_goal(&self) -> bool { self.controller.at_goal() }

    /// Raw readings from the last period.
    pub fn inputs(&self) -> &ArmInputs { &self.inputs }

    pub fn telemetry(&self) -> ArmTelemetry {
        ArmTelemetry {
            state:               self.state(),
            angle_deg:           self.inputs.angle_deg,
            target_angle_deg:    self.target_angle_deg,
            setpoint_deg:        self.controller.setpoint().position.to_degrees(),
            position_error_deg:  self.controller.position_error().to_degrees(),
            acceleration:        self.acceleration,
            voltage_command_pid: self.voltage_command_pid,
            voltage_command:     self.voltage_command,
            current_amps:        self.inputs.current_amps.clone(),
            reached_goal:        self.reached_goal,
            at_goal:             self.is_at_goal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{error::Error, peripherals::sim::ArmIoSim};

    fn arm_at(angle_deg: f64) -> (Arm<ArmIoSim>, TunableStore) {
        let store = TunableStore::new();
        (Arm::new(ArmIoSim::starting_at(angle_deg), &store), store)
    }

    /// Replays a fixed list of motor velocities, one per read.
    struct ScriptedIo {
        velocities: VecDeque<f64>,
    }

    impl ArmIo for ScriptedIo {
        fn read(&mut self, inputs: &mut ArmInputs) {
            let v = self.velocities.pop_front().unwrap_or(0.0);
            inputs.angle_deg = 30.0;
            inputs.angle_rad = 30f64.to_radians();
            inputs.velocity_rad_per_sec.clear();
            inputs.velocity_rad_per_sec.extend_from_slice(&[v, v]).unwrap();
            inputs.current_amps.clear();
            inputs.current_amps.extend_from_slice(&[1.5, 2.5]).unwrap();
        }

        fn set_voltage(&mut self, _volts: f64) {}
    }

    #[test]
    fn soft_limit_cuts_only_outward_motion() {
        assert_eq!(soft_limit(81.0, 3.0), 0.0);
        assert_eq!(soft_limit(81.0, -3.0), -3.0);
        assert_eq!(soft_limit(80.0, 0.5), 0.0);
        assert_eq!(soft_limit(15.0, -1.0), 0.0);
        assert_eq!(soft_limit(14.0, 1.0), 1.0);
        assert_eq!(soft_limit(45.0, 2.0), 2.0);
    }

    #[test]
    fn idle_arm_is_not_driven() {
        let (mut arm, _store) = arm_at(30.0);
        for _ in 0..10 {
            arm.periodic(true);
        }
        assert_eq!(arm.state(), ArmState::Idle);
        assert_eq!(arm.voltage_command(), 0.0);
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(40.0).unwrap();
        let err = arm.set_target_pos(95.0).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
        assert!(arm.set_target_pos(-1.0).is_err());
        assert_eq!(arm.target_angle_deg(), 40.0);
        assert!(!arm.reached_goal());
    }

    #[test]
    fn boundary_targets_are_accepted() {
        let (mut arm, _store) = arm_at(30.0);
        assert!(arm.set_target_pos(0.0).is_ok());
        assert!(arm.set_target_pos(90.0).is_ok());
    }

    #[test]
    fn converges_and_latches() {
        let (mut arm, _store) = arm_at(30.0);
        arm.periodic(true);
        arm.set_target_pos(60.0).unwrap();
        assert_eq!(arm.state(), ArmState::Seeking);

        let mut errors = Vec::new();
        for _ in 0..300 {
            arm.periodic(true);
            errors.push((arm.angle_deg() - 60.0).abs());
        }
        assert!(arm.reached_goal());
        assert_eq!(arm.state(), ArmState::AtGoal);
        assert!(errors.last().copied().unwrap_or(f64::MAX) < arm::POSITION_TOLERANCE_DEG);
        assert!(errors[50] < errors[0]);

        // the latch holds even when the goal check drops out
        arm.set_reached_target(true);
        for _ in 0..20 {
            arm.periodic(true);
        }
        assert!(arm.reached_goal());
    }

    #[test]
    fn moving_up_commands_negative_voltage() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(60.0).unwrap();
        for _ in 0..10 {
            arm.periodic(true);
        }
        assert!(arm.voltage_command_pid() > 0.0);
        assert!(arm.voltage_command() < 0.0);
    }

    #[test]
    fn disable_zeroes_output_on_same_period() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(70.0).unwrap();
        for _ in 0..20 {
            arm.periodic(true);
        }
        assert!(arm.voltage_command() != 0.0);
        arm.periodic(false);
        assert_eq!(arm.voltage_command(), 0.0);
        assert_eq!(arm.voltage_command_pid(), 0.0);
        // profile restarts from where the arm is
        let setpoint = arm.telemetry().setpoint_deg;
        assert!((setpoint - arm.angle_deg()).abs() < 1e-9);
    }

    #[test]
    fn tunable_gain_change_is_pushed() {
        let (mut arm, store) = arm_at(30.0);
        arm.periodic(true);
        store.set("Arm/Kp", 3.0);
        store.set("Arm/MaxVelocityRad", 0.5);
        arm.periodic(true);
        assert_eq!(arm.controller.gains(), (3.0, 0.0, 0.0));
        assert_eq!(arm.controller.constraints().max_velocity, 0.5);
    }

    #[test]
    fn acceleration_averages_two_derivatives() {
        let io = ScriptedIo {
            velocities: VecDeque::from([0.0, 1.0, 3.0]),
        };
        let mut arm = Arm::new(io, &TunableStore::new());
        // 0 -> 1 rad/s over 20 ms is 50 rad/s², averaged with nothing before it
        arm.periodic(false);
        assert!((arm.acceleration() - 25.0).abs() < 1e-9);
        // 1 -> 3 rad/s is 100 rad/s², averaged with the previous 50
        arm.periodic(false);
        assert!((arm.acceleration() - 75.0).abs() < 1e-9);
        assert_eq!(arm.telemetry().acceleration, arm.acceleration());
        assert_eq!(arm.output_current().as_slice(), &[1.5, 2.5]);
    }

    #[test]
    fn telemetry_reports_tracking_error() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(60.0).unwrap();
        for _ in 0..15 {
            arm.periodic(true);
        }
        let t = arm.telemetry();
        assert!((t.position_error_deg - (t.setpoint_deg - t.angle_deg)).abs() < 1e-9);
        assert_eq!(t.state, ArmState::Seeking);

        arm.periodic(false);
        assert_eq!(arm.telemetry().position_error_deg, 0.0);
    }

    #[test]
    fn target_above_soft_limit_parks_at_the_limit() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(85.0).unwrap();
        for _ in 0..500 {
            arm.periodic(true);
        }
        assert!((arm.angle_deg() - arm::SOFT_LIMIT_UPPER_DEG).abs() < 1.5);
        assert_eq!(arm.state(), ArmState::Seeking);
    }

    #[test]
    fn target_below_soft_limit_parks_at_the_limit() {
        let (mut arm, _store) = arm_at(30.0);
        arm.set_target_pos(5.0).unwrap();
        for _ in 0..500 {
            arm.periodic(true);
        }
        assert!((arm.angle_deg() - arm::SOFT_LIMIT_LOWER_DEG).abs() < 1.5);
        assert_eq!(arm.state(), ArmState::Seeking);
    }

    #[test]
    fn soft_limit_stops_upward_drive_near_top() {
        let (mut arm, _store) = arm_at(82.0);
        arm.set_target_pos(90.0).unwrap();
        for _ in 0..10 {
            arm.periodic(true);
        }
        assert!(arm.voltage_command_pid() > 0.0);
        assert_eq!(arm.voltage_command(), 0.0);
    }
}
