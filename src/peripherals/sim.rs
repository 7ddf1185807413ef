//! Physics-backed IO for running the controllers off the robot.
//!
//! Every `read` advances its model by one loop period using the voltage last
//! commanded, then reports the new state. Sensors that the models cannot
//! derive (beam breaks, rangefinders) are exposed as shared handles that a
//! test or a scripted scenario flips by hand.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use log::info;
use snafu::ensure;

use super::{
    ArmInputs, ArmIo, DigitalSensor, IndexerInputs, IndexerIo, IntakeInputs, IntakeIo, RangeSensor,
    ShooterInputs, ShooterIo, fill,
    physics::{DcMotor, FlywheelSim},
};
use crate::{
    constants::{LOOP_PERIOD_SECS, arm, indexer, intake, shooter},
    error::{HardwareUnavailableSnafu, Result},
};

/// The shoulder as a geared inertia between two hard stops.
///
/// The mechanism is mirrored: a negative voltage raises the arm. Gravity is
/// not modeled.
#[derive(Debug, Clone)]
pub struct ArmIoSim {
    joint:     FlywheelSim,
    angle_rad: f64,
    min_rad:   f64,
    max_rad:   f64,
}

impl ArmIoSim {
    pub fn new() -> Self { Self::starting_at(arm::SIM_START_DEG) }

    /// An arm resting at `angle_deg`, clamped to the hard stops.
    pub fn starting_at(angle_deg: f64) -> Self {
        info!("Creating simulated arm at {:.1} deg", angle_deg);
        let min_rad = arm::HARD_STOP_MIN_DEG.to_radians();
        let max_rad = arm::HARD_STOP_MAX_DEG.to_radians();
        Self {
            joint: FlywheelSim::new(DcMotor::falcon500(2), arm::GEAR_RATIO, arm::MOMENT_OF_INERTIA),
            angle_rad: angle_deg.to_radians().clamp(min_rad, max_rad),
            min_rad,
            max_rad,
        }
    }
}

impl Default for ArmIoSim {
    fn default() -> Self { Self::new() }
}

impl ArmIo for ArmIoSim {
    fn read(&mut self, inputs: &mut ArmInputs) {
        self.joint.update(LOOP_PERIOD_SECS);
        self.angle_rad -= self.joint.velocity() * LOOP_PERIOD_SECS;
        if self.angle_rad <= self.min_rad || self.angle_rad >= self.max_rad {
            self.angle_rad = self.angle_rad.clamp(self.min_rad, self.max_rad);
            self.joint.set_velocity(0.0);
        }

        let volts = self.joint.input_voltage();
        let motor_velocity = self.joint.motor_velocity();
        let per_motor_current = self.joint.current_draw() / 2.0;
        inputs.angle_rad = self.angle_rad;
        inputs.angle_deg = self.angle_rad.to_degrees();
        fill(&mut inputs.velocity_rad_per_sec, &[motor_velocity, motor_velocity]);
        fill(&mut inputs.applied_volts, &[volts, volts]);
        fill(&mut inputs.current_amps, &[per_motor_current, per_motor_current]);
    }

    fn set_voltage(&mut self, volts: f64) { self.joint.set_input_voltage(volts); }
}

/// Two independent flywheels, one per shooter motor.
#[derive(Debug, Clone)]
pub struct ShooterIoSim {
    top:    FlywheelSim,
    bottom: FlywheelSim,
}

impl ShooterIoSim {
    pub fn new() -> Self {
        info!("Creating simulated shooter");
        let wheel = FlywheelSim::new(
            DcMotor::falcon500(1),
            shooter::GEAR_RATIO,
            shooter::MOMENT_OF_INERTIA,
        );
        Self {
            top:    wheel.clone(),
            bottom: wheel,
        }
    }
}

impl Default for ShooterIoSim {
    fn default() -> Self { Self::new() }
}

impl ShooterIo for ShooterIoSim {
    fn read(&mut self, inputs: &mut ShooterInputs) {
        self.top.update(LOOP_PERIOD_SECS);
        self.bottom.update(LOOP_PERIOD_SECS);
        fill(&mut inputs.velocity_rpm, &[self.top.velocity_rpm(), self.bottom.velocity_rpm()]);
        fill(&mut inputs.applied_volts, &[self.top.input_voltage(), self.bottom.input_voltage()]);
        fill(&mut inputs.current_amps, &[self.top.current_draw(), self.bottom.current_draw()]);
    }

    fn set_voltage(&mut self, volts: f64) {
        self.top.set_input_voltage(volts);
        self.bottom.set_input_voltage(volts);
    }
}

/// The indexer roller as a single flywheel.
#[derive(Debug, Clone)]
pub struct IndexerIoSim {
    roller: FlywheelSim,
}

impl IndexerIoSim {
    pub fn new() -> Self {
        info!("Creating simulated indexer");
        Self {
            roller: FlywheelSim::new(
                DcMotor::falcon500(1),
                indexer::GEAR_RATIO,
                indexer::MOMENT_OF_INERTIA,
            ),
        }
    }
}

impl Default for IndexerIoSim {
    fn default() -> Self { Self::new() }
}

impl IndexerIo for IndexerIoSim {
    fn read(&mut self, inputs: &mut IndexerInputs) {
        self.roller.update(LOOP_PERIOD_SECS);
        fill(&mut inputs.velocity_rad_per_sec, &[self.roller.velocity()]);
        fill(&mut inputs.applied_volts, &[self.roller.input_voltage()]);
        fill(&mut inputs.current_amps, &[self.roller.current_draw()]);
    }

    fn set_voltage(&mut self, volts: f64) { self.roller.set_input_voltage(volts); }
}

/// Both intake stages as flywheels with their own gearing.
#[derive(Debug, Clone)]
pub struct IntakeIoSim {
    first:  FlywheelSim,
    second: FlywheelSim,
}

impl IntakeIoSim {
    pub fn new() -> Self {
        info!("Creating simulated intake");
        let stage =
            |gearing| FlywheelSim::new(DcMotor::falcon500(1), gearing, intake::MOMENT_OF_INERTIA);
        Self {
            first:  stage(intake::FIRST_STAGE_GEAR_RATIO),
            second: stage(intake::SECOND_STAGE_GEAR_RATIO),
        }
    }
}

impl Default for IntakeIoSim {
    fn default() -> Self { Self::new() }
}

impl IntakeIo for IntakeIoSim {
    fn read(&mut self, inputs: &mut IntakeInputs) {
        self.first.update(LOOP_PERIOD_SECS);
        self.second.update(LOOP_PERIOD_SECS);
        fill(&mut inputs.velocity_rad_per_sec, &[self.first.velocity(), self.second.velocity()]);
        fill(&mut inputs.applied_volts, &[self.first.input_voltage(), self.second.input_voltage()]);
        fill(&mut inputs.current_amps, &[self.first.current_draw(), self.second.current_draw()]);
    }

    fn set_voltage(&mut self, volts: f64) {
        self.first.set_input_voltage(volts);
        self.second.set_input_voltage(volts);
    }
}

/// A digital line that can be flipped from anywhere holding a clone.
#[derive(Debug, Clone, Default)]
pub struct SimSwitch {
    low: Arc<AtomicBool>,
}

impl SimSwitch {
    pub fn new() -> Self { Self::default() }

    pub fn set_low(&self, low: bool) { self.low.store(low, Ordering::Release); }
}

impl DigitalSensor for SimSwitch {
    fn is_low(&self) -> bool { self.low.load(Ordering::Acquire) }
}

/// A rangefinder whose reading is set by hand.
#[derive(Debug, Clone)]
pub struct SimRangefinder {
    inches:    Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl SimRangefinder {
    /// Port reported when the simulated sensor is unplugged.
    pub const PORT: u8 = 0;

    /// Starts plugged in, with nothing in range.
    pub fn new() -> Self {
        Self {
            inches:    Arc::new(AtomicU64::new(f64::NAN.to_bits())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates plugging the sensor in or pulling it out.
    pub fn set_connected(&self, connected: bool) { self.connected.store(connected, Ordering::Release); }

    /// `None` means nothing in range.
    pub fn set_range(&self, inches: Option<f64>) {
        let bits = inches.unwrap_or(f64::NAN).to_bits();
        self.inches.store(bits, Ordering::Release);
    }
}

impl Default for SimRangefinder {
    fn default() -> Self { Self::new() }
}

impl RangeSensor for SimRangefinder {
    fn range_inches(&self) -> Option<f64> {
        let inches = f64::from_bits(self.inches.load(Ordering::Acquire));
        inches.is_finite().then_some(inches)
    }

    fn check_connected(&self) -> Result<()> {
        ensure!(self.connected.load(Ordering::Acquire), HardwareUnavailableSnafu {
            device: "simulated rangefinder",
            port:   Self::PORT,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_arm(io: &mut ArmIoSim, volts: f64, periods: usize) -> ArmInputs {
        let mut inputs = ArmInputs::default();
        io.set_voltage(volts);
        for _ in 0..periods {
            io.read(&mut inputs);
        }
        inputs
    }

    #[test]
    fn arm_rises_under_negative_voltage() {
        let mut io = ArmIoSim::starting_at(30.0);
        let inputs = step_arm(&mut io, -2.0, 10);
        assert!(inputs.angle_deg > 30.0);
        assert_eq!(inputs.applied_volts.as_slice(), &[-2.0, -2.0]);
    }

    #[test]
    fn arm_stops_at_hard_stops() {
        let mut io = ArmIoSim::starting_at(30.0);
        let inputs = step_arm(&mut io, -12.0, 200);
        assert!((inputs.angle_deg - arm::HARD_STOP_MAX_DEG).abs() < 1e-9);
        let inputs = step_arm(&mut io, 12.0, 200);
        assert!((inputs.angle_deg - arm::HARD_STOP_MIN_DEG).abs() < 1e-9);
    }

    #[test]
    fn arm_holds_without_voltage() {
        let mut io = ArmIoSim::starting_at(42.0);
        let inputs = step_arm(&mut io, 0.0, 50);
        assert!((inputs.angle_deg - 42.0).abs() < 1e-9);
    }

    #[test]
    fn intake_reports_each_stage() {
        let mut io = IntakeIoSim::new();
        let mut inputs = IntakeInputs::default();
        io.set_voltage(8.0);
        for _ in 0..20 {
            io.read(&mut inputs);
        }
        let v = inputs.velocity_rad_per_sec.as_slice();
        // the second stage is geared faster
        assert!(v[1] > v[0] && v[0] > 0.0);
        assert_eq!(inputs.applied_volts.as_slice(), &[8.0, 8.0]);
        assert_eq!(inputs.current_amps.len(), 2);
    }

    #[test]
    fn indexer_spins_up() {
        let mut io = IndexerIoSim::new();
        let mut inputs = IndexerInputs::default();
        io.set_voltage(-4.0);
        io.read(&mut inputs);
        assert!(inputs.velocity_rad_per_sec[0] < 0.0);
    }

    #[test]
    fn sensors_share_state_across_clones() {
        let switch = SimSwitch::new();
        let handle = switch.clone();
        assert!(!switch.is_low());
        handle.set_low(true);
        assert!(switch.is_low());

        let range = SimRangefinder::new();
        assert_eq!(range.range_inches(), None);
        range.clone().set_range(Some(4.5));
        assert_eq!(range.range_inches(), Some(4.5));
    }
}
