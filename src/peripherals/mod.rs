//! The sensor/actuator boundary of every mechanism.
//!
//! Each mechanism talks to its motors through one IO trait. A controller
//! calls `read` once at the top of its period, which overwrites an inputs
//! snapshot in place, and `set_voltage` once at the bottom. Two families of
//! implementers exist:
//!
//! - **Simulation** ([`sim`]): DC-motor physics models that advance one
//!   period on every `read`. Always available; used by tests and the desktop
//!   build.
//! - **Hardware** (`v5`, behind the `v5` feature): vexide smart motors and
//!   sensors on the V5 brain.
//!
//! Implementations clamp commanded voltage to their rail. Read failures on
//! hardware are logged and reported as neutral values.
//!
//! # Example
//!
//! ```
//! use talos::peripherals::{ShooterInputs, ShooterIo, sim::ShooterIoSim};
//!
//! let mut io = ShooterIoSim::new();
//! let mut inputs = ShooterInputs::default();
//! io.set_voltage(6.0);
//! io.read(&mut inputs);
//! assert!(inputs.mean_rpm() > 0.0);
//! ```

use heapless::Vec;
use serde::Serialize;

use crate::error::Result;

/// DC-motor and flywheel physics used by the simulated IO.
pub mod physics;

/// Simulated IO for every mechanism.
pub mod sim;

/// Hardware IO on the V5 brain.
///
/// Requires the `v5` feature and the `armv7a-vex-v5` target.
#[cfg(feature = "v5")]
pub mod v5;

/// Most motors any one mechanism drives.
pub const MAX_MOTORS: usize = 2;

/// One reading per physical motor of a mechanism.
pub type PerMotor = Vec<f64, MAX_MOTORS>;

/// Average of a per-motor reading, zero if there are no motors.
pub fn mean(values: &PerMotor) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Overwrites `dst` with `values`, dropping anything past [`MAX_MOTORS`].
pub(crate) fn fill(dst: &mut PerMotor, values: &[f64]) {
    dst.clear();
    for v in values.iter().take(MAX_MOTORS) {
        let _ = dst.push(*v);
    }
}

/// Measurements of the shoulder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArmInputs {
    /// Arm angle from the absolute encoder, degrees above horizontal.
    pub angle_deg:            f64,
    pub angle_rad:            f64,
    /// Motor shaft velocities.
    pub velocity_rad_per_sec: PerMotor,
    pub applied_volts:        PerMotor,
    pub current_amps:         PerMotor,
}

/// Measurements of the flywheel pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShooterInputs {
    pub velocity_rpm:  PerMotor,
    pub applied_volts: PerMotor,
    pub current_amps:  PerMotor,
}

impl ShooterInputs {
    /// Average wheel speed.
    pub fn mean_rpm(&self) -> f64 { mean(&self.velocity_rpm) }
}

/// Measurements of the indexer roller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexerInputs {
    pub velocity_rad_per_sec: PerMotor,
    pub applied_volts:        PerMotor,
    pub current_amps:         PerMotor,
}

/// Measurements of the two intake stages.
///
/// Voltage and current are tracked separately per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntakeInputs {
    /// First stage, then second stage.
    pub velocity_rad_per_sec: PerMotor,
    pub applied_volts:        PerMotor,
    pub current_amps:         PerMotor,
    /// Whether a note is held, as decided by the intake's detector.
    pub has_note:             bool,
}

/// Motors and encoder of the shoulder joint.
pub trait ArmIo {
    /// Refreshes `inputs` with the latest measurements.
    fn read(&mut self, inputs: &mut ArmInputs);

    /// Commands both shoulder motors.
    fn set_voltage(&mut self, volts: f64);

    /// Holds position (`true`) or coasts (`false`) when commanded 0 V.
    fn set_brake_mode(&mut self, _brake: bool) {}
}

/// The shooter's flywheel motors.
pub trait ShooterIo {
    fn read(&mut self, inputs: &mut ShooterInputs);

    fn set_voltage(&mut self, volts: f64);

    fn set_brake_mode(&mut self, _brake: bool) {}
}

/// The indexer roller motor.
pub trait IndexerIo {
    fn read(&mut self, inputs: &mut IndexerInputs);

    fn set_voltage(&mut self, volts: f64);

    fn set_brake_mode(&mut self, _brake: bool) {}
}

/// Both intake stages, driven with the same voltage.
pub trait IntakeIo {
    /// Refreshes the motor measurements. `has_note` is left alone.
    fn read(&mut self, inputs: &mut IntakeInputs);

    fn set_voltage(&mut self, volts: f64);

    fn set_brake_mode(&mut self, _brake: bool) {}
}

impl<T: ArmIo + ?Sized> ArmIo for Box<T> {
    fn read(&mut self, inputs: &mut ArmInputs) { (**self).read(inputs) }

    fn set_voltage(&mut self, volts: f64) { (**self).set_voltage(volts) }

    fn set_brake_mode(&mut self, brake: bool) { (**self).set_brake_mode(brake) }
}

impl<T: ShooterIo + ?Sized> ShooterIo for Box<T> {
    fn read(&mut self, inputs: &mut ShooterInputs) { (**self).read(inputs) }

    fn set_voltage(&mut self, volts: f64) { (**self).set_voltage(volts) }

    fn set_brake_mode(&mut self, brake: bool) { (**self).set_brake_mode(brake) }
}

impl<T: IndexerIo + ?Sized> IndexerIo for Box<T> {
    fn read(&mut self, inputs: &mut IndexerInputs) { (**self).read(inputs) }

    fn set_voltage(&mut self, volts: f64) { (**self).set_voltage(volts) }

    fn set_brake_mode(&mut self, brake: bool) { (**self).set_brake_mode(brake) }
}

impl<T: IntakeIo + ?Sized> IntakeIo for Box<T> {
    fn read(&mut self, inputs: &mut IntakeInputs) { (**self).read(inputs) }

    fn set_voltage(&mut self, volts: f64) { (**self).set_voltage(volts) }

    fn set_brake_mode(&mut self, brake: bool) { (**self).set_brake_mode(brake) }
}

/// A two-state sensor such as a beam break.
pub trait DigitalSensor {
    /// Whether the signal line is pulled low.
    fn is_low(&self) -> bool;
}

/// A sensor that measures the distance to the nearest object.
pub trait RangeSensor {
    /// Distance in inches, or `None` if nothing is in range.
    fn range_inches(&self) -> Option<f64>;

    /// Fails with [`HardwareUnavailable`](crate::error::Error::HardwareUnavailable)
    /// if the sensor is not plugged in.
    fn check_connected(&self) -> Result<()>;
}
