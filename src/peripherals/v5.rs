//! IO backed by vexide smart devices.
//!
//! Constructors take devices that were already created from the brain's
//! peripherals and refuse to build if any of them is unplugged. Reads never
//! fail: a device error is logged and the reading falls back to zero.
//!
//! ADI lines such as a beam break have no way to report whether anything is
//! wired to them, so a [`BeamBreak`](crate::mechanism::presence::BeamBreak) cannot be checked.
//!
//! # Example
//!
//! ```ignore
//! use talos::peripherals::v5::{self, ShooterIoV5};
//! use vexide::prelude::*;
//!
//! let shooter = ShooterIoV5::new(
//!     Motor::new(peripherals.port_4, Gearset::Blue, Direction::Forward),
//!     Motor::new(peripherals.port_5, Gearset::Blue, Direction::Reverse),
//! )?;
//! let detector = v5::rangefinder(DistanceSensor::new(peripherals.port_9))?;
//! ```

use log::warn;
use vexide::{
    adi::digital::AdiDigitalIn,
    smart::{
        SmartDevice,
        distance::DistanceSensor,
        motor::{BrakeMode, Motor},
        rotation::RotationSensor,
    },
};

use super::{
    ArmInputs, ArmIo, DigitalSensor, IndexerInputs, IndexerIo, IntakeInputs, IntakeIo, RangeSensor,
    ShooterInputs, ShooterIo, fill, physics::rpm_to_rad,
};
use crate::{
    constants::{MAX_VOLTAGE, shooter},
    error::{HardwareUnavailableSnafu, Result},
    mechanism::presence::Rangefinder,
};

const MM_PER_INCH: f64 = 25.4;

fn ensure_connected(device: &impl SmartDevice, role: &'static str) -> Result<()> {
    if device.is_connected() {
        Ok(())
    } else {
        HardwareUnavailableSnafu {
            device: role,
            port:   device.port_number(),
        }
        .fail()
    }
}

/// Velocity (RPM), voltage and current of one motor.
fn sample(motor: &Motor, role: &str) -> (f64, f64, f64) {
    let rpm = motor.velocity().map(f64::from).unwrap_or_else(|e| {
        warn!("{} Velocity Error: {}", role, e);
        0.0
    });
    let volts = motor.voltage().unwrap_or_else(|e| {
        warn!("{} Voltage Error: {}", role, e);
        0.0
    });
    let amps = motor.current().unwrap_or_else(|e| {
        warn!("{} Current Error: {}", role, e);
        0.0
    });
    (rpm, volts, amps)
}

/// Commands `volts`, or applies the neutral mode when asked for zero.
fn drive(motor: &mut Motor, volts: f64, neutral: BrakeMode, role: &str) {
    let result = if volts == 0.0 {
        motor.brake(neutral)
    } else {
        motor.set_voltage(volts.clamp(-MAX_VOLTAGE, MAX_VOLTAGE))
    };
    if let Err(e) = result {
        warn!("{} Voltage Command Error: {}", role, e);
    }
}

fn neutral(brake: bool) -> BrakeMode { if brake { BrakeMode::Brake } else { BrakeMode::Coast } }

/// Two shoulder motors and an absolute rotation sensor on the joint.
///
/// Both motors receive the same command, so the second one must be built
/// with the opposite [`Direction`](vexide::smart::motor::Direction).
pub struct ArmIoV5 {
    leader:   Motor,
    follower: Motor,
    encoder:  RotationSensor,
    neutral:  BrakeMode,
}

impl ArmIoV5 {
    pub fn new(leader: Motor, follower: Motor, encoder: RotationSensor) -> Result<Self> {
        ensure_connected(&leader, "arm leader motor")?;
        ensure_connected(&follower, "arm follower motor")?;
        ensure_connected(&encoder, "arm rotation sensor")?;
        Ok(Self {
            leader,
            follower,
            encoder,
            neutral: BrakeMode::Brake,
        })
    }
}

impl ArmIo for ArmIoV5 {
    fn read(&mut self, inputs: &mut ArmInputs) {
        let angle = self.encoder.position().unwrap_or_else(|e| {
            warn!("Arm Rotation Sensor Position Error: {}", e);
            Default::default()
        });
        inputs.angle_deg = angle.as_degrees();
        inputs.angle_rad = angle.as_radians();

        let (l_rpm, l_volts, l_amps) = sample(&self.leader, "Arm Leader");
        let (f_rpm, f_volts, f_amps) = sample(&self.follower, "Arm Follower");
        fill(&mut inputs.velocity_rad_per_sec, &[rpm_to_rad(l_rpm), rpm_to_rad(f_rpm)]);
        fill(&mut inputs.applied_volts, &[l_volts, f_volts]);
        fill(&mut inputs.current_amps, &[l_amps, f_amps]);
    }

    fn set_voltage(&mut self, volts: f64) {
        drive(&mut self.leader, volts, self.neutral, "Arm Leader");
        drive(&mut self.follower, volts, self.neutral, "Arm Follower");
    }

    fn set_brake_mode(&mut self, brake: bool) { self.neutral = neutral(brake); }
}

/// Top and bottom flywheel motors.
///
/// Both motors are wired inverted: commands and readings are negated so that
/// positive means shooting out.
pub struct ShooterIoV5 {
    top:     Motor,
    bottom:  Motor,
    neutral: BrakeMode,
}

impl ShooterIoV5 {
    pub fn new(top: Motor, bottom: Motor) -> Result<Self> {
        ensure_connected(&top, "shooter top motor")?;
        ensure_connected(&bottom, "shooter bottom motor")?;
        Ok(Self {
            top,
            bottom,
            neutral: BrakeMode::Coast,
        })
    }
}

impl ShooterIo for ShooterIoV5 {
    fn read(&mut self, inputs: &mut ShooterInputs) {
        let (t_rpm, t_volts, t_amps) = sample(&self.top, "Shooter Top");
        let (b_rpm, b_volts, b_amps) = sample(&self.bottom, "Shooter Bottom");
        fill(
            &mut inputs.velocity_rpm,
            &[-t_rpm / shooter::GEAR_RATIO, -b_rpm / shooter::GEAR_RATIO],
        );
        fill(&mut inputs.applied_volts, &[-t_volts, -b_volts]);
        fill(&mut inputs.current_amps, &[t_amps, b_amps]);
    }

    fn set_voltage(&mut self, volts: f64) {
        drive(&mut self.top, -volts, self.neutral, "Shooter Top");
        drive(&mut self.bottom, -volts, self.neutral, "Shooter Bottom");
    }

    fn set_brake_mode(&mut self, brake: bool) { self.neutral = neutral(brake); }
}

/// The indexer roller motor.
pub struct IndexerIoV5 {
    motor:   Motor,
    neutral: BrakeMode,
}

impl IndexerIoV5 {
    pub fn new(motor: Motor) -> Result<Self> {
        ensure_connected(&motor, "indexer motor")?;
        Ok(Self {
            motor,
            neutral: BrakeMode::Coast,
        })
    }
}

impl IndexerIo for IndexerIoV5 {
    fn read(&mut self, inputs: &mut IndexerInputs) {
        let (rpm, volts, amps) = sample(&self.motor, "Indexer");
        fill(&mut inputs.velocity_rad_per_sec, &[rpm_to_rad(rpm)]);
        fill(&mut inputs.applied_volts, &[volts]);
        fill(&mut inputs.current_amps, &[amps]);
    }

    fn set_voltage(&mut self, volts: f64) { drive(&mut self.motor, volts, self.neutral, "Indexer"); }

    fn set_brake_mode(&mut self, brake: bool) { self.neutral = neutral(brake); }
}

/// Both intake stage motors.
pub struct IntakeIoV5 {
    first:   Motor,
    second:  Motor,
    neutral: BrakeMode,
}

impl IntakeIoV5 {
    pub fn new(first: Motor, second: Motor) -> Result<Self> {
        ensure_connected(&first, "intake first stage motor")?;
        ensure_connected(&second, "intake second stage motor")?;
        Ok(Self {
            first,
            second,
            neutral: BrakeMode::Coast,
        })
    }
}

impl IntakeIo for IntakeIoV5 {
    fn read(&mut self, inputs: &mut IntakeInputs) {
        let (f_rpm, f_volts, f_amps) = sample(&self.first, "Intake First Stage");
        let (s_rpm, s_volts, s_amps) = sample(&self.second, "Intake Second Stage");
        fill(&mut inputs.velocity_rad_per_sec, &[rpm_to_rad(f_rpm), rpm_to_rad(s_rpm)]);
        fill(&mut inputs.applied_volts, &[f_volts, s_volts]);
        fill(&mut inputs.current_amps, &[f_amps, s_amps]);
    }

    fn set_voltage(&mut self, volts: f64) {
        drive(&mut self.first, volts, self.neutral, "Intake First Stage");
        drive(&mut self.second, volts, self.neutral, "Intake Second Stage");
    }

    fn set_brake_mode(&mut self, brake: bool) { self.neutral = neutral(brake); }
}

impl DigitalSensor for AdiDigitalIn {
    fn is_low(&self) -> bool {
        AdiDigitalIn::is_low(self).unwrap_or_else(|e| {
            warn!("Beam Break Read Error: {}", e);
            false
        })
    }
}

impl RangeSensor for DistanceSensor {
    fn range_inches(&self) -> Option<f64> {
        match self.object() {
            Ok(object) => object.map(|o| f64::from(o.distance) / MM_PER_INCH),
            Err(e) => {
                warn!("Distance Sensor Read Error: {}", e);
                None
            }
        }
    }

    fn check_connected(&self) -> Result<()> { ensure_connected(self, "intake rangefinder") }
}

/// Note detection from a distance sensor looking into the intake.
///
/// Fails if the sensor is unplugged.
pub fn rangefinder(sensor: DistanceSensor) -> Result<Rangefinder<DistanceSensor>> {
    Rangefinder::connected(sensor)
}
