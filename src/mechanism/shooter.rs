use log::{debug, info};
use serde::Serialize;

use crate::{
    constants::{Deployment, MAX_VOLTAGE, shooter},
    motion::{feedforward::SimpleMotorFeedforward, pid::Pid},
    peripherals::{PerMotor, ShooterInputs, ShooterIo},
    tunable::{ConsumerId, TunableNumber, TunableStore, changed_any},
};

/// What the flywheels are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ShooterMode {
    #[default]
    Stopped,
    /// Full speed into the speaker.
    Shoot,
    /// Lob to a partner.
    Deliver,
    /// Pull a note back in.
    Reverse,
}

struct ShooterTunables {
    shoot_rpm:     TunableNumber,
    deliver_rpm:   TunableNumber,
    reverse_rpm:   TunableNumber,
    spin_duration: TunableNumber,
    kp:            TunableNumber,
    kd:            TunableNumber,
}

impl ShooterTunables {
    fn register(store: &TunableStore) -> Self {
        Self {
            shoot_rpm:     store.number("Shooter/ShootRPM").with_default(shooter::SHOOT_RPM),
            deliver_rpm:   store.number("Shooter/DeliverRPM").with_default(shooter::DELIVER_RPM),
            reverse_rpm:   store.number("Shooter/ReverseRPM").with_default(shooter::REVERSE_RPM),
            spin_duration: store
                .number("Shooter/SpinDurationSec")
                .with_default(shooter::SPIN_DURATION_SECS),
            kp:            store.number("Shooter/kP").with_default(shooter::KP),
            kd:            store.number("Shooter/kD").with_default(shooter::KD),
        }
    }
}

/// Diagnostics of one shooter period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShooterTelemetry {
    pub mode:            ShooterMode,
    /// Target flywheel speed for the mode.
    pub setpoint_rpm:    f64,
    /// Mean measured speed of both flywheels.
    pub velocity_rpm:    f64,
    /// Feedforward voltage sent this period.
    pub voltage_command: f64,
    /// Per-motor current, amps.
    pub current_amps:    PerMotor,
}

/// Open-loop velocity control of the flywheels.
///
/// The mode picks a target speed and the feedforward model turns it into a
/// voltage. The feedback gains are kept current for tuning but take no part
/// in the command.
pub struct Shooter<I = Box<dyn ShooterIo>> {
    io:              I,
    inputs:          ShooterInputs,
    mode:            ShooterMode,
    setpoint_rpm:    f64,
    voltage_command: f64,
    feedforward:     SimpleMotorFeedforward,
    feedback:        Pid,
    tunables:        ShooterTunables,
    consumer:        ConsumerId,
}

impl<I: ShooterIo> Shooter<I> {
    pub fn new(mut io: I, store: &TunableStore, deployment: Deployment) -> Self {
        let (ks, kv) = match deployment {
            Deployment::Real => shooter::REAL_FF,
            Deployment::Sim => shooter::SIM_FF,
        };
        io.set_brake_mode(false);
        info!("Shooter controller initialized ({:?})", deployment);
        Self {
            io,
            inputs: ShooterInputs::default(),
            mode: ShooterMode::Stopped,
            setpoint_rpm: 0.0,
            voltage_command: 0.0,
            feedforward: SimpleMotorFeedforward::new(ks, kv),
            feedback: Pid::new(shooter::KP, 0.0, shooter::KD),
            tunables: ShooterTunables::register(store),
            consumer: ConsumerId::next(),
        }
    }

    /// Runs one control period.
    pub fn periodic(&mut self, enabled: bool) {
        self.setpoint_rpm = 0.0;
        self.io.read(&mut self.inputs);

        let t = &self.tunables;
        if changed_any(self.consumer, &[&t.kp, &t.kd]) {
            self.feedback.set_gains(t.kp.get(), 0.0, t.kd.get());
            debug!("Shooter gains pushed: {:?}", self.feedback.gains());
        }

        if !enabled {
            self.voltage_command = 0.0;
            self.io.set_voltage(0.0);
            self.feedback.reset();
            self.mode = ShooterMode::Stopped;
            return;
        }

        self.setpoint_rpm = match self.mode {
            ShooterMode::Shoot => t.shoot_rpm.get(),
            ShooterMode::Deliver => t.deliver_rpm.get(),
            ShooterMode::Reverse => t.reverse_rpm.get(),
            ShooterMode::Stopped => 0.0,
        };
        self.voltage_command = self
            .feedforward
            .calculate(self.setpoint_rpm)
            .clamp(-MAX_VOLTAGE, MAX_VOLTAGE);
        self.io.set_voltage(self.voltage_command);
    }

    pub fn set_shoot(&mut self) { self.mode = ShooterMode::Shoot; }

    pub fn set_deliver(&mut self) { self.mode = ShooterMode::Deliver; }

    pub fn set_reverse(&mut self) { self.mode = ShooterMode::Reverse; }

    pub fn stop(&mut self) { self.mode = ShooterMode::Stopped; }

    /// Writes a voltage straight to the motors.
    ///
    /// The next [`periodic`](Shooter::periodic) overrides it.
    pub fn set_voltage(&mut self, volts: f64) { self.io.set_voltage(volts); }

    /// The mode requested last.
    pub fn mode(&self) -> ShooterMode { self.mode }

    /// Target speed resolved from the mode on the last period.
    pub fn setpoint_rpm(&self) -> f64 { self.setpoint_rpm }

    pub fn voltage_command(&self) -> f64 { self.voltage_command }

    /// Measured wheel speed, averaged over both motors.
    pub fn velocity_rpm(&self) -> f64 { self.inputs.mean_rpm() }

    /// How long the wheels get to spin up before a note is fed.
    pub fn spin_duration_secs(&self) -> f64 { self.tunables.spin_duration.get() }

    pub fn inputs(&self) -> &ShooterInputs { &self.inputs }

    pub fn telemetry(&self) -> ShooterTelemetry {
        ShooterTelemetry {
            mode:            self.mode,
            setpoint_rpm:    self.setpoint_rpm,
            velocity_rpm:    self.velocity_rpm(),
            voltage_command: self.voltage_command,
            current_amps:    self.inputs.current_amps.clone(),
        }
    }
}
