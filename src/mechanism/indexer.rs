use log::{debug, info};
use serde::Serialize;

use crate::{
    constants::{Deployment, indexer},
    motion::{feedforward::SimpleMotorFeedforward, pid::Pid},
    peripherals::{IndexerInputs, IndexerIo, mean, physics},
    tunable::{ConsumerId, TunableNumber, TunableStore, changed_any},
};

/// What the indexer roller is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IndexerMode {
    #[default]
    Stopped,
    /// Feeding towards the shooter.
    Indexing,
    /// Backing a note out.
    Reversing,
}

/// Diagnostics of one indexer period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexerTelemetry {
    pub mode:                 IndexerMode,
    /// Target roller speed for the mode.
    pub setpoint_rpm:         f64,
    /// The same target in rad/s, as the feedforward sees it.
    pub setpoint_rad_per_sec: f64,
    /// Voltage the feedforward asks for at the target.
    pub feedforward_volts:    f64,
    /// Measured roller speed.
    pub velocity_rpm:         f64,
}

/// Feedforward velocity control of the indexer roller.
pub struct Indexer<I = Box<dyn IndexerIo>> {
    io:                   I,
    inputs:               IndexerInputs,
    mode:                 IndexerMode,
    setpoint_rpm:         f64,
    setpoint_rad_per_sec: f64,
    feedforward:          SimpleMotorFeedforward,
    feedback:             Pid,
    kp:                   TunableNumber,
    ki:                   TunableNumber,
    index_rpm:            TunableNumber,
    reverse_rpm:          TunableNumber,
    consumer:             ConsumerId,
}

impl<I: IndexerIo> Indexer<I> {
    pub fn new(mut io: I, store: &TunableStore, deployment: Deployment) -> Self {
        let (ks, kv) = match deployment {
            Deployment::Real => indexer::REAL_FF,
            Deployment::Sim => indexer::SIM_FF,
        };
        let kp = store.number("Indexer/kP").with_default(indexer::KP);
        let ki = store.number("Indexer/kI").with_default(indexer::KI);
        io.set_brake_mode(false);
        info!("Indexer controller initialized ({:?})", deployment);
        Self {
            io,
            inputs: IndexerInputs::default(),
            mode: IndexerMode::Stopped,
            setpoint_rpm: 0.0,
            setpoint_rad_per_sec: 0.0,
            feedforward: SimpleMotorFeedforward::new(ks, kv),
            feedback: Pid::new(kp.get(), ki.get(), 0.0),
            kp,
            ki,
            index_rpm: store.number("Indexer/IndexRPM").with_default(indexer::INDEX_RPM),
            reverse_rpm: store.number("Indexer/ReverseRPM").with_default(indexer::REVERSE_RPM),
            consumer: ConsumerId::next(),
        }
    }

    /// Runs one control period.
    pub fn periodic(&mut self, enabled: bool) {
        self.io.read(&mut self.inputs);

        if changed_any(self.consumer, &[&self.kp, &self.ki]) {
            self.feedback.set_gains(self.kp.get(), self.ki.get(), 0.0);
            self.feedback.reset();
            debug!("Indexer gains pushed: {:?}", self.feedback.gains());
        }

        if enabled {
            self.setpoint_rpm = match self.mode {
                IndexerMode::Indexing => self.index_rpm.get(),
                IndexerMode::Reversing => self.reverse_rpm.get(),
                IndexerMode::Stopped => 0.0,
            };
        } else {
            self.feedback.reset();
            self.mode = IndexerMode::Stopped;
            self.setpoint_rpm = 0.0;
        }

        self.setpoint_rad_per_sec = physics::rpm_to_rad(self.setpoint_rpm);
        self.io.set_voltage(self.feedforward_volts());
    }

    pub fn index(&mut self) { self.mode = IndexerMode::Indexing; }

    pub fn reverse(&mut self) { self.mode = IndexerMode::Reversing; }

    pub fn stop(&mut self) { self.mode = IndexerMode::Stopped; }

    /// The mode requested last.
    pub fn mode(&self) -> IndexerMode { self.mode }

    pub fn setpoint_rpm(&self) -> f64 { self.setpoint_rpm }

    pub fn setpoint_rad_per_sec(&self) -> f64 { self.setpoint_rad_per_sec }

    /// The voltage commanded for the current setpoint.
    pub fn feedforward_volts(&self) -> f64 { self.feedforward.calculate(self.setpoint_rad_per_sec) }

    pub fn velocity_rpm(&self) -> f64 { physics::rad_to_rpm(mean(&self.inputs.velocity_rad_per_sec)) }

    pub fn inputs(&self) -> &IndexerInputs { &self.inputs }

    pub fn telemetry(&self) -> IndexerTelemetry {
        IndexerTelemetry {
            mode:                 self.mode,
            setpoint_rpm:         self.setpoint_rpm,
            setpoint_rad_per_sec: self.setpoint_rad_per_sec,
            feedforward_volts:    self.feedforward_volts(),
            velocity_rpm:         self.velocity_rpm(),
        }
    }
}
