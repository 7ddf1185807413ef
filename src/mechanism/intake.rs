use log::info;
use serde::Serialize;

use super::presence::NoteDetector;
use crate::{
    constants::{LOOP_PERIOD_SECS, intake},
    peripherals::{IntakeInputs, IntakeIo},
    tunable::{TunableNumber, TunableStore},
};

/// What the intake rollers are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IntakeMode {
    #[default]
    Stopped,
    /// Pulling a note in off the floor.
    Eating,
    /// Spitting a note back out.
    Vomiting,
    /// Feeding a held note up to the shooter.
    Digesting,
}

/// Diagnostics of one intake period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeTelemetry {
    pub mode:            IntakeMode,
    /// Voltage sent to both stages this period.
    pub voltage_command: f64,
    /// Whether the detector sees a note.
    pub has_note:        bool,
    /// Raw readings from the last period.
    pub inputs:          IntakeInputs,
}

/// Open-loop roller control with note detection.
///
/// The mode picks a tunable voltage that is applied as is. Presence comes
/// from whichever [`NoteDetector`] the intake was built with.
///
/// # Example
///
/// ```
/// use talos::{
///     mechanism::{intake::Intake, presence::VelocitySignature},
///     peripherals::sim::IntakeIoSim,
///     tunable::TunableStore,
/// };
///
/// let mut intake = Intake::new(
///     IntakeIoSim::new(),
///     Box::new(VelocitySignature::new()),
///     &TunableStore::new(),
/// );
/// intake.eat();
/// for _ in 0..150 {
///     intake.periodic(true);
/// }
/// assert!(intake.has_note());
/// ```
pub struct Intake<I = Box<dyn IntakeIo>> {
    io:              I,
    inputs:          IntakeInputs,
    detector:        Box<dyn NoteDetector>,
    mode:            IntakeMode,
    voltage_command: f64,
    eat_volts:       TunableNumber,
    vomit_volts:     TunableNumber,
    digest_volts:    TunableNumber,
}

impl<I: IntakeIo> Intake<I> {
    pub fn new(mut io: I, detector: Box<dyn NoteDetector>, store: &TunableStore) -> Self {
        io.set_brake_mode(false);
        info!("Intake controller initialized with {} detection", detector.name());
        Self {
            io,
            inputs: IntakeInputs::default(),
            detector,
            mode: IntakeMode::Stopped,
            voltage_command: 0.0,
            eat_volts: store.number("Intake/EatVolts").with_default(intake::EAT_VOLTS),
            vomit_volts: store.number("Intake/VomitVolts").with_default(intake::VOMIT_VOLTS),
            digest_volts: store.number("Intake/DigestVolts").with_default(intake::DIGEST_VOLTS),
        }
    }

    /// Runs one control period.
    pub fn periodic(&mut self, enabled: bool) {
        self.io.read(&mut self.inputs);

        let has_note = self.detector.detect(&self.inputs, LOOP_PERIOD_SECS);
        if has_note != self.inputs.has_note {
            info!(
                "Intake {} note ({})",
                if has_note { "acquired" } else { "released" },
                self.detector.name()
            );
        }
        self.inputs.has_note = has_note;

        if !enabled {
            self.mode = IntakeMode::Stopped;
        }
        self.voltage_command = match self.mode {
            IntakeMode::Stopped => 0.0,
            IntakeMode::Eating => self.eat_volts.get(),
            IntakeMode::Vomiting => self.vomit_volts.get(),
            IntakeMode::Digesting => self.digest_volts.get(),
        };
        self.io.set_voltage(self.voltage_command);
    }

    pub fn eat(&mut self) { self.mode = IntakeMode::Eating; }

    pub fn vomit(&mut self) { self.mode = IntakeMode::Vomiting; }

    pub fn digest(&mut self) { self.mode = IntakeMode::Digesting; }

    pub fn stop(&mut self) { self.mode = IntakeMode::Stopped; }

    pub fn mode(&self) -> IntakeMode { self.mode }

    pub fn voltage_command(&self) -> f64 { self.voltage_command }

    pub fn has_note(&self) -> bool { self.inputs.has_note }

    pub fn inputs(&self) -> &IntakeInputs { &self.inputs }

    pub fn telemetry(&self) -> IntakeTelemetry {
        IntakeTelemetry {
            mode:            self.mode,
            voltage_command: self.voltage_command,
            has_note:        self.inputs.has_note,
            inputs:          self.inputs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mechanism::presence::{BeamBreak, Rangefinder, VelocitySignature},
        peripherals::sim::{IntakeIoSim, SimRangefinder, SimSwitch},
    };

    fn sim_intake() -> Intake<IntakeIoSim> {
        Intake::new(
            IntakeIoSim::new(),
            Box::new(VelocitySignature::new()),
            &TunableStore::new(),
        )
    }

    #[test]
    fn modes_apply_tunable_voltage() {
        let store = TunableStore::new();
        let mut intake = Intake::new(
            IntakeIoSim::new(),
            Box::new(VelocitySignature::new()),
            &store,
        );
        intake.eat();
        intake.periodic(true);
        assert_eq!(intake.voltage_command(), intake::EAT_VOLTS);
        intake.vomit();
        intake.periodic(true);
        assert_eq!(intake.voltage_command(), intake::VOMIT_VOLTS);
        store.set("Intake/DigestVolts", 11.0);
        intake.digest();
        intake.periodic(true);
        assert_eq!(intake.voltage_command(), 11.0);
        intake.stop();
        intake.periodic(true);
        assert_eq!(intake.voltage_command(), 0.0);
    }

    #[test]
    fn disable_stops_rollers() {
        let mut intake = sim_intake();
        intake.eat();
        intake.periodic(true);
        intake.periodic(false);
        assert_eq!(intake.voltage_command(), 0.0);
        assert_eq!(intake.mode(), IntakeMode::Stopped);
    }

    #[test]
    fn eat_then_vomit_round_trip() {
        let mut intake = sim_intake();
        intake.eat();
        for _ in 0..150 {
            intake.periodic(true);
        }
        assert!(intake.has_note());
        intake.vomit();
        for _ in 0..50 {
            intake.periodic(true);
        }
        assert!(!intake.has_note());
    }

    #[test]
    fn beam_break_drives_presence() {
        let line = SimSwitch::new();
        let mut intake = Intake::new(
            IntakeIoSim::new(),
            Box::new(BeamBreak::new(line.clone())),
            &TunableStore::new(),
        );
        intake.periodic(true);
        assert!(!intake.has_note());
        line.set_low(true);
        intake.periodic(true);
        assert!(intake.has_note());
        assert!(intake.telemetry().has_note);
    }

    #[test]
    fn rangefinder_drives_presence() {
        let range = SimRangefinder::new();
        let mut intake = Intake::new(
            IntakeIoSim::new(),
            Box::new(Rangefinder::new(range.clone())),
            &TunableStore::new(),
        );
        range.set_range(Some(3.0));
        intake.periodic(false);
        assert!(intake.has_note());
        range.set_range(None);
        intake.periodic(false);
        assert!(!intake.has_note());
    }

    #[test]
    fn repeated_requests_match_a_single_one() {
        let requests: [fn(&mut Intake<IntakeIoSim>); 2] = [Intake::eat, Intake::vomit];
        for request in requests {
            let mut once = sim_intake();
            let mut twice = sim_intake();
            request(&mut once);
            request(&mut twice);
            request(&mut twice);
            for _ in 0..5 {
                once.periodic(true);
                twice.periodic(true);
            }
            assert_eq!(twice.telemetry(), once.telemetry());
            assert_ne!(twice.voltage_command(), 0.0);
        }
    }
}
