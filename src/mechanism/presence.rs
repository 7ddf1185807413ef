//! Deciding whether the intake holds a note.
//!
//! Three strategies exist, picked when the intake is built:
//!
//! - [`BeamBreak`]: an active-low beam break across the note path.
//! - [`Rangefinder`]: a distance sensor looking into the intake, with a fixed
//!   threshold.
//! - [`VelocitySignature`]: no sensor at all. The note is inferred from how
//!   long the rollers have been spinning in one direction. This is what the
//!   simulator uses.

use crate::{
    constants::{LOOP_PERIOD_SECS, intake},
    error::Result,
    motion::filter::LowPass,
    peripherals::{DigitalSensor, IntakeInputs, RangeSensor},
};

// Accumulating the loop period in floating point lands a hair short of the
// dwell time on the exact period it should fire.
const DWELL_EPSILON: f64 = 1e-9;

/// A source of truth for note presence.
pub trait NoteDetector {
    /// Updates the estimate with this period's intake measurements.
    fn detect(&mut self, inputs: &IntakeInputs, dt: f64) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Note present while the beam is blocked, i.e. the line reads low.
#[derive(Debug, Clone)]
pub struct BeamBreak<S> {
    sensor: S,
}

impl<S: DigitalSensor> BeamBreak<S> {
    pub fn new(sensor: S) -> Self { Self { sensor } }
}

impl<S: DigitalSensor> NoteDetector for BeamBreak<S> {
    fn detect(&mut self, _inputs: &IntakeInputs, _dt: f64) -> bool { self.sensor.is_low() }

    fn name(&self) -> &'static str { "beam break" }
}

/// Note present while something is closer than the threshold.
#[derive(Debug, Clone)]
pub struct Rangefinder<S> {
    sensor:           S,
    threshold_inches: f64,
}

impl<S: RangeSensor> Rangefinder<S> {
    /// Uses the default seating distance.
    pub fn new(sensor: S) -> Self { Self::with_threshold(sensor, intake::NOTE_RANGE_INCHES) }

    /// Like [`new`](Self::new), but refuses a sensor that is not plugged in.
    pub fn connected(sensor: S) -> Result<Self> {
        sensor.check_connected()?;
        Ok(Self::new(sensor))
    }

    pub fn with_threshold(sensor: S, threshold_inches: f64) -> Self {
        Self {
            sensor,
            threshold_inches,
        }
    }
}

impl<S: RangeSensor> NoteDetector for Rangefinder<S> {
    fn detect(&mut self, _inputs: &IntakeInputs, _dt: f64) -> bool {
        self.sensor
            .range_inches()
            .is_some_and(|inches| inches < self.threshold_inches)
    }

    fn name(&self) -> &'static str { "rangefinder" }
}

/// Infers presence from the first stage's filtered velocity.
///
/// While the filtered speed is above the minimum, its sign says whether the
/// rollers are intaking (positive) or expelling. Every change of direction
/// restarts a timer. When the timer reaches the dwell time for the current
/// direction, presence flips and the timer stops until the next change.
#[derive(Debug, Clone)]
pub struct VelocitySignature {
    filter:       LowPass,
    min_velocity: f64,
    intake_dwell: f64,
    expel_dwell:  f64,
    intaking:     bool,
    timer:        Option<f64>,
    has_note:     bool,
}

impl VelocitySignature {
    pub fn new() -> Self {
        Self::with_params(
            intake::SIGNATURE_MIN_VELOCITY_RAD,
            intake::SIGNATURE_FILTER_TIME_CONSTANT_SECS,
            intake::SIGNATURE_INTAKE_DWELL_SECS,
            intake::SIGNATURE_EXPEL_DWELL_SECS,
        )
    }

    pub fn with_params(
        min_velocity: f64,
        time_constant: f64,
        intake_dwell: f64,
        expel_dwell: f64,
    ) -> Self {
        Self {
            filter: LowPass::from_time_constant(time_constant, LOOP_PERIOD_SECS),
            min_velocity,
            intake_dwell,
            expel_dwell,
            intaking: false,
            timer: None,
            has_note: false,
        }
    }

    /// Feeds one velocity sample and returns the presence estimate.
    pub fn update(&mut self, velocity: f64, dt: f64) -> bool {
        let filtered = self.filter.push(velocity);
        if let Some(elapsed) = self.timer.as_mut() {
            *elapsed += dt;
        }

        if filtered.abs() > self.min_velocity {
            let intaking = filtered > 0.0;
            if intaking != self.intaking {
                self.intaking = intaking;
                self.timer = Some(0.0);
            }
            let dwell = if self.intaking { self.intake_dwell } else { self.expel_dwell };
            if self
                .timer
                .is_some_and(|elapsed| elapsed >= dwell - DWELL_EPSILON)
            {
                self.has_note = !self.has_note;
                self.timer = None;
            }
        }
        self.has_note
    }
}

impl Default for VelocitySignature {
    fn default() -> Self { Self::new() }
}

impl NoteDetector for VelocitySignature {
    fn detect(&mut self, inputs: &IntakeInputs, dt: f64) -> bool {
        let velocity = inputs.velocity_rad_per_sec.first().copied().unwrap_or(0.0);
        self.update(velocity, dt)
    }

    fn name(&self) -> &'static str { "velocity signature" }
}
