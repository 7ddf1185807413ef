//! The four controllers wired together as one robot.
//!
//! [`Superstructure`] owns an [`Arm`], a [`Shooter`], an [`Indexer`] and an
//! [`Intake`] behind boxed IO, ticks them in a fixed order and runs the
//! spin-up-then-feed shot sequence that needs all of them.
//!
//! # Example
//!
//! ```
//! use talos::{
//!     aim::geo::{Alliance, Pose},
//!     superstructure::Superstructure,
//!     tunable::TunableStore,
//! };
//!
//! let mut robot = Superstructure::simulated(&TunableStore::new());
//! let angle = robot.aim_at_speaker(Pose::new(1.5, 5.5479, 0.0), Alliance::Blue).unwrap();
//! for _ in 0..200 {
//!     robot.periodic(true);
//! }
//! assert!((robot.arm().angle_deg() - angle).abs() < 2.0);
//! ```

use log::{debug, info};
use serde::Serialize;

use crate::{
    aim::{
        self,
        geo::{Alliance, Pose},
    },
    constants::{Deployment, LOOP_PERIOD_SECS},
    error::Result,
    mechanism::{
        arm::{Arm, ArmTelemetry},
        indexer::{Indexer, IndexerTelemetry},
        intake::{Intake, IntakeTelemetry},
        presence::{NoteDetector, VelocitySignature},
        shooter::{Shooter, ShooterTelemetry},
    },
    peripherals::{
        ArmIo, IndexerIo, IntakeIo, ShooterIo,
        sim::{ArmIoSim, IndexerIoSim, IntakeIoSim, ShooterIoSim},
    },
    tunable::TunableStore,
};

/// Progress of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ShotPhase {
    /// No shot in progress.
    Idle,
    /// Flywheels are spinning up; `elapsed` seconds so far.
    SpinningUp { elapsed: f64 },
    /// The note is being fed into the flywheels.
    Feeding,
}

/// A snapshot of every controller after a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub enabled: bool,
    pub shot:    ShotPhase,
    pub arm:     ArmTelemetry,
    pub shooter: ShooterTelemetry,
    pub indexer: IndexerTelemetry,
    pub intake:  IntakeTelemetry,
}

/// Every actuator on the robot.
pub struct Superstructure {
    arm:     Arm,
    shooter: Shooter,
    indexer: Indexer,
    intake:  Intake,
    shot:    ShotPhase,
    enabled: bool,
}

impl Superstructure {
    /// Wires up the controllers around the given IO.
    ///
    /// All tunables are registered in `store`.
    pub fn new(
        arm_io: Box<dyn ArmIo>,
        shooter_io: Box<dyn ShooterIo>,
        indexer_io: Box<dyn IndexerIo>,
        intake_io: Box<dyn IntakeIo>,
        detector: Box<dyn NoteDetector>,
        store: &TunableStore,
        deployment: Deployment,
    ) -> Self {
        info!("Building superstructure ({:?})", deployment);
        Self {
            arm:     Arm::new(arm_io, store),
            shooter: Shooter::new(shooter_io, store, deployment),
            indexer: Indexer::new(indexer_io, store, deployment),
            intake:  Intake::new(intake_io, detector, store),
            shot:    ShotPhase::Idle,
            enabled: false,
        }
    }

    /// A fully simulated robot that detects notes by roller speed.
    pub fn simulated(store: &TunableStore) -> Self {
        Self::new(
            Box::new(ArmIoSim::new()),
            Box::new(ShooterIoSim::new()),
            Box::new(IndexerIoSim::new()),
            Box::new(IntakeIoSim::new()),
            Box::new(VelocitySignature::new()),
            store,
            Deployment::Sim,
        )
    }

    /// Runs one period of every controller.
    ///
    /// The shot sequence advances first so the controllers act on its
    /// decisions in the same period. Disabling cancels any shot.
    pub fn periodic(&mut self, enabled: bool) {
        if enabled != self.enabled {
            info!("Robot {}", if enabled { "enabled" } else { "disabled" });
            self.enabled = enabled;
        }

        if enabled {
            self.advance_shot();
        } else if self.shot != ShotPhase::Idle {
            debug!("Shot cancelled by disable");
            self.shot = ShotPhase::Idle;
        }

        self.arm.periodic(enabled);
        self.shooter.periodic(enabled);
        self.indexer.periodic(enabled);
        self.intake.periodic(enabled);
    }

    fn advance_shot(&mut self) {
        if let ShotPhase::SpinningUp { elapsed } = self.shot {
            let elapsed = elapsed + LOOP_PERIOD_SECS;
            if elapsed >= self.shooter.spin_duration_secs() - 1e-9 {
                info!(
                    "Feeding note at {:.0} rpm after {:.2} s",
                    self.shooter.velocity_rpm(),
                    elapsed
                );
                self.intake.digest();
                self.indexer.index();
                self.shot = ShotPhase::Feeding;
            } else {
                self.shot = ShotPhase::SpinningUp { elapsed };
            }
        }
    }

    /// Points the arm at the alliance's speaker from `pose`.
    ///
    /// Returns the commanded angle in degrees. Fails without moving the arm
    /// when the robot is too close for the aiming curve or the angle falls
    /// outside the arm's travel.
    pub fn aim_at_speaker(&mut self, pose: Pose, alliance: Alliance) -> Result<f64> {
        let angle = aim::angle_to_speaker(pose, alliance)?;
        self.arm.set_target_pos(angle)?;
        debug!("Aiming at {:?} speaker: {:.1} deg", alliance, angle);
        Ok(angle)
    }

    /// Spins the flywheels up and feeds the note once they had time to
    /// reach speed.
    pub fn begin_shot(&mut self) {
        self.shooter.set_shoot();
        self.shot = ShotPhase::SpinningUp { elapsed: 0.0 };
    }

    /// Stops the shot and every roller involved in it.
    pub fn end_shot(&mut self) {
        self.shooter.stop();
        self.indexer.stop();
        self.intake.stop();
        self.shot = ShotPhase::Idle;
    }

    /// Runs the intake until a note is held.
    pub fn collect(&mut self) {
        if self.intake.has_note() {
            debug!("Already holding a note");
            return;
        }
        self.intake.eat();
    }

    pub fn shot_phase(&self) -> ShotPhase { self.shot }

    pub fn arm(&self) -> &Arm { &self.arm }

    pub fn arm_mut(&mut self) -> &mut Arm { &mut self.arm }

    pub fn shooter(&self) -> &Shooter { &self.shooter }

    pub fn shooter_mut(&mut self) -> &mut Shooter { &mut self.shooter }

    pub fn indexer(&self) -> &Indexer { &self.indexer }

    pub fn indexer_mut(&mut self) -> &mut Indexer { &mut self.indexer }

    pub fn intake(&self) -> &Intake { &self.intake }

    pub fn intake_mut(&mut self) -> &mut Intake { &mut self.intake }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            enabled: self.enabled,
            shot:    self.shot,
            arm:     self.arm.telemetry(),
            shooter: self.shooter.telemetry(),
            indexer: self.indexer.telemetry(),
            intake:  self.intake.telemetry(),
        }
    }

    /// [`telemetry`](Self::telemetry) as a JSON object.
    pub fn to_json(&self) -> String {
        // plain numbers, flags and unit enums; serializing cannot fail
        serde_json::to_string(&self.telemetry()).unwrap_or_default()
    }
}
