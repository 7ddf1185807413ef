//! Per-actuator controllers.
//!
//! Every controller owns its IO and runs one `periodic(enabled)` step per
//! loop period:
//!
//! 1. Read the sensors into the controller's inputs snapshot.
//! 2. Push any tunable that changed since the last period.
//! 3. Pick a setpoint from the current mode or goal.
//! 4. Compute and clamp the output.
//! 5. Write the voltage.
//!
//! A disabled period always writes 0 V, drops the mode back to stopped and
//! clears controller history, all on that same period.
//!
//! # Example
//!
//! ```
//! use talos::{
//!     constants::Deployment,
//!     mechanism::shooter::{Shooter, ShooterMode},
//!     peripherals::sim::ShooterIoSim,
//!     tunable::TunableStore,
//! };
//!
//! let store = TunableStore::new();
//! let mut shooter = Shooter::new(ShooterIoSim::new(), &store, Deployment::Sim);
//! shooter.set_shoot();
//! shooter.periodic(true);
//! assert!(shooter.voltage_command() > 0.0);
//!
//! shooter.periodic(false);
//! assert_eq!(shooter.mode(), ShooterMode::Stopped);
//! ```

/// Profiled position control of the shoulder.
///
/// Provides [`Arm`](arm::Arm) along with the [`soft_limit`](arm::soft_limit)
/// rule it applies every period.
pub mod arm;

/// Flywheel velocity control.
pub mod shooter;

/// Indexer roller velocity control.
pub mod indexer;

/// Open-loop intake rollers with note detection.
pub mod intake;

/// Note presence detectors.
///
/// One [`NoteDetector`](presence::NoteDetector) trait with beam break,
/// rangefinder and velocity signature implementations.
pub mod presence;
