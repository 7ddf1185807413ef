//! # Talos
//!
//! Talos is the actuator control core of a note-scoring competition robot.
//! It runs the same controllers on the robot (through [Vexide](https://vexide.dev),
//! behind the `v5` feature) and on a desktop physics simulation:
//!
//! - **Arm**: Trapezoid-profiled PID on the shoulder with soft limits and a
//!   goal-reached latch.
//! - **Shooter and Indexer**: Feedforward velocity control selected by mode.
//! - **Intake**: Open-loop rollers with note detection by beam break,
//!   rangefinder or roller speed signature.
//! - **Tunables**: Named numbers editable at runtime, with per-consumer change
//!   tracking.
//! - **Aiming**: The arm angle for a shot from the robot's pose.
//! - **Logging**: A console and file logger.
//!
//! ## Quick Start
//!
//! ```
//! use talos::{superstructure::Superstructure, tunable::TunableStore};
//!
//! let store = TunableStore::new();
//! let mut robot = Superstructure::simulated(&store);
//! robot.arm_mut().set_target_pos(45.0).unwrap();
//! robot.collect();
//! for _ in 0..250 {
//!     robot.periodic(true);
//! }
//! assert!(robot.arm().reached_goal());
//! assert!(robot.intake().has_note());
//! ```
//!
//! ## Modules
//!
//! - [`superstructure`]: All controllers ticked together, plus the shot
//!   sequence.
//! - [`mechanism`]: The four controllers and note detection.
//! - [`peripherals`]: IO traits with simulated and hardware backends.
//! - [`motion`]: PID, motion profiles, feedforward and filters.
//! - [`tunable`]: Runtime-editable numbers.
//! - [`aim`]: Shot angle from distance or pose.
//! - [`fs`]: Logging.

/// Fixed robot parameters.
///
/// Gains, speeds, gear ratios and field dimensions. Tunable values here are
/// only defaults.
pub mod constants;

/// Crate error type.
pub mod error;

/// Runtime-editable numbers.
///
/// Provides [`TunableStore`](tunable::TunableStore) and
/// [`TunableNumber`](tunable::TunableNumber) with per-consumer change
/// detection.
pub mod tunable;

/// Control building blocks.
///
/// - **PID**: With integral clamping and derivative from the second sample.
/// - **Trapezoid Profile**: Velocity and acceleration bounded motion.
/// - **Profiled PID**: A PID that tracks a moving profile setpoint.
/// - **Feedforward**: Static plus velocity voltage model.
/// - **Low Pass**: Exponential smoothing.
pub mod motion;

/// Hardware abstraction.
///
/// One IO trait per mechanism, with physics simulations and (behind `v5`)
/// Vexide device implementations.
pub mod peripherals;

/// Mechanism controllers.
///
/// [`Arm`](mechanism::arm::Arm), [`Shooter`](mechanism::shooter::Shooter),
/// [`Indexer`](mechanism::indexer::Indexer) and
/// [`Intake`](mechanism::intake::Intake), plus note detectors.
pub mod mechanism;

/// Shot angle from distance or pose.
pub mod aim;

/// The whole robot.
pub mod superstructure;

/// Filesystem utilities module.
///
/// Contains the logger that records controller events to the console and
/// to `log.txt`.
pub mod fs;
