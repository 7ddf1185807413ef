//! Filesystem utilities.
//!
//! On the Brain the working directory is the SD card root, in simulation it
//! is wherever the binary was started from.
//!
//! # Logging
//!
//! The `logger` submodule provides a logger that writes to `log.txt` as well
//! as the console. Install it before building any controller so their
//! construction messages are kept.
//!
//! # Example
//!
//! ```no_run
//! use log::{LevelFilter, info};
//! use talos::fs::logger;
//!
//! logger::init(LevelFilter::Debug).expect("Failed to initialize logger");
//! info!("Robot initialized successfully");
//! ```

/// Console and file logging.
///
/// Provides a logger implementation that writes to both the console
/// and `log.txt`.
pub mod logger;
