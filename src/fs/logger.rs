//! Dual-sink logger for the control core.
//!
//! Implements the [`log`] facade, writing every record to the console and to
//! `log.txt` in the working directory (the SD card root on the Brain).
//!
//! Each line carries the level, the time since the program started, the
//! target module and the message:
//!
//! ```text
//! INFO [2m 5s 120ms] talos::mechanism::arm - Arm reached goal 45.0 deg at 44.2 deg
//! WARN [2m 5s 140ms] talos::peripherals::v5 - Failed to read shooter top motor velocity. Error: ...
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use log::{LevelFilter, info};
//! use talos::fs::logger;
//!
//! logger::init(LevelFilter::Debug).expect("logger already installed");
//! info!("Program started");
//! ```

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::{Mutex, OnceLock, PoisonError},
    time::Duration,
};

use humantime::format_duration;
use log::{LevelFilter, Metadata, Record, SetLoggerError, warn};

/// Name of the log file.
pub const LOG_FILE: &str = "log.txt";

/// Writes log records to the console and to a file.
///
/// The file is truncated when the logger is created. If it cannot be opened
/// (no SD card, read-only directory) the logger keeps going console-only.
pub struct TalosLogger {
    file_writer: Mutex<Option<BufWriter<File>>>,
}

impl TalosLogger {
    /// Creates a logger writing to `path` as well as the console.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
        }
    }

    /// Whether records also reach a file.
    pub fn has_file(&self) -> bool {
        self.file_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Renders one record the way it is written to both sinks.
pub fn format_line(record: &Record, uptime: Duration) -> String {
    format!(
        "{} [{}] {} - {}\n",
        record.level(),
        format_duration(truncate_to_millis(uptime)),
        record.target(),
        record.args()
    )
}

fn truncate_to_millis(d: Duration) -> Duration { Duration::from_millis(d.as_millis() as u64) }

impl log::Log for TalosLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record, uptime());
        print!("{}", line);

        let mut guard = self.file_writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = guard.as_mut() {
            let _ = writer.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let mut guard = self.file_writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = guard.as_mut() {
            let _ = writer.flush();
        }
    }
}

static LOGGER: OnceLock<TalosLogger> = OnceLock::new();

/// Installs the logger as the global [`log`] backend.
///
/// Call once, before the first controller is built. Records below `level`
/// are dropped.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| TalosLogger::new(LOG_FILE));
    log::set_logger(logger)?;
    log::set_max_level(level);
    if !logger.has_file() {
        warn!("Could not open {}, logging to console only", LOG_FILE);
    }
    Ok(())
}

/// Time since the user program started.
#[cfg(feature = "v5")]
pub fn uptime() -> Duration { vexide::time::user_uptime() }

/// Time since the first log record or call to this function.
#[cfg(not(feature = "v5"))]
pub fn uptime() -> Duration {
    static START: OnceLock<std::time::Instant> = OnceLock::new();
    START.get_or_init(std::time::Instant::now).elapsed()
}

#[cfg(test)]
mod tests {
    use log::{Level, Log};

    use super::*;

    #[test]
    fn line_has_level_time_target_and_message() {
        let line = format_line(
            &Record::builder()
                .level(Level::Warn)
                .target("talos::mechanism::arm")
                .args(format_args!("Arm target {} deg rejected", 95))
                .build(),
            Duration::from_micros(65_020_700),
        );
        assert_eq!(
            line,
            "WARN [1m 5s 20ms] talos::mechanism::arm - Arm target 95 deg rejected\n"
        );
    }

    #[test]
    fn missing_directory_falls_back_to_console() {
        let logger = TalosLogger::new("/nonexistent-dir/for/talos/log.txt");
        assert!(!logger.has_file());
        logger.flush();
    }

    #[test]
    fn uptime_moves_forward() {
        let a = uptime();
        let b = uptime();
        assert!(b >= a);
    }

    #[test]
    #[ignore = "filesystem access needed (file write)"]
    fn log_full_test() {
        init(LevelFilter::Trace).expect("Failed to initialize logger");
        log::info!("This is an info message");
        log::logger().flush();
        assert!(log::logger().enabled(&Metadata::builder().level(Level::Error).target("test").build()));
    }
}
