//! Diagnostic logging
//!
//! The library logs through the `log` facade. The binary installs the stderr
//! backend below with a level taken from the command line or config file.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// Log levels, lowest to highest verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    All = 5,
}

impl LogLevel {
    /// Create a LogLevel from an integer, clamping out-of-range values
    pub fn from_i32(level: i32) -> Self {
        match level {
            i32::MIN..=0 => LogLevel::Nothing,
            1 => LogLevel::Error,
            2 => LogLevel::Warning,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::All,
        }
    }

    /// Parse a level name as written in the config file
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nothing" | "off" | "none" => Some(LogLevel::Nothing),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "all" | "trace" => Some(LogLevel::All),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Warning
    }
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr logger.
///
/// Returns false if another logger was already installed; the level is
/// applied either way.
pub fn init(level: LogLevel) -> bool {
    let installed = log::set_logger(&LOGGER).is_ok();
    log::set_max_level(level.to_filter());
    installed
}
