//! Leveled debug printing macros
//!
//! Thread-safe stderr output with an env-driven level gate, kept free of
//! third-party machinery so the core crate stays dependency-less.
//!
//! # Environment Variables
//!
//! - `JOBPOOL_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5)
//! - `JOBPOOL_FLUSH_EPRINT=1` - flush stderr after each line (useful when
//!   debugging crashes)
//!
//! # Usage
//!
//! ```ignore
//! use jobpool_core::{jinfo, jdebug, jwarn};
//!
//! jinfo!("pool running with {} slots", slots);
//! jdebug!("minion {} extracted job {}", slot, id);
//! jwarn!("unexpected state: {:?}", state);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Log levels, most severe first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }

    fn parse(value: &str) -> LogLevel {
        match value.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Warn,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the level and flush gates from the environment
///
/// Runs automatically on first log; call explicitly for deterministic
/// startup.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Ok(value) = std::env::var("JOBPOOL_LOG_LEVEL") {
        LOG_LEVEL.store(LogLevel::parse(&value) as u8, Ordering::Relaxed);
    }
    if let Ok(value) = std::env::var("JOBPOOL_FLUSH_EPRINT") {
        let flush = matches!(value.as_str(), "1" | "true" | "yes" | "on");
        FLUSH_ENABLED.store(flush, Ordering::Relaxed);
    }
}

/// Set the level gate programmatically
pub fn set_log_level(level: LogLevel) {
    INITIALIZED.store(true, Ordering::SeqCst);
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Check if a level passes the gate
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Internal: leveled line to locked stderr
#[doc(hidden)]
pub fn _jlog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = write!(handle, "{} ", level.prefix());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if FLUSH_ENABLED.load(Ordering::Relaxed) {
        let _ = handle.flush();
    }
}

/// Error level log
#[macro_export]
macro_rules! jerror {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl($crate::jprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log
#[macro_export]
macro_rules! jwarn {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl($crate::jprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log
#[macro_export]
macro_rules! jinfo {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl($crate::jprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log
#[macro_export]
macro_rules! jdebug {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl($crate::jprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log (most verbose)
#[macro_export]
macro_rules! jtrace {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl($crate::jprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}
