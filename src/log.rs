//! File logging for beadplan runs.
//!
//! Lines go to `~/.beadplan/beadplan.log` as `[HH:MM:SS.mmm] [LEVEL] msg`.
//! Console output meant for the user is printed separately by the binary.
//!
//! The threshold defaults to INFO. `--debug` or `BEADPLAN_DEBUG=1` lowers it
//! to DEBUG; `BEADPLAN_LOG=<level>` picks any level and wins over both.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

const LOG_FILE: &str = "beadplan.log";

static SINK: OnceLock<PathBuf> = OnceLock::new();
static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown log level {:?}", s))
    }
}

/// Directory holding the log file: ~/.beadplan
pub fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".beadplan"))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Level picked from the `--debug` flag and the environment.
pub fn resolve_level(debug: bool) -> LogLevel {
    if let Some(level) = std::env::var("BEADPLAN_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        return level;
    }
    if debug || env_flag("BEADPLAN_DEBUG") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Set the threshold and start a fresh log file for this run.
pub fn init_with_debug(debug: bool) {
    set_level(resolve_level(debug));

    let Some(dir) = log_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let path = dir.join(LOG_FILE);
    if File::create(&path).is_ok() {
        let _ = SINK.set(path);
    }
}

pub fn set_level(level: LogLevel) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> LogLevel {
    let raw = THRESHOLD.load(Ordering::Relaxed) as usize;
    LogLevel::ALL[raw.min(LogLevel::ALL.len() - 1)]
}

/// Whether a message at `level` would be written.
pub fn enabled(level: LogLevel) -> bool {
    level <= get_level() && SINK.get().is_some()
}

/// Write one line. Does nothing before [`init_with_debug`] or when `level`
/// is above the threshold, so the arguments are never formatted in that case.
pub fn write(level: LogLevel, args: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }
    let Some(path) = SINK.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().append(true).open(path) {
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] [{}] {}", stamp, level, args);
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __bplog_at {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::write($level, format_args!($($arg)*))
    };
}

/// Log at INFO.
#[macro_export]
macro_rules! bplog {
    ($($arg:tt)*) => { $crate::__bplog_at!($crate::log::LogLevel::Info, $($arg)*) };
}

#[macro_export]
macro_rules! bplog_error {
    ($($arg:tt)*) => { $crate::__bplog_at!($crate::log::LogLevel::Error, $($arg)*) };
}

#[macro_export]
macro_rules! bplog_warn {
    ($($arg:tt)*) => { $crate::__bplog_at!($crate::log::LogLevel::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! bplog_debug {
    ($($arg:tt)*) => { $crate::__bplog_at!($crate::log::LogLevel::Debug, $($arg)*) };
}

/// Log at TRACE; used for raw tracker output.
#[macro_export]
macro_rules! bplog_trace {
    ($($arg:tt)*) => { $crate::__bplog_at!($crate::log::LogLevel::Trace, $($arg)*) };
}
