//! xlsutils-logging: logging configuration shared by the command-line tools
//!
//! A [`LogSettings`] value is built once from the command line and turned into
//! a `tracing` subscriber. Binaries install it around their work with
//! `tracing::subscriber::with_default`, so nothing is registered process-wide.

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Diagnostic verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Parse a level name (`DEBUG`, `INFO`, `WARN`, `ERROR`, any case).
    /// Unknown names fall back to `Error`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    pub fn as_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
        }
    }

    fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Label announced on stdout when a verbose level is selected
    pub fn banner(self) -> Option<&'static str> {
        match self {
            LogLevel::Debug => Some("DEBUG"),
            LogLevel::Info => Some("INFO"),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_level())
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LogLevel,
    /// Environment variable that may override `level` with a full filter
    pub env_var: &'static str,
}

impl LogSettings {
    pub fn new(level: LogLevel, env_var: &'static str) -> Self {
        Self { level, env_var }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(self.env_var)
            .unwrap_or_else(|_| EnvFilter::new(self.level.filter_directive()))
    }

    /// Subscriber writing `<timestamp> - <LEVEL> - <message>` lines to stderr
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .event_format(DashFormat)
            .finish()
    }
}

/// `2024-03-01 12:30:00,123 - INFO - message key=value`
struct DashFormat;

impl<S, N> FormatEvent<S, N> for DashFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now();
        write!(
            writer,
            "{} - {} - ",
            now.format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
