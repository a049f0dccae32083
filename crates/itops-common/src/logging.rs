//! Logging configuration and subscriber construction
//!
//! Logging is assembled once from a [`LogConfig`] into a [`Telemetry`] handle.
//! Nothing here touches process-wide state: the caller decides whether to
//! install the handle as the global default (the binary does, so third-party
//! crates are captured) and passes clones of it to the components that log.
//!
//! Supported:
//!
//! - Console, file, or both
//! - Text or JSON output
//! - Daily rotating log files
//! - Extra `EnvFilter` directives per module
//!
//! # Conventions
//!
//! Use the structured `tracing` macros with fields, never `println!`:
//!
//! ```rust
//! use tracing::{info, warn};
//!
//! let user_id = 42;
//! info!(user_id, "Roles assigned");
//! warn!(error = "connection reset", "Failed to record audit entry");
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{Dispatch, Level, Subscriber};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    EnvFilter, Layer,
};

use crate::telemetry::Telemetry;

/// Severity threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }

        // `Level` already accepts names and numeric levels in any case.
        let level: Level = name.parse().map_err(|_| unknown("log level", s))?;
        Ok(match level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            _ => LogLevel::Error,
        })
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.to_tracing_level(), f)
    }
}

fn unknown(what: &str, value: &str) -> anyhow::Error {
    anyhow::anyhow!("Invalid {}: {}", what, value)
}

/// Where formatted events are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl std::str::FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(unknown("log output", s)),
        }
    }
}

/// Line encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(unknown("log format", s)),
        }
    }
}

/// Everything [`init_logging`] needs to assemble a subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default verdict for targets without a directive
    pub level: LogLevel,
    pub output: LogOutput,
    pub format: LogFormat,

    /// Where daily files are rotated; ignored for console-only output
    pub log_dir: PathBuf,

    /// File stem, suffixed with the date by the appender
    pub log_file_prefix: String,

    /// Comma separated `EnvFilter` directives layered over `level`
    pub filter_directives: Option<String>,

    pub include_location: bool,
    pub include_thread_ids: bool,
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            output: LogOutput::default(),
            format: LogFormat::default(),
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "itops".into(),
            filter_directives: None,
            include_location: false,
            include_thread_ids: false,
            include_targets: true,
        }
    }
}

impl LogConfig {
    /// Defaults overlaid with the `LOG_*` environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlay `LOG_*` variables on this configuration
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LOG_LEVEL` | `level` (trace, debug, info, warn, error) |
    /// | `LOG_OUTPUT` | `output` (console, file, both) |
    /// | `LOG_FORMAT` | `format` (text, json) |
    /// | `LOG_DIR` | `log_dir` |
    /// | `LOG_FILE_PREFIX` | `log_file_prefix` |
    /// | `LOG_FILTER` | `filter_directives` |
    /// | `LOG_INCLUDE_LOCATION`, `LOG_INCLUDE_THREAD_IDS`, `LOG_INCLUDE_TARGETS` | the `include_*` flags |
    ///
    /// Unparseable enum values are errors; unparseable flags keep their value.
    pub fn merge_env(mut self) -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok();
        let flag = |name: &str, default: bool| {
            var(name).map_or(default, |v| v.trim().parse().unwrap_or(default))
        };

        if let Some(v) = var("LOG_LEVEL") {
            self.level = v.parse()?;
        }
        if let Some(v) = var("LOG_OUTPUT") {
            self.output = v.parse()?;
        }
        if let Some(v) = var("LOG_FORMAT") {
            self.format = v.parse()?;
        }
        if let Some(v) = var("LOG_DIR") {
            self.log_dir = v.into();
        }
        if let Some(v) = var("LOG_FILE_PREFIX") {
            self.log_file_prefix = v;
        }
        if let Some(v) = var("LOG_FILTER") {
            self.filter_directives = Some(v);
        }

        self.include_location = flag("LOG_INCLUDE_LOCATION", self.include_location);
        self.include_thread_ids = flag("LOG_INCLUDE_THREAD_IDS", self.include_thread_ids);
        self.include_targets = flag("LOG_INCLUDE_TARGETS", self.include_targets);

        Ok(self)
    }

    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder(Self::default())
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let base = EnvFilter::builder()
            .with_default_directive(self.level.to_tracing_level().into())
            .parse_lossy("");

        self.filter_directives
            .iter()
            .flat_map(|d| d.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .try_fold(base, |filter, directive| {
                let directive = directive
                    .parse::<Directive>()
                    .with_context(|| format!("Invalid log filter directive `{directive}`"))?;
                Ok(filter.add_directive(directive))
            })
    }
}

/// Fluent construction of a [`LogConfig`] starting from its defaults
pub struct LogConfigBuilder(LogConfig);

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.0.level = level;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.0.output = output;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.0.format = format;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.0.log_dir = dir.into();
        self
    }

    pub fn log_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.0.log_file_prefix = prefix.into();
        self
    }

    pub fn filter_directives(mut self, directives: impl Into<String>) -> Self {
        self.0.filter_directives = Some(directives.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.0
    }
}

/// Build the telemetry handle described by `config`
///
/// The returned handle owns the file writer guard (if any); keep it alive for
/// as long as logs should be flushed.
pub fn init_logging(config: &LogConfig) -> Result<Telemetry> {
    let filter = config.env_filter()?;

    let (to_console, to_file) = match config.output {
        LogOutput::Console => (true, false),
        LogOutput::File => (false, true),
        LogOutput::Both => (true, true),
    };

    let mut layers = Vec::new();
    if to_console {
        layers.push(fmt_layer(config, std::io::stdout, true));
    }

    let mut guard = None;
    if to_file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Cannot create log directory {}", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(config, writer, false));
        guard = Some(file_guard);
    }

    let dispatch = Dispatch::new(tracing_subscriber::registry().with(filter).with(layers));

    Ok(match guard {
        Some(guard) => Telemetry::with_guard(dispatch, guard),
        None => Telemetry::new(dispatch),
    })
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(config.include_targets)
        .with_thread_ids(config.include_thread_ids)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
