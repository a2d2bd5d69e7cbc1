//! Logging setup for blobtx binaries.

use dotenvy::dotenv;
use std::{env, io::stdout, str::FromStr};
use strum::EnumString;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::LevelFilter, fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Env var naming the file to write logs to.
pub const ENV_LOG_FILE: &str = "BLOBTX_LOG_FILE";
/// Env var naming the directory log files go in.
pub const ENV_LOG_DIR: &str = "BLOBTX_LOG_DIR";
/// Env var selecting the file log format.
pub const ENV_LOG_FORMAT_FILE: &str = "BLOBTX_LOG_FORMAT_FILE";
/// Env var selecting the stdout log format.
pub const ENV_LOG_FORMAT_STDOUT: &str = "BLOBTX_LOG_FORMAT_STDOUT";

#[derive(EnumString, Debug, Default, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A boxed layer for tracing
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Logging options, usually read from the environment with [`LogConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// File name to write logs to. No file logging if empty.
    pub file: String,
    /// Directory for the log file.
    pub dir: String,
    /// Format of the file target, `json` or `text`.
    pub format_file: String,
    /// Format of the stdout target, `json` or `text`.
    pub format_stdout: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            dir: ".".to_string(),
            format_file: "json".to_string(),
            format_stdout: "text".to_string(),
        }
    }
}

impl LogConfig {
    /// Read the config from env vars, after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();
        Self {
            file: env::var(ENV_LOG_FILE).unwrap_or(defaults.file),
            dir: env::var(ENV_LOG_DIR).unwrap_or(defaults.dir),
            format_file: env::var(ENV_LOG_FORMAT_FILE).unwrap_or(defaults.format_file),
            format_stdout: env::var(ENV_LOG_FORMAT_STDOUT).unwrap_or(defaults.format_stdout),
        }
    }
}

/// Initialize logging.
///
/// By default this will initialize INFO text to stdout.
///
/// Env var options:
/// - `BLOBTX_LOG_FILE` - file name to write logs to. If empty, will not write logs to file.
/// - `BLOBTX_LOG_DIR` - directory to write logs to. If empty will write logs to current directory.
/// - `BLOBTX_LOG_FORMAT_FILE` - logging format for file target. Defaults to `json`. One of json,
///   text.
/// - `BLOBTX_LOG_FORMAT_STDOUT` - logging format for stdout target. Defaults to `text`. One of
///   json, text.
///
/// The returned guards flush buffered logs when dropped; keep them alive for the life of the
/// program.
pub fn init_logging() -> eyre::Result<Vec<WorkerGuard>> {
    let config = LogConfig::from_env();

    let log_format_file = LogFormat::from_str(&config.format_file).unwrap_or_default();
    let log_format_stdout = LogFormat::from_str(&config.format_stdout).unwrap_or_default();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(stdout());

    let mut guards = vec![stdout_guard];
    let mut layers: Vec<BoxedLayer<Registry>> =
        vec![apply_layer_format(&log_format_stdout, stdout_writer)];

    if !config.file.is_empty() {
        let appender = RollingFileAppender::new(Rotation::NEVER, &config.dir, &config.file);
        let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
        guards.push(file_guard);
        layers.push(apply_layer_format(&log_format_file, file_writer));
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        BLOBTX_LOG_FILE = config.file,
        BLOBTX_LOG_DIR = config.dir,
        BLOBTX_LOG_FORMAT_FILE = config.format_file,
        BLOBTX_LOG_FORMAT_STDOUT = config.format_stdout,
        RUST_LOG = env::var("RUST_LOG").unwrap_or_default(),
        "Logging options configured via env vars: "
    );

    Ok(guards)
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy()
}

fn apply_layer_format(log_format: &LogFormat, writer: NonBlocking) -> BoxedLayer<Registry> {
    match log_format {
        LogFormat::Json => fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .with_writer(writer)
            .with_filter(env_filter())
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer)
            .with_filter(env_filter())
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::from_str("yaml").unwrap_or_default(), LogFormat::Text);
    }

    #[test]
    fn default_config() {
        let config = LogConfig::default();
        assert!(config.file.is_empty());
        assert_eq!(config.dir, ".");
        assert_eq!(config.format_file, "json");
        assert_eq!(config.format_stdout, "text");
    }
}
