//! Process-wide tracing setup for the registry binaries.
//!
//! Settings come from the environment:
//!
//! - `LOG_LEVEL`: filter used when `RUST_LOG` is unset (default `info`)
//! - `LOG_FORMAT`: `human` or `json` (default `human`)
//! - `LOG_OUTPUT`: `console`, `file` or `both` (default `console`)
//! - `LOG_FILE_PATH`: file used for file output, rolled daily
//!   (default `/tmp/npm-registry.log`)

use std::{env, path::PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, registry, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Where formatted events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Console,
        }
    }

    fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub output: LogOutput,
    pub file_path: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            output: LogOutput::Console,
            file_path: PathBuf::from("/tmp/npm-registry.log"),
        }
    }
}

impl LogSettings {
    /// Read settings from `LOG_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: lookup("LOG_LEVEL").unwrap_or(defaults.level),
            json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            output: lookup("LOG_OUTPUT")
                .map(|o| LogOutput::parse(&o))
                .unwrap_or(defaults.output),
            file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        match ("hyper=warn".parse(), "tower_http=info".parse()) {
            (Ok(hyper), Ok(tower)) => filter.add_directive(hyper).add_directive(tower),
            _ => filter,
        }
    }
}

fn fmt_layer<W>(writer: W, json: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.pretty().boxed()
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process when file output is enabled. Installing twice is a
/// no-op.
pub fn init_subscriber(settings: &LogSettings) -> Option<WorkerGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if settings.output.to_console() {
        layers.push(fmt_layer(std::io::stdout, settings.json));
    }

    if settings.output.to_file() {
        let dir = settings
            .file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = settings
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "npm-registry.log".into());

        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        layers.push(fmt_layer(writer, settings.json));
    }

    if registry()
        .with(layers)
        .with(settings.env_filter())
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already installed");
    }

    guard
}
