//! Logging setup and SDK log routing.
//!
//! This module provides:
//! - Subscriber initialization with a reloadable filter (`tracing_subscriber::reload`)
//! - Local timezone timestamps for console and file output
//! - Routing of SDK log messages into `tracing` by severity

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use eos_sdk::{LogLevel, LogMessage};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

use crate::error::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "online_eos=info,eos_sdk=warn";

/// Target under which SDK messages are emitted.
pub const SDK_LOG_TARGET: &str = "eos_sdk";

/// File name prefix of the rolling log file.
const LOG_FILE_PREFIX: &str = "online-eos.log";

/// Timer that formats timestamps in the local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Type alias for the reload handle.
pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Options for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Initial filter; `RUST_LOG` wins when set, then this, then
    /// [`DEFAULT_LOG_FILTER`].
    pub filter: Option<String>,
    /// Directory for a daily rolling log file; console only when `None`.
    pub log_dir: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            filter: None,
            log_dir: None,
            ansi: true,
        }
    }
}

/// Handle to the installed subscriber's filter.
pub struct LoggingConfig {
    handle: FilterHandle,
}

impl LoggingConfig {
    /// Get the current filter directive string.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Set a new filter directive.
    ///
    /// # Returns
    /// Error if the directive is invalid.
    pub fn set_filter(&self, directive: &str) -> Result<()> {
        let new_filter = EnvFilter::try_new(directive)
            .map_err(|e| Error::Other(format!("Invalid filter directive: {}", e)))?;

        self.handle
            .reload(new_filter)
            .map_err(|e| Error::Other(format!("Failed to reload filter: {}", e)))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }

    /// Replace the directive for `target`, keeping every other directive.
    pub fn set_target_level(&self, target: &str, level: LevelFilter) -> Result<()> {
        let directive = with_target_level(&self.get_filter(), target, level);
        self.set_filter(&directive)
    }

    /// Like [`set_target_level`](Self::set_target_level), but never makes
    /// `target` quieter than it already is. Returns whether the filter changed.
    pub fn raise_target_level(&self, target: &str, level: LevelFilter) -> Result<bool> {
        match raised_target_level(&self.get_filter(), target, level) {
            Some(directive) => self.set_filter(&directive).map(|()| true),
            None => Ok(false),
        }
    }
}

/// Level currently set for `target` by a `target=level` directive.
fn target_level(current: &str, target: &str) -> Option<LevelFilter> {
    current
        .split(',')
        .filter_map(|d| d.trim().split_once('='))
        .find(|(name, _)| *name == target)
        .and_then(|(_, level)| level.parse().ok())
}

/// The rewritten directive when `level` is more verbose than the current one.
fn raised_target_level(current: &str, target: &str, level: LevelFilter) -> Option<String> {
    match target_level(current, target) {
        Some(existing) if existing >= level => None,
        _ => Some(with_target_level(current, target, level)),
    }
}

/// Rewrite a filter directive string so that `target` logs at `level`.
fn with_target_level(current: &str, target: &str, level: LevelFilter) -> String {
    let prefix = format!("{}=", target);
    let mut directives: Vec<String> = current
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != target && !d.starts_with(&prefix))
        .map(String::from)
        .collect();
    directives.push(format!("{}={}", target, level.to_string().to_lowercase()));
    directives.join(",")
}

/// Initialize logging with a reloadable filter.
///
/// # Returns
/// Tuple of (LoggingConfig, WorkerGuard) - keep the guard alive for the app
/// lifetime; there is no guard without a log directory.
pub fn init_logging(options: &LoggingOptions) -> Result<(Arc<LoggingConfig>, Option<WorkerGuard>)> {
    let initial_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = options.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter);

    let (file_layer, guard) = match &options.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_ansi(options.ansi)
                .with_timer(LocalTimer),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to set global default subscriber: {}", e)))?;

    let config = Arc::new(LoggingConfig {
        handle: filter_handle,
    });

    Ok((config, guard))
}

/// Severity an SDK message is logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
    Info,
    Debug,
}

impl Severity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

/// SDK level to severity. Levels mapped to `None` are dropped.
const SEVERITY_TABLE: [(LogLevel, Option<Severity>); 7] = [
    (LogLevel::Off, None),
    (LogLevel::Fatal, Some(Severity::Error)),
    (LogLevel::Error, Some(Severity::Error)),
    (LogLevel::Warning, Some(Severity::Warn)),
    (LogLevel::Info, Some(Severity::Info)),
    (LogLevel::Verbose, Some(Severity::Debug)),
    (LogLevel::VeryVerbose, Some(Severity::Debug)),
];

pub fn severity_of(level: LogLevel) -> Option<Severity> {
    SEVERITY_TABLE
        .iter()
        .find(|(sdk_level, _)| *sdk_level == level)
        .and_then(|(_, severity)| *severity)
}

/// Forward one SDK message to `tracing`. Installed as the SDK log callback.
pub fn route_sdk_message(message: &LogMessage) {
    let Some(severity) = severity_of(message.level) else {
        return;
    };
    let category = message.category.as_str();
    let text = message.message.as_str();
    match severity {
        Severity::Error => tracing::error!(target: SDK_LOG_TARGET, category, "{}", text),
        Severity::Warn => tracing::warn!(target: SDK_LOG_TARGET, category, "{}", text),
        Severity::Info => tracing::info!(target: SDK_LOG_TARGET, category, "{}", text),
        Severity::Debug => tracing::debug!(target: SDK_LOG_TARGET, category, "{}", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("online_eos=info"));
        assert!(DEFAULT_LOG_FILTER.contains("eos_sdk=warn"));
    }

    #[rstest]
    #[case(LogLevel::Off, None)]
    #[case(LogLevel::Fatal, Some(Severity::Error))]
    #[case(LogLevel::Error, Some(Severity::Error))]
    #[case(LogLevel::Warning, Some(Severity::Warn))]
    #[case(LogLevel::Info, Some(Severity::Info))]
    #[case(LogLevel::Verbose, Some(Severity::Debug))]
    #[case(LogLevel::VeryVerbose, Some(Severity::Debug))]
    fn test_severity_table(#[case] level: LogLevel, #[case] expected: Option<Severity>) {
        assert_eq!(severity_of(level), expected);
    }

    #[test]
    fn test_with_target_level_replaces_existing_directive() {
        let updated = with_target_level("online_eos=info,eos_sdk=warn", "eos_sdk", LevelFilter::DEBUG);
        assert_eq!(updated, "online_eos=info,eos_sdk=debug");

        let added = with_target_level("online_eos=info", "eos_sdk", LevelFilter::ERROR);
        assert_eq!(added, "online_eos=info,eos_sdk=error");
    }

    #[rstest]
    #[case("online_eos=info,eos_sdk=warn", LevelFilter::ERROR, None)]
    #[case("online_eos=info,eos_sdk=warn", LevelFilter::WARN, None)]
    #[case(
        "online_eos=info,eos_sdk=warn",
        LevelFilter::DEBUG,
        Some("online_eos=info,eos_sdk=debug")
    )]
    #[case("online_eos=info", LevelFilter::ERROR, Some("online_eos=info,eos_sdk=error"))]
    fn test_target_level_is_only_raised(
        #[case] current: &str,
        #[case] level: LevelFilter,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            raised_target_level(current, "eos_sdk", level).as_deref(),
            expected
        );
    }
}
