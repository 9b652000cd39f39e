use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

/// Default file stem for the rolling log; dated suffixes are appended per day.
pub const DEFAULT_LOG_FILE: &str = "partlink.log";

/// Keeps the non-blocking file writer alive; drop it only at process exit.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Environment variable that overrides the configured level with a full filter directive.
pub const LOG_ENV_VAR: &str = "PARTLINK_LOG";

/// Installs the global subscriber. Console output goes to stderr so command
/// output on stdout (search results, JSON) stays machine-readable.
pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir().to_path_buf();
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let env_filter = build_filter(config)?;
    let (file_writer, file_guard) = build_file_writer(config, &log_dir)?;
    let writer = match (config.stdout, file_writer) {
        (true, Some(file)) => BoxMakeWriter::new(std::io::stderr.and(file)),
        (false, Some(file)) => BoxMakeWriter::new(file),
        (_, None) => BoxMakeWriter::new(std::io::stderr),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let directive = std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.as_filter_directive().to_string());
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::ParseLevel {
        level: directive,
        source,
    })
}

fn build_file_writer(
    config: &LoggingConfig,
    log_dir: &Path,
) -> Result<(Option<NonBlocking>, Option<WorkerGuard>), LoggingError> {
    let max_files = config.max_log_files.max(1);
    let file_stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    cleanup_old_logs(log_dir, file_stem, max_files)?;

    let appender = tracing_appender::rolling::daily(log_dir, file_stem);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    Ok((Some(non_blocking), Some(guard)))
}

fn cleanup_old_logs(dir: &Path, file_stem: &str, max_files: usize) -> Result<(), LoggingError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(file_stem) {
                entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(|mtime| (entry.path(), mtime))
            } else {
                None
            }
        })
        .collect();

    entries.sort_by_key(|(_, modified)| *modified);
    if entries.len() <= max_files {
        return Ok(());
    }

    let remove_count = entries.len() - max_files;
    for (path, _) in entries.into_iter().take(remove_count) {
        fs::remove_file(&path).map_err(|source| LoggingError::Cleanup { path, source })?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove old log file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}
