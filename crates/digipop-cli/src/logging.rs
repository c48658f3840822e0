// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DIGIPOP_LOG";

/// `DIGIPOP_LOG` wins over the configured level.
pub fn filter_directive(configured: &str) -> String {
    match env::var(LOG_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => configured.to_owned(),
    }
}

/// Appends to `path`; the terminal belongs to the TUI. Keep the returned
/// guard alive until exit or buffered lines are lost.
pub fn init(path: &Path, directive: &str) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|error| anyhow!("invalid log filter {directive:?}: {error}"))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path {} has no file name", path.display()))?;
    let log_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(log_dir)
        .with_context(|| format!("open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // Another subscriber is already installed; dropping the guard stops
        // the unused writer.
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{LOG_ENV, filter_directive, init};
    use anyhow::Result;

    #[test]
    fn env_override_wins_over_configured_level() {
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(LOG_ENV, "digipop_app=trace");
        }
        let directive = filter_directive("info");
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert_eq!(directive, "digipop_app=trace");
        assert_eq!(filter_directive("warn"), "warn");
    }

    #[test]
    fn init_creates_log_file_and_rejects_bad_filters() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("digipop.log");
        let guard = init(&path, "info")?;
        assert!(path.exists());
        drop(guard);

        let error = init(&path, "digipop=loud").expect_err("malformed filter should fail");
        assert!(error.to_string().contains("invalid log filter"));
        Ok(())
    }
}
