//! Logging setup
//!
//! Console logging always goes to stderr. With `--debug`, a daily-rotated log
//! file is written under `.capture/logs/` in the working directory as well
//! (or wherever `[logging] dir` / `CAPTURE_LOGS_LOCATION` points).

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "capture-onboarding.log";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug_mode: bool,
    pub log_dir: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Fixed log file (no rotation); enables file logging outside debug mode
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            log_dir: default_log_dir(),
            level: "warn".to_string(),
            file: None,
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        if debug {
            self.level = "debug".to_string();
        }
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// `.capture/logs` under the working directory
pub fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".capture")
        .join("logs")
}

/// Install the global subscriber.
///
/// Returns the file writer guard when logging to a file (debug mode or an
/// explicit `file`); keep it alive until exit or buffered lines are lost.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let file_appender = match (&config.file, config.debug_mode) {
        (Some(file), _) => {
            let dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = file
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {:?}", file))?;
            std::fs::create_dir_all(dir)?;
            tracing_appender::rolling::never(dir, name)
        }
        (None, true) => {
            std::fs::create_dir_all(&config.log_dir)?;
            tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX)
        }
        (None, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .try_init()?;
            return Ok(None);
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()?;

    tracing::debug!("File logging enabled");
    Ok(Some(guard))
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
}

/// Most recently modified log file in `dir`
pub fn get_log_path(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_log_file(path))
        .filter_map(|path| {
            let modified = path.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// Remove log files older than `max_age_days` from `dir`
pub fn cleanup_old_logs(dir: &Path, max_age_days: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(max_age_days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !is_log_file(&path) {
            continue;
        }
        let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if now.duration_since(modified).unwrap_or_default() > max_age {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}
