use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{KeeperError, KeeperResult};

pub const LOG_FILE_PREFIX: &str = "idlekeeper";
/// Days of rotated logs kept on disk.
pub const RETAINED_LOG_FILES: usize = 3;

/// `<local data>/idlekeeper/logs`, falling back to `./logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("idlekeeper").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Daily-rotating log file in `dir`, created if needed.
pub fn file_appender(dir: &Path) -> KeeperResult<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(RETAINED_LOG_FILES)
        .build(dir)
        .map_err(|e| KeeperError::Logging(format!("{}: {e}", dir.display())))
}

/// Installs console and file output. Keep the returned guard alive for the
/// whole process or buffered file lines are lost on exit.
pub fn init_logging(log_dir: Option<&Path>) -> KeeperResult<WorkerGuard> {
    let dir = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);
    let (writer, guard) = tracing_appender::non_blocking(file_appender(&dir)?);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|e| KeeperError::Logging(e.to_string()))?;

    tracing::debug!(dir = %dir.display(), "logging initialised");
    Ok(guard)
}
