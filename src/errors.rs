use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Licence check failed: {0}")]
    Licence(String),

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl KeeperError {
    /// Errors that must stop the tool before the supervision loop starts.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            KeeperError::Config(_) | KeeperError::Licence(_) | KeeperError::TomlDe(_)
        )
    }
}

pub type KeeperResult<T> = Result<T, KeeperError>;
