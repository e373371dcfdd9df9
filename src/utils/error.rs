use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to launch browser session: {0}")]
    SessionStart(String),

    #[error("Browser session already closed")]
    SessionClosed,

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out waiting for '{selector}' on {url}")]
    SelectorTimeout { selector: String, url: String },

    #[error("Required field '{field}' missing on {url}")]
    RequiredFieldMissing { field: &'static str, url: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task queue is closed")]
    QueueClosed,
}

impl AppError {
    /// Transient failures are retried by the orchestrator; everything that
    /// survives navigation (a missing required field, a closed queue) is not
    /// going to get better by reloading the page, but the whole unit of work
    /// is re-run anyway, so the distinction only matters for log triage.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::SessionStart(_)
                | AppError::Navigation { .. }
                | AppError::SelectorTimeout { .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
