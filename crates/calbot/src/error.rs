//! Error taxonomy for the notification worker.
//!
//! Every variant is fatal to the worker except where the caller decides
//! otherwise (see `calendar.exit_on_error`). Per-event parse problems never
//! surface here; the notifier logs and skips them.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the worker and its binaries
#[derive(Debug, Error)]
pub enum CalbotError {
    /// The config file does not exist
    #[error("config file {} not found", .0.display())]
    ConfigMissing(PathBuf),

    /// The config file exists but could not be parsed
    #[error("config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    /// The config parsed but a value is unusable
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// The calendar private key could not be read
    #[error("read key file error ({}): {source}", path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key is not a PEM the signer can use
    #[error("unsupported key in {}: {reason}", path.display())]
    KeyFormat { path: PathBuf, reason: String },

    /// Building the calendar authenticator or HTTP client failed
    #[error("create calendar service error: {0}")]
    Auth(#[source] std::io::Error),

    /// The calendar API call failed
    #[error("list events error: {0}")]
    Calendar(#[from] google_calendar3::Error),

    /// IRC client error (connect, identify, send)
    #[error("irc error: {0}")]
    Chat(#[from] irc::error::Error),

    /// The IRC server closed the session
    #[error("irc connection closed: {0}")]
    ChatClosed(String),

    /// Dry-run output could not be written
    #[error("write notification error: {0}")]
    Output(#[source] std::io::Error),

    /// The notify window could not be computed for the current time
    #[error("cannot compute notify window: {0}")]
    Window(#[from] chrono::RoundingError),
}

impl CalbotError {
    /// Create an invalid config error
    pub fn invalid(message: impl Into<String>) -> Self {
        CalbotError::ConfigInvalid(message.into())
    }

    /// Whether this error came from talking to the calendar service
    pub fn is_calendar(&self) -> bool {
        matches!(
            self,
            CalbotError::KeyFile { .. }
                | CalbotError::KeyFormat { .. }
                | CalbotError::Auth(_)
                | CalbotError::Calendar(_)
        )
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, CalbotError>;
