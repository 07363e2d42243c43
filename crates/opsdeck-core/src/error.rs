// ── Core error types ──
//
// User-facing errors from opsdeck-core. Consumers never see raw reqwest
// failures or JSON parse errors -- the `From<opsdeck_api::Error>` impl
// translates transport-layer errors into the console's taxonomy, and
// `kind()` tells the presentation layer where to surface each one.

use thiserror::Error;

/// Where an error should surface in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected user input. Shown inline in the offending form field.
    Validation,
    /// Backend said no (4xx). Shown next to the triggering action.
    Client,
    /// Backend broke (5xx). Same surface, phrased as a server error.
    Server,
    /// Network failure or abort. Silent for background refreshes,
    /// surfaced for user-initiated actions.
    Transport,
    /// Bulk operation committed with failures. Non-fatal warning.
    Partial,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Request rejected: {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Server error: {message}")]
    ServerFailure { status: u16, message: String },

    #[error("Connection failed: {message}")]
    Transport { message: String },

    /// The operation is committed; `failed` items did not apply.
    #[error("{updated} updated, {failed} failed")]
    Partial { updated: i64, failed: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The surfacing category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Rejected { .. } => ErrorKind::Client,
            Self::ServerFailure { .. } => ErrorKind::Server,
            Self::Transport { .. } | Self::Internal(_) => ErrorKind::Transport,
            Self::Partial { .. } => ErrorKind::Partial,
        }
    }

    /// Whether a background refresh should swallow this error silently.
    pub fn is_silent_for_background(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<opsdeck_api::Error> for CoreError {
    fn from(err: opsdeck_api::Error) -> Self {
        match err {
            opsdeck_api::Error::Client {
                status,
                code,
                message,
            } => CoreError::Rejected {
                status,
                code,
                message,
            },
            opsdeck_api::Error::Server { status, message } => {
                CoreError::ServerFailure { status, message }
            }
            opsdeck_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            opsdeck_api::Error::StreamConnect(reason) => CoreError::Transport { message: reason },
            opsdeck_api::Error::InvalidUrl(e) => CoreError::Internal(format!("invalid URL: {e}")),
            opsdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("deserialization error: {message}"))
            }
            opsdeck_api::Error::ClientBuild(reason) => CoreError::Internal(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_surfaces() {
        assert_eq!(
            CoreError::validation("title is required").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::Rejected {
                status: 404,
                code: None,
                message: "missing".into()
            }
            .kind(),
            ErrorKind::Client
        );
        assert_eq!(
            CoreError::ServerFailure {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Server
        );
        assert_eq!(
            CoreError::Partial {
                updated: 2,
                failed: 1
            }
            .kind(),
            ErrorKind::Partial
        );
    }

    #[test]
    fn transport_errors_are_silent_in_background() {
        let err = CoreError::Transport {
            message: "connection refused".into(),
        };
        assert!(err.is_silent_for_background());

        let err = CoreError::ServerFailure {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_silent_for_background());
    }

    #[test]
    fn partial_display_quotes_counts() {
        let err = CoreError::Partial {
            updated: 2,
            failed: 1,
        };
        assert_eq!(err.to_string(), "2 updated, 1 failed");
    }
}
