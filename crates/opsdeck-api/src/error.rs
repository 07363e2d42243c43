use thiserror::Error;

/// Top-level error type for the `opsdeck-api` crate.
///
/// Covers every failure mode of the backend surface: request transport,
/// structured 4xx/5xx responses, body decoding, and the SSE stream.
/// `opsdeck-core` maps these into its user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, abort, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend responses ───────────────────────────────────────────
    /// Backend returned 4xx with a message (or a generic fallback).
    #[error("Request rejected (HTTP {status}): {message}")]
    Client {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Backend returned 5xx.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Event stream ────────────────────────────────────────────────
    /// SSE connection failed or dropped mid-stream.
    #[error("Event stream connection failed: {0}")]
    StreamConnect(String),

    // ── Setup ───────────────────────────────────────────────────────
    /// HTTP client construction failed (bad token header, TLS init).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { .. } | Self::StreamConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client { status: 404, .. })
    }

    /// HTTP status of the failing response, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Extract the backend error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Client { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
