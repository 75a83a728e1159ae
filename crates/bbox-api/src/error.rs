use thiserror::Error;

/// Top-level error type for the `bbox-api` crate.
///
/// Covers every failure mode of the router API: transport, unexpected
/// JSON shapes, authentication, lookups, and unexpected HTTP statuses.
/// The CLI maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// The router answered with a JSON shape we don't understand
    /// (empty envelope array, type mismatch, bad timestamp).
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the router.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A mutating call was attempted before a bearer token was published.
    #[error("No bearer token available -- login required")]
    AuthRequired,

    /// Operation invoked in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    State(String),

    // ── Resources ───────────────────────────────────────────────────
    /// Lookup by id or description found nothing.
    #[error("{kind} '{identifier}' not found")]
    NotFound {
        kind: &'static str,
        identifier: String,
    },

    /// Unexpected HTTP status, carrying the observed code.
    #[error("{operation} failed: HTTP {status}")]
    Status { status: u16, operation: String },
}

impl Error {
    /// Build a protocol error, keeping a bounded preview of the body.
    pub(crate) fn protocol(message: impl Into<String>, body: &str) -> Self {
        Self::Protocol {
            message: message.into(),
            body: body.chars().take(512).collect(),
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::AuthRequired | Self::Status { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transport-level failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
