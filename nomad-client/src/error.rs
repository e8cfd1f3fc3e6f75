//! Error types shared by the data source, the stream read loops and startup.

use thiserror::Error;

/// Failure of a request or stream against the cluster API.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Network or socket failure; the page stays navigable.
    #[error("transport error: {0}")]
    Transport(String),

    /// The credentials were rejected by the server.
    #[error("permission denied: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    /// Malformed payload or stream frame. Terminates only the affected stream.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Close codes and messages that mean the remote side finished normally.
const EXPECTED_CLOSURE_SIGNATURES: &[&str] = &[
    "connection closed normally",
    "connection reset without closing handshake",
    "close 1000",
    "close 1001",
    "close 1006",
    "unexpected eof",
];

impl SourceError {
    /// Maps an HTTP status and body onto the taxonomy.
    pub fn from_status(code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match code {
            401 | 403 => SourceError::Unauthorized(body),
            404 => SourceError::NotFound(body),
            _ => SourceError::Status { code, body },
        }
    }

    /// True for stream read errors that match a known normal-termination signature.
    pub fn is_expected_closure(&self) -> bool {
        let msg = match self {
            SourceError::Transport(m) | SourceError::Io(m) => m.to_ascii_lowercase(),
            _ => return false,
        };
        EXPECTED_CLOSURE_SIGNATURES
            .iter()
            .any(|sig| msg.contains(sig))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SourceError::Unauthorized(_))
    }

    /// Banner text shown on the page that failed.
    pub fn banner(&self) -> String {
        match self {
            SourceError::Unauthorized(_) => {
                "Permission denied: the server rejected the token. Check NOMAD_TOKEN or --token"
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return SourceError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return SourceError::Decode(err.to_string());
        }
        SourceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SourceError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                SourceError::Transport("connection closed normally".to_string())
            }
            WsError::Protocol(p) => SourceError::Transport(p.to_string().to_ascii_lowercase()),
            WsError::Http(resp) => {
                let code = resp.status().as_u16();
                SourceError::from_status(code, format!("websocket handshake rejected ({code})"))
            }
            other => SourceError::Transport(other.to_string()),
        }
    }
}

/// Fatal startup errors. Reported before the terminal is taken over.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no cluster address configured: set NOMAD_ADDR or pass --address")]
    MissingAddress,

    #[error("invalid address {0:?}: {1}")]
    InvalidAddress(String, String),

    #[error("failed to read config file {path}: {reason}")]
    File { path: String, reason: String },

    #[error("invalid TLS material in {path}: {reason}")]
    Tls { path: String, reason: String },

    #[error("invalid column set for {page}: {reason}")]
    Columns { page: &'static str, reason: String },
}
