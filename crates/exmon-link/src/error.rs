//! Error types for the connection layer.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Configuration-time endpoint rejection.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid endpoint URI {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("unsupported endpoint scheme {0:?}, expected ws or wss")]
    UnsupportedScheme(String),

    #[error("endpoint {0:?} has no host")]
    MissingHost(String),
}

/// Connection-level failure. Never fatal: the supervisor reports the link
/// as down and schedules the next attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    #[error("websocket stream error: {0}")]
    Stream(#[from] tungstenite::Error),
}
