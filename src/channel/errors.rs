//! Error types for the detection channel.

/// Errors encoding or decoding channel payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),
}

/// Errors from the channel connection.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Detection channel closed")]
    Closed,

    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to connect to {addr}: {source} (after {attempts} attempts)")]
    Connect {
        addr: String,
        attempts: u32,
        source: std::io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
