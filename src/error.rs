//! Error types for the hibiki session core.

/// Top-level error type for the voice session system.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// WebSocket transport or connection lifecycle error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed or unexpected wire payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Audio capture / detector error.
    #[error("capture error: {0}")]
    Capture(String),

    /// Voice activity detection error.
    #[error("VAD error: {0}")]
    Vad(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SessionError>;
