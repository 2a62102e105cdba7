/// Error types shared by the stream, decoder and configuration layers
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid or missing configuration value
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Handshake failure or abrupt failure of an open connection
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// Operation attempted on a transport that is no longer open
    #[error("transport closed")]
    TransportClosed,

    /// Inbound payload that is not a valid sensor message
    #[error("failed to decode sensor message: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
