//! Session-layer error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type for session-layer operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors from the session layer. Per-connection I/O faults are not
/// errors at this level: the descriptor is marked closed and reaped.
#[derive(Debug, Error)]
pub enum NetError {
    /// Bind failed at boot.
    #[error("failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Poll registration or wait failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration problem (bad certificate or key material).
    #[error("TLS error: {0}")]
    Tls(String),
}
