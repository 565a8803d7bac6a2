//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Boxed error from a backing-store client or connection pool
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Connection or pool configuration was rejected before any I/O happened
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backing store could not be reached or dropped the connection.
    ///
    /// The client error is kept intact as the source so callers can
    /// downcast it (see [`CheckpointError::transport_source`]).
    #[error("Transport error: {0}")]
    Transport(#[source] TransportSource),

    /// A value could not be encoded, or a stored payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A binary payload was not valid hexadecimal text
    #[error("Binary decode error: {0}")]
    Decode(#[from] hex::FromHexError),

    /// Invalid checkpoint identity or payload
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),
}

impl CheckpointError {
    /// Wrap a client or pool error without altering it
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }

    /// Borrow the original transport error as a concrete type
    pub fn transport_source<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Transport(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether the error came from the backing store's transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the error came from encoding or decoding a payload
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::Decode(_))
    }
}
