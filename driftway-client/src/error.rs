//! Client error types.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the client crate.
///
/// `add` and `remove` never return these; failures are reported through the
/// tracing side channel. The variants exist for the fallible building
/// blocks (key parsing, transport dialing) underneath.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Channel key is not valid base58.
    #[error("invalid channel key: {0}")]
    InvalidChannel(#[from] bs58::decode::Error),

    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
