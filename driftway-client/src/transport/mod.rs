//! Transport connections.
//!
//! A transport is the network-level duplex byte stream carrying one
//! channel. This module defines the contract the broker relies on and the
//! production WebSocket implementation ([`ws`]).

pub mod ws;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Sink, Stream};
use thiserror::Error;

pub use ws::{WsDial, WsTransport};

/// A single unit read from or written to a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Binary payload carrying protocol bytes.
    Data(Bytes),
    /// Close notification.
    Close,
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// WebSocket protocol or connection failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// I/O error on the underlying connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connected transport for one channel.
///
/// The stream side maps the connection's discrete signals:
///
/// - `Some(Ok(Frame::Data(_)))` — inbound bytes
/// - `Some(Err(_))` — an error notification (zero or more per connection)
/// - `Some(Ok(Frame::Close))` — the remote closed (at most once)
/// - `None` — the connection ended (at most once)
///
/// Implemented for free by anything with the right `Stream`/`Sink` shape.
pub trait Transport:
    Stream<Item = Result<Frame, TransportError>>
    + Sink<Frame, Error = TransportError>
    + Send
    + Unpin
{
}

impl<T> Transport for T where
    T: Stream<Item = Result<Frame, TransportError>>
        + Sink<Frame, Error = TransportError>
        + Send
        + Unpin
{
}

/// Opens transport connections.
///
/// Dialing is the readiness signal: the returned future resolves exactly
/// once, when the connection is usable for bidirectional I/O. The broker
/// imposes no timeout; a dial that never resolves leaves its channel
/// pending until removed.
#[async_trait]
pub trait Dial: Send + Sync + 'static {
    /// The connection type this dialer produces.
    type Transport: Transport + 'static;

    /// Connect to `url`. `tag` is the channel's diagnostic tag, for log
    /// correlation only.
    async fn dial(&self, url: &str, tag: &str) -> Result<Self::Transport, TransportError>;
}
