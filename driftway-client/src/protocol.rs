//! The seam between the broker and the application protocol.
//!
//! The broker never implements or inspects the peer-to-peer protocol; it
//! only moves bytes between a protocol stream and a transport connection.
//! The caller supplies a [`ProtocolFactory`] that builds one protocol
//! stream per channel.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

/// Metadata handed to the protocol factory when a channel is joined.
///
/// `channel` and `discovery_key` carry the same decoded key bytes. The
/// boolean flags are a fixed configuration, not computed from state: the
/// stream is live, transfers both ways, and leaves payload encryption and
/// integrity hashing to the transport layer.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    /// Decoded channel key bytes.
    pub channel: Bytes,
    /// Discovery key for the shared resource; identical to `channel`.
    pub discovery_key: Bytes,
    /// Live/streaming mode.
    pub live: bool,
    /// Download enabled.
    pub download: bool,
    /// Upload enabled.
    pub upload: bool,
    /// Payload encryption.
    pub encrypt: bool,
    /// Integrity hashing.
    pub hash: bool,
}

impl ChannelInfo {
    /// Build the fixed-shape info for a channel's decoded key bytes.
    pub fn for_channel(decoded: Bytes) -> Self {
        Self {
            channel: decoded.clone(),
            discovery_key: decoded,
            live: true,
            download: true,
            upload: true,
            encrypt: false,
            hash: false,
        }
    }
}

/// Any bidirectional byte stream can serve as a protocol stream.
pub trait ProtocolStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> ProtocolStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A boxed protocol stream, as returned by factories.
pub type BoxProtocolStream = Box<dyn ProtocolStream>;

/// Produces the application protocol stream for a channel.
///
/// Implemented for free by any `Fn(ChannelInfo) -> BoxProtocolStream`
/// closure or function.
pub trait ProtocolFactory: Send + Sync {
    /// Open a protocol stream for the given channel metadata.
    fn open(&self, info: ChannelInfo) -> BoxProtocolStream;
}

impl<F> ProtocolFactory for F
where
    F: Fn(ChannelInfo) -> BoxProtocolStream + Send + Sync,
{
    fn open(&self, info: ChannelInfo) -> BoxProtocolStream {
        (self)(info)
    }
}
