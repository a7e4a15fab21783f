//! Relay-brokered channel connections for a single remote peer.
//!
//! This crate maintains one transport connection per logical discovery
//! channel against a relay endpoint, and bridges each connection to an
//! application-level protocol stream supplied by the caller:
//!
//! - At-most-one connection per channel, with idempotent add/remove
//! - A protocol-stream seam so the broker never inspects protocol bytes
//! - Per-channel failure containment: an error on one channel is logged
//!   and never disturbs the others
//!
//! # Architecture
//!
//! Each joined channel runs in its own tokio task. The registry (the
//! channel-to-connection map) is the only shared mutable state.
//!
//! ```text
//! ClientPeer::add(channel)
//! ├── registry insert (synchronous, under one lock)
//! └── Connection Task (one per channel)
//!     ├── open protocol stream (factory)
//!     ├── dial transport (resolves on readiness)
//!     └── bridge (pump bytes both ways until end/close)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use driftway_client::{ClientConfig, ClientPeer, ProtocolFactory};
//!
//! let config = ClientConfig::new("my-peer-id", "wss://relay.example.com");
//! let factory: Arc<dyn ProtocolFactory> = Arc::new(my_factory);
//! let peer = ClientPeer::new(config, factory);
//!
//! peer.add("3QJmnh");
//! // ... later
//! peer.remove("3QJmnh");
//! ```

mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod peer;
pub mod protocol;
pub mod transport;

// Re-export main types
pub use channel::{connection_tag, ChannelKey};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use peer::{ChannelState, ClientPeer};
pub use protocol::{BoxProtocolStream, ChannelInfo, ProtocolFactory, ProtocolStream};
pub use transport::{Dial, Frame, Transport, TransportError, WsDial, WsTransport};
