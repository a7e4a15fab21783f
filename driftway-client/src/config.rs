//! Broker configuration.

/// Configuration for a [`ClientPeer`](crate::ClientPeer).
///
/// Both fields are opaque strings fixed for the broker's lifetime.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity of this peer as known to the relay.
    pub peer_id: String,

    /// Base URL of the relay endpoint (e.g. `wss://relay.example.com`).
    pub base_url: String,
}

impl ClientConfig {
    /// Create a configuration for one peer against one relay.
    pub fn new(peer_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            base_url: base_url.into(),
        }
    }

    /// Derive the connection URL for a channel.
    ///
    /// The segment order `{base_url}/{peer_id}/{channel}` is a compatibility
    /// contract with the relay's routing; do not reorder.
    pub fn channel_url(&self, channel: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.peer_id, channel)
    }
}
