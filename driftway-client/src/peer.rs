//! Per-peer connection registry.
//!
//! [`ClientPeer`] maintains at most one transport connection per channel
//! against a single remote peer, and drives the full lifecycle of each:
//! open, bridge on readiness, remove on end or close.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::bridge;
use crate::channel::{connection_tag, ChannelKey};
use crate::config::ClientConfig;
use crate::protocol::{ChannelInfo, ProtocolFactory};
use crate::transport::{Dial, WsDial};

/// Lifecycle state of one channel's connection.
///
/// Absence from the registry covers the remaining conceptual states: a
/// channel is either never-added or already removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Transport opened, not yet ready.
    Pending,
    /// Transport ready, data flowing.
    Bridged,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Pending => write!(f, "pending"),
            ChannelState::Bridged => write!(f, "bridged"),
        }
    }
}

/// One registry entry: a channel bound to a live connection task.
struct Connection {
    /// Distinguishes this connection from later ones on the same channel,
    /// so a finished task never evicts a fresh entry created by a re-add.
    epoch: u64,
    /// Current lifecycle state.
    state: ChannelState,
    /// The connection task driving dial, bridge and cleanup.
    task: JoinHandle<()>,
}

/// Connection broker for a single remote peer.
///
/// `add` and `remove` are idempotent and never return errors; failures are
/// reported through tracing and, indirectly, through the channel's absence
/// from the registry. Cloning is cheap and shares the registry.
pub struct ClientPeer<D: Dial = WsDial> {
    shared: Arc<Shared<D>>,
}

impl<D: Dial> Clone for ClientPeer<D> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

struct Shared<D: Dial> {
    config: ClientConfig,
    factory: Arc<dyn ProtocolFactory>,
    dial: D,
    /// The registry: all mutations take this lock and complete without
    /// awaiting, which serializes the check-then-insert in `add`.
    connections: Mutex<HashMap<ChannelKey, Connection>>,
    next_epoch: AtomicU64,
}

impl ClientPeer<WsDial> {
    /// Create a broker that connects over WebSocket.
    pub fn new(config: ClientConfig, factory: Arc<dyn ProtocolFactory>) -> Self {
        Self::with_dialer(config, factory, WsDial::new())
    }
}

impl<D: Dial> ClientPeer<D> {
    /// Create a broker with a custom transport dialer.
    pub fn with_dialer(config: ClientConfig, factory: Arc<dyn ProtocolFactory>, dial: D) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                factory,
                dial,
                connections: Mutex::new(HashMap::new()),
                next_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// This broker's peer identity.
    pub fn peer_id(&self) -> &str {
        &self.shared.config.peer_id
    }

    /// The relay base URL.
    pub fn base_url(&self) -> &str {
        &self.shared.config.base_url
    }

    /// Join a channel.
    ///
    /// No-op if the channel already has an entry; repeated discovery events
    /// for the same channel never create duplicate connections. The guard
    /// and the registry insert happen under one lock, so concurrent `add`
    /// calls for the same channel observe the entry and no-op. Keys that
    /// are not valid base58 are logged and ignored.
    pub fn add(&self, channel: &str) {
        let key = match ChannelKey::parse(channel) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(peer = %self.peer_id(), %channel, error = %e, "rejecting unparseable channel key");
                return;
            }
        };

        let mut connections = self.shared.connections.lock().unwrap();
        if connections.contains_key(channel) {
            tracing::debug!(peer = %self.peer_id(), %channel, "channel already joined");
            return;
        }

        let epoch = self.shared.next_epoch.fetch_add(1, Ordering::Relaxed);
        // The entry is visible before the connection task can act: the
        // task's first registry access takes this same lock.
        let task = tokio::spawn(run_connection(self.shared.clone(), key.clone(), epoch));
        connections.insert(
            key,
            Connection {
                epoch,
                state: ChannelState::Pending,
                task,
            },
        );
    }

    /// Leave a channel. Safe no-op when the channel has no entry.
    ///
    /// Also aborts the channel's connection task; dropping the transport
    /// closes it, and both are idempotent. A subsequent `add` for the same
    /// channel creates a fresh connection.
    pub fn remove(&self, channel: &str) {
        let removed = self.shared.connections.lock().unwrap().remove(channel);
        if let Some(connection) = removed {
            tracing::debug!(
                peer = %self.peer_id(),
                %channel,
                state = %connection.state,
                "removing connection"
            );
            connection.task.abort();
        }
    }

    /// Whether a connection entry exists for `channel`.
    pub fn contains(&self, channel: &str) -> bool {
        self.shared.connections.lock().unwrap().contains_key(channel)
    }

    /// Number of channels with a connection entry.
    pub fn len(&self) -> usize {
        self.shared.connections.lock().unwrap().len()
    }

    /// Whether no channels are joined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drive one channel's connection: open the protocol stream, wait for the
/// transport, bridge the two, and clean up the registry entry afterwards.
async fn run_connection<D: Dial>(shared: Arc<Shared<D>>, key: ChannelKey, epoch: u64) {
    let peer_id = shared.config.peer_id.as_str();
    let url = shared.config.channel_url(key.as_str());
    let tag = connection_tag(peer_id, key.as_str());

    // The protocol stream exists as soon as the channel is added; it only
    // starts flowing once the transport is ready.
    let protocol = shared
        .factory
        .open(ChannelInfo::for_channel(key.bytes().clone()));

    let transport = match shared.dial.dial(&url, &tag).await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::warn!(%tag, peer = %peer_id, channel = %key, error = %e, "transport connect failed");
            remove_entry(&shared, &key, epoch);
            return;
        }
    };

    mark_bridged(&shared, &key, epoch);

    let end = bridge::run(protocol, transport, &tag, peer_id, key.as_str()).await;
    tracing::debug!(%tag, peer = %peer_id, channel = %key, outcome = ?end, "transport finished");
    remove_entry(&shared, &key, epoch);
}

/// Remove the entry for `key` if it still belongs to this connection.
fn remove_entry<D: Dial>(shared: &Shared<D>, key: &ChannelKey, epoch: u64) {
    let mut connections = shared.connections.lock().unwrap();
    if connections
        .get(key.as_str())
        .is_some_and(|c| c.epoch == epoch)
    {
        connections.remove(key.as_str());
    }
}

/// Transition the entry for `key` to bridged if it is still this connection.
fn mark_bridged<D: Dial>(shared: &Shared<D>, key: &ChannelKey, epoch: u64) {
    let mut connections = shared.connections.lock().unwrap();
    if let Some(connection) = connections.get_mut(key.as_str()) {
        if connection.epoch == epoch {
            connection.state = ChannelState::Bridged;
        }
    }
}
