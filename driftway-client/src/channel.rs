//! Channel identification.
//!
//! A channel is a logical, independently-addressed discovery stream between
//! two peers. Externally it is named by a base58-encoded key; the decoded
//! bytes double as the channel's discovery key.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::error::ClientResult;

/// A validated channel key.
///
/// Holds both the base58 string form (used for registry lookup and
/// addressing) and the decoded bytes (passed to the protocol factory).
/// Equality and hashing are by the string form only; the bytes are a pure
/// function of it.
#[derive(Debug, Clone)]
pub struct ChannelKey {
    key: String,
    bytes: Bytes,
}

impl ChannelKey {
    /// Parse and validate a base58 channel key.
    ///
    /// Decoding is deterministic; any key accepted here decodes to the same
    /// bytes on every call.
    pub fn parse(key: &str) -> ClientResult<Self> {
        let bytes = bs58::decode(key).into_vec()?;
        Ok(Self {
            key: key.to_string(),
            bytes: Bytes::from(bytes),
        })
    }

    /// The base58 string form.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The decoded key bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl PartialEq for ChannelKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ChannelKey {}

impl Hash for ChannelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// Lets the registry map be probed by `&str`.
impl Borrow<str> for ChannelKey {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Derive the short diagnostic tag for a connection.
///
/// The first two characters of the peer identity and the channel key,
/// joined by a dash. Used for log correlation only; never for addressing
/// or equality.
pub fn connection_tag(peer_id: &str, channel: &str) -> String {
    let head = |s: &str| s.chars().take(2).collect::<String>();
    format!("{}-{}", head(peer_id), head(channel))
}
