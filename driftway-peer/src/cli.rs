//! Command-line argument parsing.

use clap::Parser;
use rand::Rng;

/// Driftway relay peer.
#[derive(Parser, Debug, Clone)]
#[command(name = "driftway-peer")]
#[command(about = "Joins discovery channels on a Driftway relay")]
#[command(version)]
pub struct Cli {
    /// Relay base URL.
    #[arg(long, default_value = "ws://127.0.0.1:8080")]
    pub relay_url: String,

    /// Peer identity; a random base58 id is generated when omitted.
    #[arg(long)]
    pub peer_id: Option<String>,

    /// Channel keys to join (repeatable or comma-separated).
    #[arg(long = "channel", value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve the peer identity, generating a random one if not supplied.
    pub fn resolve_peer_id(&self) -> String {
        match &self.peer_id {
            Some(id) => id.clone(),
            None => {
                let mut seed = [0u8; 16];
                rand::thread_rng().fill(&mut seed);
                bs58::encode(seed).into_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_from(["driftway-peer"]);
        assert_eq!(cli.relay_url, "ws://127.0.0.1:8080");
        assert!(cli.peer_id.is_none());
        assert!(cli.channels.is_empty());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_channel_list() {
        let cli = Cli::parse_from([
            "driftway-peer",
            "--channel",
            "chan1,chan2",
            "--channel",
            "chan3",
        ]);
        assert_eq!(cli.channels, vec!["chan1", "chan2", "chan3"]);
    }

    #[test]
    fn test_generated_peer_id_is_base58() {
        let cli = Cli::parse_from(["driftway-peer"]);
        let id = cli.resolve_peer_id();
        assert!(!id.is_empty());
        assert!(bs58::decode(&id).into_vec().is_ok());
    }

    #[test]
    fn test_explicit_peer_id_wins() {
        let cli = Cli::parse_from(["driftway-peer", "--peer-id", "ab12"]);
        assert_eq!(cli.resolve_peer_id(), "ab12");
    }
}
