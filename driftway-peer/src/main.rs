//! Driftway peer binary.
//!
//! Joins the configured channels on a relay and keeps each one bridged to a
//! simple echo protocol until the process is interrupted. Useful for
//! exercising a relay deployment end to end.

mod cli;

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use driftway_client::{BoxProtocolStream, ChannelInfo, ClientConfig, ClientPeer, ProtocolFactory};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("Driftway Peer v{}", env!("CARGO_PKG_VERSION"));

    let peer_id = cli.resolve_peer_id();
    let config = ClientConfig::new(peer_id.clone(), cli.relay_url.clone());
    let factory: Arc<dyn ProtocolFactory> = Arc::new(echo_protocol);
    let peer = ClientPeer::new(config, factory);

    if cli.channels.is_empty() {
        tracing::warn!("no channels given; nothing to join (use --channel)");
    }
    for channel in &cli.channels {
        peer.add(channel);
    }

    tracing::info!(peer = %peer_id, relay = %cli.relay_url, channels = peer.len(), "peer running");

    wait_for_shutdown_signal().await;

    for channel in &cli.channels {
        peer.remove(channel);
    }

    Ok(())
}

/// Echo protocol: every byte received on a channel is written back.
fn echo_protocol(info: ChannelInfo) -> BoxProtocolStream {
    let key = bs58::encode(&info.channel).into_string();
    let (near, far) = tokio::io::duplex(16 * 1024);

    tokio::spawn(async move {
        let (mut rd, mut wr) = tokio::io::split(far);
        let mut buf = [0u8; 4096];
        loop {
            match rd.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    tracing::info!(channel = %key, bytes = n, "echoing");
                    if wr.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(channel = %key, "echo stream finished");
    });

    Box::new(near)
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down...");
    }
}
