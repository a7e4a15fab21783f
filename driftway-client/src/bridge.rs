//! Bridging a protocol stream to a transport connection.
//!
//! A bridge is two unidirectional pumps composed into a full duplex: bytes
//! produced by the protocol stream are sent as transport frames, and
//! inbound frames are written into the protocol stream. Once running, data
//! flows without any registry mediation.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::protocol::BoxProtocolStream;
use crate::transport::{Frame, Transport};

/// Read buffer size for the protocol-to-transport pump.
const READ_BUF: usize = 16 * 1024;

/// How the transport side of a bridge finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BridgeEnd {
    /// The transport stream was exhausted.
    Ended,
    /// The remote side sent a close notification.
    Closed,
}

/// Pump bytes between the protocol stream and the transport until the
/// transport ends or closes.
///
/// Errors on either side are logged and contained: a failing direction
/// stops pumping, but the bridge keeps draining the transport until an end
/// or close signal arrives. Errors never terminate the bridge on their own.
pub(crate) async fn run<T: Transport>(
    protocol: BoxProtocolStream,
    mut transport: T,
    tag: &str,
    peer_id: &str,
    channel: &str,
) -> BridgeEnd {
    let (mut proto_rd, mut proto_wr) = tokio::io::split(protocol);
    let mut buf = vec![0u8; READ_BUF];
    // Cleared when the corresponding pump hits EOF or an error.
    let mut proto_to_transport = true;
    let mut transport_to_proto = true;

    loop {
        tokio::select! {
            item = transport.next() => match item {
                Some(Ok(Frame::Data(data))) => {
                    if !transport_to_proto {
                        continue;
                    }
                    if let Err(e) = proto_wr.write_all(&data).await {
                        tracing::warn!(%tag, peer = %peer_id, %channel, error = %e, "protocol stream error");
                        transport_to_proto = false;
                    }
                }
                Some(Ok(Frame::Close)) => return BridgeEnd::Closed,
                Some(Err(e)) => {
                    tracing::warn!(%tag, peer = %peer_id, %channel, error = %e, "transport error");
                }
                None => return BridgeEnd::Ended,
            },
            read = proto_rd.read(&mut buf), if proto_to_transport => match read {
                Ok(0) => {
                    proto_to_transport = false;
                    // The protocol side is done sending; tell the remote.
                    if let Err(e) = transport.send(Frame::Close).await {
                        tracing::warn!(%tag, peer = %peer_id, %channel, error = %e, "transport error");
                    }
                }
                Ok(n) => {
                    let data = Bytes::copy_from_slice(&buf[..n]);
                    if let Err(e) = transport.send(Frame::Data(data)).await {
                        tracing::warn!(%tag, peer = %peer_id, %channel, error = %e, "transport error");
                        proto_to_transport = false;
                    }
                }
                Err(e) => {
                    tracing::warn!(%tag, peer = %peer_id, %channel, error = %e, "protocol stream error");
                    proto_to_transport = false;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::{Sink, Stream};
    use tokio::sync::mpsc;

    use crate::transport::TransportError;

    /// Channel-backed transport for exercising the bridge.
    struct TestTransport {
        incoming: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
        outgoing: mpsc::UnboundedSender<Frame>,
    }

    fn test_transport() -> (
        TestTransport,
        mpsc::UnboundedSender<Result<Frame, TransportError>>,
        mpsc::UnboundedReceiver<Frame>,
    ) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            TestTransport {
                incoming: in_rx,
                outgoing: out_tx,
            },
            in_tx,
            out_rx,
        )
    }

    impl Stream for TestTransport {
        type Item = Result<Frame, TransportError>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.incoming.poll_recv(cx)
        }
    }

    impl Sink<Frame> for TestTransport {
        type Error = TransportError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, frame: Frame) -> Result<(), Self::Error> {
            self.outgoing.send(frame).map_err(|_| {
                TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "receiver gone"))
            })
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_bridge_pumps_both_directions() {
        let (transport, in_tx, mut out_rx) = test_transport();
        let (near, far) = tokio::io::duplex(1024);
        let handle =
            tokio::spawn(async move { run(Box::new(near), transport, "te-st", "peer", "chan").await });

        let (mut far_rd, mut far_wr) = tokio::io::split(far);

        // transport -> protocol
        in_tx
            .send(Ok(Frame::Data(Bytes::from_static(b"inbound"))))
            .unwrap();
        let mut buf = [0u8; 7];
        far_rd.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"inbound");

        // protocol -> transport
        far_wr.write_all(b"outbound").await.unwrap();
        let frame = out_rx.recv().await.unwrap();
        assert_eq!(frame, Frame::Data(Bytes::from_static(b"outbound")));

        // Exhausting the transport ends the bridge.
        drop(in_tx);
        assert_eq!(handle.await.unwrap(), BridgeEnd::Ended);
    }

    #[tokio::test]
    async fn test_close_frame_finishes_bridge() {
        let (transport, in_tx, _out_rx) = test_transport();
        let (near, _far) = tokio::io::duplex(1024);
        let handle =
            tokio::spawn(async move { run(Box::new(near), transport, "te-st", "peer", "chan").await });

        in_tx.send(Ok(Frame::Close)).unwrap();
        assert_eq!(handle.await.unwrap(), BridgeEnd::Closed);
    }

    #[tokio::test]
    async fn test_transport_error_is_contained() {
        let (transport, in_tx, _out_rx) = test_transport();
        let (near, far) = tokio::io::duplex(1024);
        let handle =
            tokio::spawn(async move { run(Box::new(near), transport, "te-st", "peer", "chan").await });

        let (mut far_rd, _far_wr) = tokio::io::split(far);

        // An error item must not end the bridge; data after it still flows.
        in_tx
            .send(Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "mid-stream failure",
            ))))
            .unwrap();
        in_tx
            .send(Ok(Frame::Data(Bytes::from_static(b"after"))))
            .unwrap();

        let mut buf = [0u8; 5];
        far_rd.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"after");

        in_tx.send(Ok(Frame::Close)).unwrap();
        assert_eq!(handle.await.unwrap(), BridgeEnd::Closed);
    }

    #[tokio::test]
    async fn test_protocol_eof_sends_close() {
        let (transport, in_tx, mut out_rx) = test_transport();
        let (near, far) = tokio::io::duplex(1024);
        let handle =
            tokio::spawn(async move { run(Box::new(near), transport, "te-st", "peer", "chan").await });

        // Dropping the protocol's far side is an EOF on the near side.
        drop(far);
        assert_eq!(out_rx.recv().await.unwrap(), Frame::Close);

        // The bridge keeps draining the transport until it ends.
        drop(in_tx);
        assert_eq!(handle.await.unwrap(), BridgeEnd::Ended);
    }
}
