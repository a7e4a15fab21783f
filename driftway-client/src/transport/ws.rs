//! WebSocket transport.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{ready, Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{Dial, Frame, TransportError};

/// Dials relay endpoints over WebSocket (`ws://` or `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDial;

impl WsDial {
    /// Create a WebSocket dialer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dial for WsDial {
    type Transport = WsTransport;

    async fn dial(&self, url: &str, tag: &str) -> Result<WsTransport, TransportError> {
        tracing::debug!(%tag, %url, "connecting");
        let (inner, _response) = connect_async(url).await?;
        tracing::debug!(%tag, "websocket ready");
        Ok(WsTransport { inner })
    }
}

/// Adapter mapping a websocket message stream onto [`Frame`]s.
///
/// Ping/pong frames are answered by tungstenite and never surface here.
pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Map an inbound websocket message; `None` means skip and keep polling.
fn to_frame(message: Message) -> Option<Frame> {
    match message {
        Message::Binary(data) => Some(Frame::Data(Bytes::from(data))),
        Message::Text(text) => Some(Frame::Data(Bytes::from(text.into_bytes()))),
        Message::Close(_) => Some(Frame::Close),
        _ => None,
    }
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Data(data) => Message::Binary(data.to_vec()),
        Frame::Close => Message::Close(None),
    }
}

impl Stream for WsTransport {
    type Item = Result<Frame, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(message)) => match to_frame(message) {
                    Some(frame) => return Poll::Ready(Some(Ok(frame))),
                    None => continue,
                },
                Some(Err(e)) => return Poll::Ready(Some(Err(e.into()))),
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Sink<Frame> for WsTransport {
    type Error = TransportError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready_unpin(cx).map_err(Into::into)
    }

    fn start_send(mut self: Pin<&mut Self>, frame: Frame) -> Result<(), Self::Error> {
        self.inner
            .start_send_unpin(to_message(frame))
            .map_err(Into::into)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_flush_unpin(cx).map_err(Into::into)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_close_unpin(cx).map_err(Into::into)
    }
}
