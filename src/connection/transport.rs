//! Transport seam between the connection manager and the wire.
//!
//! The manager only needs text-frame send/receive over a message-framed,
//! full-duplex channel. Keeping that behind a trait lets tests drive the
//! reconnect logic with scripted transports.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// One live, message-framed transport.
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> anyhow::Result<()>;

    /// Receive the next text frame. `None` means the peer closed the
    /// transport.
    async fn next_text(&mut self) -> Option<anyhow::Result<String>>;

    /// Close the transport. Best effort; errors are ignored.
    async fn close(&mut self);
}

/// Dials new transports for the connection manager.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Open a transport to `url`.
    async fn connect(&self, url: &str) -> anyhow::Result<Box<dyn Transport>>;
}

/// WebSocket transport over `tokio-tungstenite`.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> anyhow::Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<anyhow::Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),
                Some(Ok(Message::Close(_))) | None => return None,
                // Binary frames and ping/pong control frames are not part of
                // the protocol; tungstenite answers pings internally.
                Some(Ok(other)) => {
                    debug!("ignoring non-text frame: {other:?}");
                }
                Some(Err(e)) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Factory for real WebSocket transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransportFactory;

#[async_trait]
impl TransportFactory for WsTransportFactory {
    async fn connect(&self, url: &str) -> anyhow::Result<Box<dyn Transport>> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(Box::new(WsTransport { stream }))
    }
}
