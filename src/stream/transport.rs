//! Upstream websocket transport: connect with an explicit `Origin`, subscribe to
//! chatrooms, read text frames.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::models::event::{chatroom_channel, ClientMessage};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket connect failed: {0}")]
    Connect(#[source] Box<WsError>),

    #[error("invalid origin header {0:?}")]
    InvalidOrigin(String),

    #[error("failed to encode control message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Send(#[source] Box<WsError>),

    #[error("websocket read failed: {0}")]
    Read(#[source] Box<WsError>),

    #[error("connection closed: {0}")]
    Closed(String),
}

/// One live bidirectional connection to the upstream.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Block until the next text frame. Any error means the connection is gone.
    async fn read_frame(&mut self) -> Result<String, TransportError>;

    async fn close(&mut self);
}

/// Opens transports. Split out so the stream loop can run against a fake upstream.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, origin: &str) -> Result<Box<dyn Transport>, TransportError>;
}

/// Send one `pusher:subscribe` per chatroom id, in order. Stops at the first failure.
pub async fn subscribe<T>(transport: &mut T, channel_ids: &[String]) -> Result<(), TransportError>
where
    T: Transport + ?Sized,
{
    for id in channel_ids {
        let message = serde_json::to_string(&ClientMessage::subscribe_chatroom(id))?;
        transport.send_text(message).await?;
        info!(channel_id = %id, channel = %chatroom_channel(id), "subscribed to chatroom");
    }
    Ok(())
}

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Select aws-lc-rs as the process-wide rustls provider. Safe to call repeatedly.
///
/// Without a provider rustls panics on the first `wss://` handshake.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

/// tokio-tungstenite connection to the Pusher endpoint.
pub struct PusherConnection {
    ws: WsStream,
}

impl PusherConnection {
    pub async fn connect(url: &str, origin: &str) -> Result<Self, TransportError> {
        install_crypto_provider();
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Connect(Box::new(e)))?;
        let origin_value = HeaderValue::from_str(origin)
            .map_err(|_| TransportError::InvalidOrigin(origin.to_string()))?;
        request.headers_mut().insert(ORIGIN, origin_value);

        let (ws, _resp) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(Box::new(e)))?;
        info!(url = %url, "connected to chat stream");
        Ok(Self { ws })
    }
}

#[async_trait]
impl Transport for PusherConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.ws
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))
    }

    async fn read_frame(&mut self) -> Result<String, TransportError> {
        loop {
            match self.ws.next().await {
                None => return Err(TransportError::Closed("stream ended".to_string())),
                Some(Err(e)) => return Err(TransportError::Read(Box::new(e))),
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason.as_str()))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Err(TransportError::Closed(reason));
                }
                // tungstenite queues the Pong for a Ping and flushes it on the next read
                Some(Ok(other)) => {
                    debug!(kind = ?other, "skipping non-text frame");
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "websocket close failed");
        }
    }
}

/// Default connector: real websocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str, origin: &str) -> Result<Box<dyn Transport>, TransportError> {
        let conn = PusherConnection::connect(url, origin).await?;
        Ok(Box::new(conn))
    }
}
