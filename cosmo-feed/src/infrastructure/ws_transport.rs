use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};

use crate::domain::{Transport, TransportError, TransportEvent, TransportSession};

#[derive(Error, Debug)]
pub enum WsError {
    #[error("Connection error: {0}")]
    Connection(#[from] tungstenite::Error),
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
}

/// Convert infrastructure WsError to domain TransportError
impl From<WsError> for TransportError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::Connection(tungstenite::Error::Url(e)) => {
                TransportError::InvalidEndpoint(e.to_string())
            }
            WsError::Connection(e) => TransportError::Connect(e.to_string()),
            WsError::HandshakeTimeout(after) => {
                TransportError::Connect(format!("handshake timed out after {:?}", after))
            }
        }
    }
}

/// WebSocket transport for the token-creation stream
/// Infrastructure component - handles WebSocket communication
pub struct WsTransport {
    url: String,
    channel_capacity: usize,
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        WsTransport {
            url: url.into(),
            channel_capacity: 1024,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Bound on TCP connect plus the websocket upgrade
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and return a session reporting inbound messages and close/error
    pub async fn open(&self) -> Result<TransportSession, WsError> {
        let (ws_stream, _) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| WsError::HandshakeTimeout(self.connect_timeout))??;
        let (mut write, mut read) = ws_stream.split();

        // Channel for receiving events from the WebSocket
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(self.channel_capacity);
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Explicit close, or the session was dropped
                    _ = &mut close_rx => {
                        if let Err(e) = write.send(Message::Close(None)).await {
                            tracing::debug!("Close frame not sent: {}", e);
                        }
                        break;
                    }
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let raw = text.as_str().to_owned();
                            if event_tx.send(TransportEvent::Message(raw)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                            Ok(raw) => {
                                if event_tx.send(TransportEvent::Message(raw)).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => tracing::debug!("Ignoring non-UTF-8 binary frame"),
                        },
                        Some(Ok(Message::Close(frame))) => {
                            tracing::debug!("Close frame received: {:?}", frame);
                            let _ = event_tx.send(TransportEvent::Closed).await;
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            tracing::trace!("Received ping: {:?}", data);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                            break;
                        }
                        None => {
                            let _ = event_tx.send(TransportEvent::Closed).await;
                            break;
                        }
                    }
                }
            }
        });

        Ok(TransportSession::new(event_rx, close_tx))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self) -> Result<TransportSession, TransportError> {
        tracing::debug!("Connecting to {}", self.url);
        self.open().await.map_err(TransportError::from)
    }
}
