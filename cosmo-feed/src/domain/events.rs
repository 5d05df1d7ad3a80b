use tokio::sync::{mpsc, oneshot};

/// Decoded "new token created" event - core domain event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    /// Mint address, unique per token
    pub identity: String,
    pub display_name: String,
    pub symbol: String,
    /// Where the metadata document lives. `None` skips enrichment.
    pub descriptor_uri: Option<String>,
}

/// Events received from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Raw inbound message (not yet decoded)
    Message(String),
    /// Remote side closed the connection
    Closed,
    /// Connection failed mid-stream
    Error(String),
}

/// A live transport connection
///
/// Dropping the session (or calling [`TransportSession::close`]) tears the
/// underlying connection down.
pub struct TransportSession {
    events: mpsc::Receiver<TransportEvent>,
    closer: Option<oneshot::Sender<()>>,
}

impl TransportSession {
    pub fn new(events: mpsc::Receiver<TransportEvent>, closer: oneshot::Sender<()>) -> Self {
        TransportSession {
            events,
            closer: Some(closer),
        }
    }

    /// Next event from the connection. `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Ask the connection to close. Idempotent.
    pub fn close(&mut self) {
        if let Some(closer) = self.closer.take() {
            let _ = closer.send(());
        }
    }
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("closed", &self.closer.is_none())
            .finish()
    }
}
