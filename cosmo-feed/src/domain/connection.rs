/// Connection status of the event stream
/// Domain concept driven by the reconnection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No live connection and no attempt in progress
    #[default]
    Disconnected,
    /// Opening the transport
    Connecting,
    /// Transport open, events flowing
    Connected,
    /// Last attempt or live connection failed; a retry is scheduled
    Errored,
}

impl ConnectionStatus {
    /// Check if the supervisor is expected to (re)connect
    pub fn awaiting_connection(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Disconnected | ConnectionStatus::Errored
        )
    }

    /// Status text shown next to the feed
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Errored => "Connection Error",
        }
    }
}

/// Snapshot of the connection published to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Most recent transport error, kept until the next successful open
    pub last_error: Option<String>,
    /// Total reconnection attempts scheduled since start
    pub reconnect_attempts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_awaiting() {
        assert!(ConnectionStatus::Disconnected.awaiting_connection());
        assert!(!ConnectionStatus::Connecting.awaiting_connection());
        assert!(!ConnectionStatus::Connected.awaiting_connection());
        assert!(ConnectionStatus::Errored.awaiting_connection());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConnectionStatus::Connecting.label(), "Connecting...");
        assert_eq!(ConnectionStatus::Errored.label(), "Connection Error");
        assert_eq!(ConnectionState::default().status.label(), "Disconnected");
    }
}
