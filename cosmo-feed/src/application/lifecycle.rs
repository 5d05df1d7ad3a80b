use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ConnectionState, ConnectionStatus};

/// Decides how long to wait before a reconnection attempt
///
/// `attempt` counts consecutive attempts since the last successful open,
/// starting at 0.
pub trait ReconnectPolicy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay for every attempt
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        FixedDelay { delay }
    }
}

impl ReconnectPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Doubling delay, capped at `max`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        ExponentialBackoff {
            base,
            max: max.max(base),
        }
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Inputs to the connection state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    /// Transport reported open
    Opened,
    /// Transport reported close
    Closed,
    /// Transport reported an error (connect failure or mid-stream)
    Failed(String),
    /// The scheduled reconnection delay elapsed
    RetryDue,
    Shutdown,
}

/// Side effects requested by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    Connect,
    ScheduleRetry(Duration),
    CancelRetry,
    Close,
}

/// Connection lifecycle state machine
///
/// Pure and synchronous: every transition reads only the machine's own
/// current state. The supervisor performs the returned actions.
pub struct ConnectionLifecycle {
    policy: Arc<dyn ReconnectPolicy>,
    state: ConnectionState,
    attempt: u32,
    retry_pending: bool,
    shut_down: bool,
}

impl ConnectionLifecycle {
    pub fn new(policy: Arc<dyn ReconnectPolicy>) -> Self {
        ConnectionLifecycle {
            policy,
            state: ConnectionState::default(),
            attempt: 0,
            retry_pending: false,
            shut_down: false,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Apply an event and return the actions to perform
    pub fn handle(&mut self, event: LifecycleEvent) -> Vec<LifecycleAction> {
        if self.shut_down {
            return Vec::new();
        }

        match event {
            LifecycleEvent::Start => {
                if self.state.status != ConnectionStatus::Disconnected || self.retry_pending {
                    return Vec::new();
                }
                self.state.status = ConnectionStatus::Connecting;
                vec![LifecycleAction::Connect]
            }
            LifecycleEvent::Opened => {
                if self.state.status != ConnectionStatus::Connecting {
                    return Vec::new();
                }
                self.state.status = ConnectionStatus::Connected;
                self.state.last_error = None;
                self.attempt = 0;
                Vec::new()
            }
            LifecycleEvent::Closed => {
                self.state.status = ConnectionStatus::Disconnected;
                self.schedule_retry()
            }
            LifecycleEvent::Failed(reason) => {
                self.state.status = ConnectionStatus::Errored;
                self.state.last_error = Some(reason);
                self.schedule_retry()
            }
            LifecycleEvent::RetryDue => {
                self.retry_pending = false;
                if !self.state.status.awaiting_connection() {
                    return Vec::new();
                }
                self.state.status = ConnectionStatus::Connecting;
                vec![LifecycleAction::Connect]
            }
            LifecycleEvent::Shutdown => {
                self.shut_down = true;
                self.state.status = ConnectionStatus::Disconnected;

                let mut actions = Vec::with_capacity(2);
                if self.retry_pending {
                    self.retry_pending = false;
                    actions.push(LifecycleAction::CancelRetry);
                }
                actions.push(LifecycleAction::Close);
                actions
            }
        }
    }

    /// At most one reconnection attempt is ever pending
    fn schedule_retry(&mut self) -> Vec<LifecycleAction> {
        if self.retry_pending {
            return Vec::new();
        }

        self.retry_pending = true;
        let delay = self.policy.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.state.reconnect_attempts += 1;
        vec![LifecycleAction::ScheduleRetry(delay)]
    }
}
