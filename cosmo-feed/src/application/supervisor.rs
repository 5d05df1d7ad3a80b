use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Sleep, sleep};

use crate::domain::{ConnectionState, MessageSink, Transport, TransportEvent, TransportSession};

use super::lifecycle::{ConnectionLifecycle, LifecycleAction, LifecycleEvent, ReconnectPolicy};

/// Keeps one logical connection to the event stream alive
///
/// Drives [`ConnectionLifecycle`] from a single task: performs its actions,
/// forwards every inbound message to the sink in arrival order and publishes
/// the connection state. Retries forever until shut down.
pub struct Supervisor<T, S>
where
    T: Transport + 'static,
    S: MessageSink + 'static,
{
    transport: Arc<T>,
    sink: Arc<S>,
    lifecycle: ConnectionLifecycle,
}

impl<T, S> Supervisor<T, S>
where
    T: Transport + 'static,
    S: MessageSink + 'static,
{
    pub fn new(transport: Arc<T>, sink: Arc<S>, policy: Arc<dyn ReconnectPolicy>) -> Self {
        Supervisor {
            transport,
            sink,
            lifecycle: ConnectionLifecycle::new(policy),
        }
    }

    /// Spawn the supervision task
    pub fn start(self) -> SupervisorHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(state_tx, shutdown_rx));

        SupervisorHandle {
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(
        mut self,
        state_tx: watch::Sender<ConnectionState>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let mut session: Option<TransportSession> = None;
        let mut retry: Option<Pin<Box<Sleep>>> = None;
        let mut next = Some(LifecycleEvent::Start);

        loop {
            if let Some(event) = next.take() {
                let previous = self.lifecycle.status();
                let actions = self.lifecycle.handle(event);
                let status = self.lifecycle.status();
                if status != previous {
                    tracing::info!("Stream {}", status.label());
                }
                state_tx.send_replace(self.lifecycle.state().clone());

                let mut connect = false;
                for action in actions {
                    match action {
                        LifecycleAction::Connect => connect = true,
                        LifecycleAction::ScheduleRetry(delay) => {
                            tracing::info!("Reconnecting in {:?}", delay);
                            retry = Some(Box::pin(sleep(delay)));
                        }
                        LifecycleAction::CancelRetry => retry = None,
                        LifecycleAction::Close => {
                            if let Some(mut live) = session.take() {
                                live.close();
                            }
                        }
                    }
                }

                if self.lifecycle.is_shut_down() {
                    break;
                }

                if connect {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown_rx => {
                            next = Some(LifecycleEvent::Shutdown);
                        }
                        result = self.transport.connect() => match result {
                            Ok(opened) => {
                                session = Some(opened);
                                next = Some(LifecycleEvent::Opened);
                            }
                            Err(e) => {
                                tracing::warn!("Stream connect failed: {}", e);
                                next = Some(LifecycleEvent::Failed(e.to_string()));
                            }
                        },
                    }
                    continue;
                }
            }

            let event = tokio::select! {
                biased;
                _ = &mut shutdown_rx => LifecycleEvent::Shutdown,
                _ = retry_elapsed(&mut retry), if retry.is_some() => {
                    retry = None;
                    LifecycleEvent::RetryDue
                }
                event = next_transport_event(&mut session), if session.is_some() => match event {
                    Some(TransportEvent::Message(raw)) => {
                        self.sink.on_message(&raw);
                        continue;
                    }
                    Some(TransportEvent::Closed) | None => {
                        session = None;
                        LifecycleEvent::Closed
                    }
                    Some(TransportEvent::Error(e)) => {
                        tracing::error!("Stream error: {}", e);
                        session = None;
                        LifecycleEvent::Failed(e)
                    }
                },
            };
            next = Some(event);
        }

        tracing::debug!("Supervisor stopped");
    }
}

async fn retry_elapsed(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn next_transport_event(session: &mut Option<TransportSession>) -> Option<TransportEvent> {
    match session {
        Some(live) => live.next_event().await,
        None => std::future::pending().await,
    }
}

/// Handle to a running supervisor
///
/// Dropping the handle without calling [`SupervisorHandle::shutdown`] also
/// stops the supervisor.
pub struct SupervisorHandle {
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Watch channel of connection states
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Cancel any pending retry, close the live connection and wait for the task
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::error!("Supervisor task failed: {}", e);
        }
    }
}
