use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_warn};
use scout_core::{SearchRequest, SessionId};
use tokio_util::sync::CancellationToken;

use crate::session::read_session;
use crate::transport::{ChannelEventSink, ReqwestTransport, SearchTransport, TransportSettings};
use crate::EngineEvent;

enum EngineCommand {
    Open {
        session_id: SessionId,
        base: String,
        request: SearchRequest,
        cancel: CancellationToken,
    },
    NotifyStop {
        session_id: SessionId,
        base: String,
    },
    Shutdown {
        grace: Duration,
    },
}

struct ActiveSession {
    session_id: SessionId,
    cancel: CancellationToken,
}

type ActiveSlot = Arc<Mutex<Option<ActiveSession>>>;

/// Runs search streams on a background tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    active: ActiveSlot,
    worker: thread::JoinHandle<()>,
}

impl EngineHandle {
    pub fn new(settings: TransportSettings) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new(settings)))
    }

    pub fn with_transport(transport: Arc<dyn SearchTransport>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let active: ActiveSlot = Arc::new(Mutex::new(None));
        let worker_active = active.clone();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut stops: Vec<tokio::task::JoinHandle<()>> = Vec::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Open {
                        session_id,
                        base,
                        request,
                        cancel,
                    } => {
                        let transport = transport.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        let active = worker_active.clone();
                        runtime.spawn(async move {
                            let outcome = read_session(
                                transport.as_ref(),
                                &base,
                                &session_id,
                                &request,
                                &cancel,
                                &sink,
                            )
                            .await;
                            engine_debug!("Session {} finished reading: {:?}", session_id, outcome);
                            release(&active, &session_id);
                        });
                    }
                    EngineCommand::NotifyStop { session_id, base } => {
                        let transport = transport.clone();
                        stops.retain(|stop| !stop.is_finished());
                        stops.push(runtime.spawn(async move {
                            send_stop(transport.as_ref(), &base, &session_id).await;
                        }));
                    }
                    EngineCommand::Shutdown { grace } => {
                        drain_stops(&runtime, stops, grace);
                        runtime.shutdown_timeout(grace);
                        return;
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx,
            active,
            worker,
        }
    }

    /// Starts reading a session. Any session still tracked is superseded and aborted.
    pub fn open(&self, session_id: SessionId, base: impl Into<String>, request: SearchRequest) {
        let cancel = CancellationToken::new();
        let previous = lock(&self.active).replace(ActiveSession {
            session_id: session_id.clone(),
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            engine_debug!("Session {} superseded", previous.session_id);
            previous.cancel.cancel();
        }
        let _ = self.cmd_tx.send(EngineCommand::Open {
            session_id,
            base: base.into(),
            request,
            cancel,
        });
    }

    /// Aborts the read loop of `session_id` immediately. No-op for any other session.
    pub fn abort(&self, session_id: &SessionId) -> bool {
        let mut slot = lock(&self.active);
        match slot.as_ref() {
            Some(active) if active.session_id == *session_id => {
                active.cancel.cancel();
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Fire-and-forget stop notification; its outcome is only logged.
    pub fn notify_stop(&self, session_id: SessionId, base: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::NotifyStop {
            session_id,
            base: base.into(),
        });
    }

    /// Stops the runtime, giving pending stop notifications up to `grace` to complete.
    ///
    /// Any session still reading is dropped. Blocks until the worker thread exits.
    pub fn shutdown(self, grace: Duration) {
        if let Some(active) = lock(&self.active).take() {
            active.cancel.cancel();
        }
        if self.cmd_tx.send(EngineCommand::Shutdown { grace }).is_err() {
            return;
        }
        if self.worker.join().is_err() {
            engine_error!("Engine worker panicked during shutdown");
        }
    }

    pub fn is_tracking(&self, session_id: &SessionId) -> bool {
        lock(&self.active)
            .as_ref()
            .is_some_and(|active| active.session_id == *session_id)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn send_stop(transport: &dyn SearchTransport, base: &str, session_id: &SessionId) {
    match transport.notify_stop(base, session_id).await {
        Ok(()) => engine_debug!("Stop notification for {} delivered", session_id),
        Err(err) => engine_debug!("Stop notification for {} failed: {}", session_id, err),
    }
}

fn drain_stops(
    runtime: &tokio::runtime::Runtime,
    stops: Vec<tokio::task::JoinHandle<()>>,
    grace: Duration,
) {
    let pending: Vec<_> = stops.into_iter().filter(|stop| !stop.is_finished()).collect();
    if pending.is_empty() {
        return;
    }
    engine_debug!("Waiting up to {:?} for {} stop notification(s)", grace, pending.len());
    let drained = runtime.block_on(async {
        tokio::time::timeout(grace, async {
            for stop in pending {
                let _ = stop.await;
            }
        })
        .await
    });
    if drained.is_err() {
        engine_warn!("Stop notifications still pending after {:?}; abandoning them", grace);
    }
}

fn release(active: &ActiveSlot, session_id: &SessionId) {
    let mut slot = lock(active);
    if slot
        .as_ref()
        .is_some_and(|current| current.session_id == *session_id)
    {
        *slot = None;
    }
}

fn lock(active: &ActiveSlot) -> MutexGuard<'_, Option<ActiveSession>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}
