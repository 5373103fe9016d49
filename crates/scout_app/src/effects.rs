use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use scout_core::{Effect, Msg, SessionId};
use scout_engine::{EngineEvent, EngineHandle, TransportSettings};

use crate::settings::SettingsStore;

/// Effects the runner cannot perform alone and hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Deferred {
    PromptForEndpoint {
        session_id: SessionId,
        failed_base: String,
    },
}

pub(crate) struct EffectRunner {
    engine: EngineHandle,
    store: SettingsStore,
    stop_grace: Duration,
}

impl EffectRunner {
    pub(crate) fn new(settings: TransportSettings, store: SettingsStore) -> Self {
        Self {
            stop_grace: settings.stop_timeout,
            engine: EngineHandle::new(settings),
            store,
        }
    }

    /// Lets in-flight stop notifications finish, bounded by the stop timeout.
    pub(crate) fn shutdown(self) {
        self.engine.shutdown(self.stop_grace);
    }

    pub(crate) fn run(&self, effects: Vec<Effect>) -> Vec<Deferred> {
        let mut deferred = Vec::new();
        for effect in effects {
            match effect {
                Effect::OpenStream {
                    session_id,
                    base,
                    request,
                } => {
                    engine_info!(
                        "OpenStream session={} base={} request_len={}",
                        session_id,
                        base,
                        request.request_string.len()
                    );
                    self.engine.open(session_id, base, request);
                }
                Effect::AbortStream { session_id } => {
                    self.engine.abort(&session_id);
                }
                Effect::NotifyStop { session_id, base } => {
                    self.engine.notify_stop(session_id, base);
                }
                Effect::PersistEndpoint { base } => match self.store.save_base_url(&base) {
                    Ok(path) => engine_info!("Saved base address {} to {:?}", base, path),
                    Err(err) => engine_error!("Failed to save base address {}: {}", base, err),
                },
                Effect::PromptForEndpoint {
                    session_id,
                    failed_base,
                } => deferred.push(Deferred::PromptForEndpoint {
                    session_id,
                    failed_base,
                }),
            }
        }
        deferred
    }

    /// Waits up to `timeout` for the next engine event, mapped to a core message.
    pub(crate) fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Chunk { session_id, chunk } => Msg::ChunkReceived { session_id, chunk },
        EngineEvent::StreamEnded { session_id } => Msg::StreamEnded { session_id },
        EngineEvent::StreamFailed { session_id, error } => Msg::StreamFailed {
            session_id,
            message: error.to_string(),
        },
        EngineEvent::Unreachable { session_id, error } => Msg::EndpointUnreachable {
            session_id,
            message: error.to_string(),
        },
    }
}
