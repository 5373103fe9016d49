use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::{AppState, Effect, Msg, SessionId, SessionState, UNREACHABLE_MESSAGE};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RequestChanged(text) => {
            state.set_request_input(text);
            Vec::new()
        }
        Msg::InfoFieldAdded(field) => {
            state.add_info_field(&field);
            Vec::new()
        }
        Msg::InfoFieldRemoved(field) => {
            state.remove_info_field(&field);
            Vec::new()
        }
        Msg::EndpointLoaded(base) => {
            if state.set_base_url(&base).is_none() {
                engine_warn!("Ignoring empty base address");
            }
            Vec::new()
        }
        Msg::SearchSubmitted => submit(&mut state),
        Msg::CancelClicked => cancel(&mut state),
        Msg::ChunkReceived { session_id, chunk } => {
            if is_stale(&state, &session_id) {
                return (state, Vec::new());
            }
            state.apply_chunk(&chunk);
            Vec::new()
        }
        Msg::StreamEnded { session_id } => {
            if !is_stale(&state, &session_id) {
                // No terminal chunk arrived: the last-known state stands.
                engine_warn!(
                    "Stream {} ended without a terminal chunk; state stays {:?}",
                    session_id,
                    state.session()
                );
            }
            Vec::new()
        }
        Msg::StreamFailed {
            session_id,
            message,
        } => {
            if !is_stale(&state, &session_id) {
                engine_warn!("Stream {} failed: {}", session_id, message);
                state.fail(message);
            }
            Vec::new()
        }
        Msg::EndpointUnreachable {
            session_id,
            message,
        } => endpoint_unreachable(&mut state, &session_id, &message),
        Msg::EndpointResolved { session_id, base } => {
            endpoint_resolved(&mut state, &session_id, base.as_deref())
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn is_stale(state: &AppState, session_id: &SessionId) -> bool {
    if state.is_current(session_id) {
        return false;
    }
    engine_debug!("Ignoring message for inactive session {}", session_id);
    true
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.session() == SessionState::Running {
        engine_debug!("Search submitted while running; ignored");
        return Vec::new();
    }
    // A submission right after a stop only acknowledges it.
    if state.status_is_stopped_phase() {
        state.clear_status();
        return Vec::new();
    }

    let request = state.current_request();
    if request.request_string.is_empty() {
        return Vec::new();
    }
    let Some(session_id) = state.begin_session(request.clone()) else {
        return Vec::new();
    };
    engine_info!(
        "Starting session {} ({} info fields)",
        session_id,
        request.info_fields.len()
    );
    vec![Effect::OpenStream {
        session_id,
        base: state.base_url().to_string(),
        request,
    }]
}

fn cancel(state: &mut AppState) -> Vec<Effect> {
    if state.session() != SessionState::Running {
        return Vec::new();
    }
    let in_flight = state.take_in_flight();
    state.mark_stopped_locally();
    let Some(in_flight) = in_flight else {
        return Vec::new();
    };
    engine_info!("Cancelling session {}", in_flight.session_id);
    vec![
        Effect::AbortStream {
            session_id: in_flight.session_id.clone(),
        },
        Effect::NotifyStop {
            session_id: in_flight.session_id,
            base: in_flight.base,
        },
    ]
}

fn endpoint_unreachable(state: &mut AppState, session_id: &SessionId, message: &str) -> Vec<Effect> {
    if is_stale(state, session_id) {
        return Vec::new();
    }
    engine_warn!("Session {} could not reach the service: {}", session_id, message);
    let already_retried = state.in_flight().is_some_and(|f| f.retried);
    if already_retried {
        state.fail(UNREACHABLE_MESSAGE);
        return Vec::new();
    }
    match state.await_endpoint() {
        Some(failed_base) => vec![Effect::PromptForEndpoint {
            session_id: session_id.clone(),
            failed_base,
        }],
        None => Vec::new(),
    }
}

fn endpoint_resolved(
    state: &mut AppState,
    session_id: &SessionId,
    base: Option<&str>,
) -> Vec<Effect> {
    if is_stale(state, session_id) {
        return Vec::new();
    }
    if !state.in_flight().is_some_and(|f| f.awaiting_endpoint) {
        engine_debug!("Endpoint answer for {} without a pending prompt", session_id);
        return Vec::new();
    }

    let Some(base) = base.and_then(|b| state.set_base_url(b)) else {
        engine_info!("No replacement address supplied for {}", session_id);
        state.fail(UNREACHABLE_MESSAGE);
        return Vec::new();
    };
    let Some((retry_id, request)) = state.begin_retry(base.clone()) else {
        return Vec::new();
    };
    vec![
        Effect::PersistEndpoint { base: base.clone() },
        Effect::OpenStream {
            session_id: retry_id,
            base,
            request,
        },
    ]
}
