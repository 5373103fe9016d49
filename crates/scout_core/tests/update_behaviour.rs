use std::sync::Once;

use pretty_assertions::assert_eq;
use scout_core::{
    parse_line, update, AppState, Effect, Msg, SearchRequest, SessionId, SessionState,
    DEFAULT_BASE_URL, STOPPED_STATUS,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn submit(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::RequestChanged(input.to_string()));
    update(state, Msg::SearchSubmitted)
}

fn opened_session(effects: &[Effect]) -> SessionId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenStream { session_id, .. } => Some(session_id.clone()),
            _ => None,
        })
        .expect("open stream effect")
}

fn feed(state: AppState, session_id: &SessionId, line: &str) -> AppState {
    match parse_line(line) {
        Some(chunk) => {
            update(
                state,
                Msg::ChunkReceived {
                    session_id: session_id.clone(),
                    chunk,
                },
            )
            .0
        }
        None => state,
    }
}

#[test]
fn submit_opens_stream_with_request_and_default_base() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::InfoFieldAdded("Price".into()));
    let (state, _) = update(state, Msg::InfoFieldAdded(" price ".into()));
    let (state, _) = update(state, Msg::InfoFieldAdded("Lead time".into()));
    let (mut state, effects) = submit(state, "  MS21042L3 qty 50 ");

    let session_id = opened_session(&effects);
    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            session_id: session_id.clone(),
            base: DEFAULT_BASE_URL.to_string(),
            request: SearchRequest {
                request_string: "MS21042L3 qty 50".to_string(),
                info_fields: vec!["Price".to_string(), "Lead time".to_string()],
            },
        }]
    );
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.active_session(), Some(&session_id));
    assert!(state.consume_dirty());
}

#[test]
fn submit_while_running_is_rejected() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let first = opened_session(&effects);

    let (state, effects) = update(state, Msg::SearchSubmitted);

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.active_session(), Some(&first));
}

#[test]
fn blank_request_does_not_start() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "   ");

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
}

#[test]
fn removed_info_field_is_not_sent() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::InfoFieldAdded("Price".into()));
    let (state, _) = update(state, Msg::InfoFieldAdded("Stock".into()));
    let (state, _) = update(state, Msg::InfoFieldRemoved("PRICE".into()));
    let (_state, effects) = submit(state, "part");

    match &effects[0] {
        Effect::OpenStream { request, .. } => {
            assert_eq!(request.info_fields, vec!["Stock".to_string()]);
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn terminal_chunk_completes_session_and_releases_handle() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let state = feed(state, &id, r#"{"status":"Searching","percent":5}"#);
    let state = feed(
        state,
        &id,
        r#"{"status":"Done","percent":100,"offers":[],"useful_sites":[]}"#,
    );

    assert_eq!(state.session(), SessionState::Done);
    assert_eq!(state.active_session(), None);
    let view = state.view();
    assert_eq!(view.status.as_deref(), Some("Done"));
    assert_eq!(view.percent, Some(100));
}

#[test]
fn producer_stop_acknowledgement_resolves_to_stopped() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let state = feed(state, &id, r#"{"offer":{"url":"https://a.example"}}"#);
    let state = feed(
        state,
        &id,
        r#"{"status":"Stopped by user","stopped":true,"percent":100,"offers":[{"url":"https://a.example"}],"useful_sites":["https://a.example"]}"#,
    );

    assert_eq!(state.session(), SessionState::Stopped);
    assert_eq!(state.results().offers().len(), 1);
}

#[test]
fn producer_error_is_surfaced_without_terminating() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let state = feed(state, &id, r#"{"error":"search engine throttled"}"#);
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(
        state.view().error.as_deref(),
        Some("search engine throttled")
    );

    let state = feed(state, &id, r#"{"error":"second failure"}"#);
    assert_eq!(state.view().error.as_deref(), Some("second failure"));
}

#[test]
fn percent_may_go_backwards() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let state = feed(state, &id, r#"{"percent":60}"#);
    let state = feed(state, &id, r#"{"percent":40,"status":"Analyzing"}"#);

    let view = state.view();
    assert_eq!(view.percent, Some(40));
    assert_eq!(view.status.as_deref(), Some("Analyzing"));
}

#[test]
fn malformed_line_is_ignored_and_next_line_applies() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let state = feed(state, &id, "not-json");
    let state = feed(state, &id, r#"{"percent":50}"#);

    let view = state.view();
    assert_eq!(view.percent, Some(50));
    assert_eq!(view.error, None);
    assert_eq!(view.session, SessionState::Running);
}

#[test]
fn stream_end_without_terminal_chunk_keeps_state() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);
    let state = feed(state, &id, r#"{"percent":30}"#);

    let (state, effects) = update(
        state,
        Msg::StreamEnded {
            session_id: id.clone(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.view().percent, Some(30));
    assert_eq!(state.view().error, None);

    // The operator can still cancel out of it.
    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(state.session(), SessionState::Stopped);
    assert_eq!(effects.len(), 2);
}

#[test]
fn stream_failure_moves_to_error() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let (state, _) = update(
        state,
        Msg::StreamFailed {
            session_id: id,
            message: "http status 500".into(),
        },
    );

    assert_eq!(state.session(), SessionState::Error);
    assert_eq!(state.view().error.as_deref(), Some("http status 500"));
    assert_eq!(state.active_session(), None);
}

#[test]
fn new_session_resets_previous_results() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);
    let state = feed(state, &id, r#"{"offer":{"url":"https://a.example"},"error":"x"}"#);
    let state = feed(state, &id, r#"{"percent":100,"useful_sites":["https://a.example"]}"#);
    assert_eq!(state.session(), SessionState::Done);

    let (state, effects) = update(state, Msg::SearchSubmitted);
    let second = opened_session(&effects);

    assert_ne!(second, id);
    let view = state.view();
    assert!(view.offers.is_empty());
    assert!(view.sites.is_empty());
    assert_eq!(view.error, None);
    assert_eq!(view.percent, None);
    assert_eq!(view.status, None);
}

#[test]
fn chunks_from_a_previous_session_are_ignored() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let first = opened_session(&effects);
    let (state, _) = update(state, Msg::CancelClicked);
    let (state, _) = update(state, Msg::SearchSubmitted); // acknowledges the stop
    let (state, effects) = update(state, Msg::SearchSubmitted);
    let second = opened_session(&effects);

    let state = feed(state, &first, r#"{"offer":{"url":"https://late.example"},"percent":90}"#);
    let (state, _) = update(
        state,
        Msg::StreamFailed {
            session_id: first,
            message: "late failure".into(),
        },
    );

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.active_session(), Some(&second));
    assert!(state.results().is_empty());
    assert_eq!(state.view().percent, None);
}

#[test]
fn cancel_stops_locally_and_notifies_producer_once() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "part");
    let id = opened_session(&effects);

    let (state, effects) = update(state, Msg::CancelClicked);

    assert_eq!(
        effects,
        vec![
            Effect::AbortStream {
                session_id: id.clone()
            },
            Effect::NotifyStop {
                session_id: id,
                base: DEFAULT_BASE_URL.to_string(),
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.session, SessionState::Stopped);
    assert_eq!(view.percent, Some(100));
    assert_eq!(view.status.as_deref(), Some(STOPPED_STATUS));
    assert!(view.offers.is_empty());
    assert_eq!(state.active_session(), None);

    let (_state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn cancel_when_not_running_is_noop() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::CancelClicked);

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert!(!state.consume_dirty());
}

#[test]
fn first_submit_after_stop_only_clears_the_label() {
    init_logging();
    let (state, _) = submit(AppState::new(), "part");
    let (state, _) = update(state, Msg::CancelClicked);

    let (state, effects) = update(state, Msg::SearchSubmitted);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Stopped);
    assert_eq!(state.view().status, None);

    let (state, effects) = update(state, Msg::SearchSubmitted);
    opened_session(&effects);
    assert_eq!(state.session(), SessionState::Running);
}

#[test]
fn endpoint_loaded_sets_base_for_next_session() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::EndpointLoaded("http://10.0.0.5:8000/api/".into()),
    );
    let (_state, effects) = submit(state, "part");

    match &effects[0] {
        Effect::OpenStream { base, .. } => assert_eq!(base, "http://10.0.0.5:8000/api"),
        other => panic!("unexpected effect {other:?}"),
    }
}
