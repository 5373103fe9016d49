use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::request::{push_info_field, remove_info_field};
use crate::results::{self, AccumulatedResult};
use crate::view_model::AppViewModel;
use crate::{Chunk, SearchRequest, SessionId};

/// Base address used until the operator configures another one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Phase label shown after a cancellation, local or acknowledged by the producer.
pub const STOPPED_STATUS: &str = "Stopped by user";

pub const UNREACHABLE_STATUS: &str = "Search service unreachable";

pub const UNREACHABLE_MESSAGE: &str =
    "The search service could not be reached. Reload and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Done,
    Stopped,
    Error,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Stopped | Self::Error)
    }

    fn can_transition_to(self, next: SessionState) -> bool {
        match (self, next) {
            (Self::Running, Self::Running) => false,
            (_, Self::Running) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

/// The one session that may currently be running.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InFlight {
    pub(crate) session_id: SessionId,
    pub(crate) request: SearchRequest,
    pub(crate) base: String,
    pub(crate) retried: bool,
    pub(crate) awaiting_endpoint: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    session: SessionState,
    base_url: String,
    request_input: String,
    info_fields: Vec<String>,
    in_flight: Option<InFlight>,
    status: Option<String>,
    percent: Option<u8>,
    error: Option<String>,
    results: AccumulatedResult,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: SessionState::Idle,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_input: String::new(),
            info_fields: Vec::new(),
            in_flight: None,
            status: None,
            percent: None,
            error: None,
            results: AccumulatedResult::new(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn results(&self) -> &AccumulatedResult {
        &self.results
    }

    /// Identifier of the in-flight session, if any.
    pub fn active_session(&self) -> Option<&SessionId> {
        self.in_flight.as_ref().map(|f| &f.session_id)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            base_url: self.base_url.clone(),
            request_input: self.request_input.clone(),
            info_fields: self.info_fields.clone(),
            status: self.status.clone(),
            percent: self.percent,
            error: self.error.clone(),
            offers: self.results.offers().to_vec(),
            sites: self.results.sites().to_vec(),
            awaiting_endpoint: self
                .in_flight
                .as_ref()
                .is_some_and(|f| f.awaiting_endpoint),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The only writer of `session`. Illegal transitions are refused and logged.
    pub(crate) fn transition(&mut self, next: SessionState) -> bool {
        if !self.session.can_transition_to(next) {
            engine_warn!(
                "Refusing session transition {:?} -> {:?}",
                self.session,
                next
            );
            return false;
        }
        engine_info!("Session {:?} -> {:?}", self.session, next);
        self.session = next;
        if next.is_terminal() {
            self.in_flight = None;
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn is_current(&self, session_id: &SessionId) -> bool {
        self.active_session() == Some(session_id)
    }

    pub(crate) fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub(crate) fn take_in_flight(&mut self) -> Option<InFlight> {
        self.in_flight.take()
    }

    pub(crate) fn status_is_stopped_phase(&self) -> bool {
        self.status.as_deref().is_some_and(|status| {
            status
                .trim_start()
                .get(..7)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("stopped"))
        })
    }

    pub(crate) fn clear_status(&mut self) {
        self.status = None;
        self.mark_dirty();
    }

    pub(crate) fn set_request_input(&mut self, input: String) {
        if self.request_input != input {
            self.request_input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn add_info_field(&mut self, raw: &str) {
        if push_info_field(&mut self.info_fields, raw) {
            self.mark_dirty();
        }
    }

    pub(crate) fn remove_info_field(&mut self, raw: &str) {
        if remove_info_field(&mut self.info_fields, raw) {
            self.mark_dirty();
        }
    }

    pub(crate) fn current_request(&self) -> SearchRequest {
        SearchRequest::new(&self.request_input, &self.info_fields)
    }

    pub(crate) fn set_base_url(&mut self, base: &str) -> Option<String> {
        let normalized = normalize_base_url(base)?;
        if self.base_url != normalized {
            self.base_url = normalized.clone();
            self.mark_dirty();
        }
        Some(normalized)
    }

    /// Resets everything a previous session left behind and tracks a new one.
    pub(crate) fn begin_session(&mut self, request: SearchRequest) -> Option<SessionId> {
        if !self.session.can_transition_to(SessionState::Running) {
            return None;
        }
        self.status = None;
        self.percent = None;
        self.error = None;
        self.results = AccumulatedResult::new();
        let session_id = SessionId::generate();
        self.in_flight = Some(InFlight {
            session_id: session_id.clone(),
            request,
            base: self.base_url.clone(),
            retried: false,
            awaiting_endpoint: false,
        });
        self.transition(SessionState::Running);
        Some(session_id)
    }

    /// Replaces the in-flight handle with a retry against `base`.
    pub(crate) fn begin_retry(&mut self, base: String) -> Option<(SessionId, SearchRequest)> {
        let previous = self.in_flight.take()?;
        let session_id = SessionId::generate();
        engine_info!(
            "Retrying session {} as {} against {}",
            previous.session_id,
            session_id,
            base
        );
        self.in_flight = Some(InFlight {
            session_id: session_id.clone(),
            request: previous.request.clone(),
            base,
            retried: true,
            awaiting_endpoint: false,
        });
        self.status = None;
        self.mark_dirty();
        Some((session_id, previous.request))
    }

    pub(crate) fn mark_stopped_locally(&mut self) {
        self.status = Some(STOPPED_STATUS.to_string());
        self.percent = Some(100);
        self.transition(SessionState::Stopped);
    }

    pub(crate) fn await_endpoint(&mut self) -> Option<String> {
        let in_flight = self.in_flight.as_mut()?;
        in_flight.awaiting_endpoint = true;
        let failed_base = in_flight.base.clone();
        self.status = Some(UNREACHABLE_STATUS.to_string());
        self.mark_dirty();
        Some(failed_base)
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.transition(SessionState::Error);
    }

    /// Folds one chunk from the current session into the state.
    pub(crate) fn apply_chunk(&mut self, chunk: &Chunk) {
        self.results = results::apply(chunk, std::mem::take(&mut self.results));
        if let Some(status) = &chunk.status {
            self.status = Some(status.clone());
        }
        if let Some(percent) = chunk.percent {
            self.percent = Some(percent);
        }
        if let Some(error) = &chunk.error {
            engine_warn!("Producer reported error: {}", error);
            self.error = Some(error.clone());
        }
        self.mark_dirty();

        if chunk.stopped {
            engine_debug!("Producer acknowledged stop");
            self.transition(SessionState::Stopped);
        } else if chunk.is_authoritative_terminal() {
            self.transition(SessionState::Done);
        }
    }
}

/// Trims whitespace and trailing slashes; `None` when nothing is left.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
