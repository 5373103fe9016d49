use crate::{Chunk, SessionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Operator edited the free-text request.
    RequestChanged(String),
    /// Operator added an information-field tag.
    InfoFieldAdded(String),
    /// Operator removed an information-field tag.
    InfoFieldRemoved(String),
    /// Operator submitted the current request.
    SearchSubmitted,
    /// Operator asked to stop the running search.
    CancelClicked,
    /// Persisted or configured base address became known.
    EndpointLoaded(String),
    /// One decoded chunk from a search stream.
    ChunkReceived { session_id: SessionId, chunk: Chunk },
    /// The transport reported end-of-data.
    StreamEnded { session_id: SessionId },
    /// The stream failed after it was opened, or the service answered with an error status.
    StreamFailed { session_id: SessionId, message: String },
    /// The target address could not be reached at all.
    EndpointUnreachable { session_id: SessionId, message: String },
    /// Operator answered the replacement-address prompt; `None` means they declined.
    EndpointResolved {
        session_id: SessionId,
        base: Option<String>,
    },
    /// Render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
