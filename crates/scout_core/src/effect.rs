use crate::{SearchRequest, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open `POST {base}/search` and feed its lines back as messages.
    OpenStream {
        session_id: SessionId,
        base: String,
        request: SearchRequest,
    },
    /// Abort the local read loop of this session now.
    AbortStream { session_id: SessionId },
    /// Tell the producer to stop. Detached: the outcome is never reported back.
    NotifyStop { session_id: SessionId, base: String },
    /// Ask the operator for a replacement base address.
    PromptForEndpoint {
        session_id: SessionId,
        failed_base: String,
    },
    /// Store `base` as the default for future sessions.
    PersistEndpoint { base: String },
}
