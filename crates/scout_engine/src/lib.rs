//! PartScout engine: streaming transport, line decoding and session read loops.
mod engine;
mod lines;
mod session;
mod transport;
mod types;

pub use engine::EngineHandle;
pub use lines::LineDecoder;
pub use session::{read_session, ReadOutcome};
pub use transport::{
    endpoint_url, ByteStream, ChannelEventSink, EventSink, ReqwestTransport, SearchTransport,
    TransportSettings,
};
pub use types::{EngineEvent, FailureKind, TransportError};
