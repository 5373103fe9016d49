use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use scout_core::{parse_line, SearchRequest, SessionId};
use tokio_util::sync::CancellationToken;

use crate::lines::LineDecoder;
use crate::transport::{EventSink, SearchTransport};
use crate::EngineEvent;

/// How a session's read loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Ended,
    Failed,
    Unreachable,
    Cancelled,
}

/// Opens the search stream and forwards each decoded chunk to `sink`.
///
/// Exactly one closing event (`StreamEnded`, `StreamFailed` or `Unreachable`) follows
/// the chunks, unless `cancel` fires first, in which case nothing more is emitted.
pub async fn read_session(
    transport: &dyn SearchTransport,
    base: &str,
    session_id: &SessionId,
    request: &SearchRequest,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) -> ReadOutcome {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return ReadOutcome::Cancelled,
        opened = transport.open_search(base, session_id, request) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) if error.kind.is_unreachable() => {
            engine_warn!("Session {} cannot reach {}: {}", session_id, base, error);
            sink.emit(EngineEvent::Unreachable {
                session_id: session_id.clone(),
                error,
            });
            return ReadOutcome::Unreachable;
        }
        Err(error) => {
            engine_warn!("Session {} failed to open: {}", session_id, error);
            sink.emit(EngineEvent::StreamFailed {
                session_id: session_id.clone(),
                error,
            });
            return ReadOutcome::Failed;
        }
    };
    engine_info!("Session {} streaming from {}", session_id, base);

    let mut decoder = LineDecoder::new();
    let mut chunks = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                engine_info!("Session {} aborted after {} chunks", session_id, chunks);
                return ReadOutcome::Cancelled;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                for line in decoder.feed(&bytes) {
                    if let Some(chunk) = parse_line(&line) {
                        chunks += 1;
                        sink.emit(EngineEvent::Chunk {
                            session_id: session_id.clone(),
                            chunk,
                        });
                    }
                }
            }
            Some(Err(error)) => {
                engine_warn!("Session {} stream broke: {}", session_id, error);
                sink.emit(EngineEvent::StreamFailed {
                    session_id: session_id.clone(),
                    error,
                });
                return ReadOutcome::Failed;
            }
            None => {
                decoder.finish();
                engine_debug!("Session {} ended after {} chunks", session_id, chunks);
                sink.emit(EngineEvent::StreamEnded {
                    session_id: session_id.clone(),
                });
                return ReadOutcome::Ended;
            }
        }
    }
}
