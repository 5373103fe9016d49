use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use scout_core::{SearchRequest, SessionId, StopBody};

use crate::{EngineEvent, FailureKind, TransportError};

/// Response body of a search, delivered in whatever pieces the network produces.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    /// Bounds the stop notification only; the search stream itself has no deadline.
    pub stop_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait SearchTransport: Send + Sync {
    /// `POST {base}/search`; resolves once response headers arrive.
    async fn open_search(
        &self,
        base: &str,
        session_id: &SessionId,
        request: &SearchRequest,
    ) -> Result<ByteStream, TransportError>;

    /// `POST {base}/stop`; the response body is ignored.
    async fn notify_stop(&self, base: &str, session_id: &SessionId)
        -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, timeout: Option<Duration>) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.settings.connect_timeout);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
    }
}

/// Joins `base` and `path` with exactly one slash.
pub fn endpoint_url(base: &str, path: &str) -> Result<reqwest::Url, TransportError> {
    let joined = format!("{}/{}", base.trim().trim_end_matches('/'), path);
    let url = reqwest::Url::parse(&joined)
        .map_err(|err| TransportError::new(FailureKind::InvalidUrl, format!("{joined}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme in {joined}"),
        ));
    }
    Ok(url)
}

#[async_trait::async_trait]
impl SearchTransport for ReqwestTransport {
    async fn open_search(
        &self,
        base: &str,
        session_id: &SessionId,
        request: &SearchRequest,
    ) -> Result<ByteStream, TransportError> {
        let url = endpoint_url(base, "search")?;
        let client = self.build_client(None)?;

        let response = client
            .post(url)
            .json(&request.body(session_id))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        Ok(response
            .bytes_stream()
            .map(|piece| {
                piece.map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
            })
            .boxed())
    }

    async fn notify_stop(
        &self,
        base: &str,
        session_id: &SessionId,
    ) -> Result<(), TransportError> {
        let url = endpoint_url(base, "stop")?;
        let client = self.build_client(Some(self.settings.stop_timeout))?;
        client
            .post(url)
            .json(&StopBody {
                stream_id: session_id,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        return TransportError::new(FailureKind::Unreachable, err.to_string());
    }
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
