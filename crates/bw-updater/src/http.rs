//! HTTP client seam
//!
//! The pipeline only needs two requests: a HEAD for the status code and
//! ETag, and a GET whose body is streamed into a local sink.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use reqwest::header::ETAG;
use url::Url;

const USER_AGENT: &str = concat!("blockwright/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const HEAD_TIMEOUT: Duration = Duration::from_secs(60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Error type for HTTP operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("connection failed: {0}")]
    Unreachable(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("no data received for {0:?}")]
    Stalled(Duration),
    #[error("failed to write response body: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: u16,
    pub etag: Option<String>,
}

/// Network access used by the update pipeline.
pub trait HttpClient: Send + Sync {
    /// Issue a HEAD request; no body is transferred.
    fn head(&self, url: &Url) -> impl Future<Output = Result<HeadResponse, FetchError>> + Send;

    /// GET `url` and stream the body into `sink`, returning the byte count.
    ///
    /// Non-2xx responses are reported as [`FetchError::Status`].
    fn download(
        &self,
        url: &Url,
        sink: &mut (dyn Write + Send),
    ) -> impl Future<Output = Result<u64, FetchError>> + Send;
}

/// [`HttpClient`] backed by `reqwest`.
///
/// HEAD requests have an overall deadline. Downloads have none; they fail only
/// when the server sends nothing for the idle timeout, so large lists on slow
/// links still complete.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    head_timeout: Duration,
    idle_timeout: Duration,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(HEAD_TIMEOUT, IDLE_TIMEOUT)
    }

    pub fn with_timeouts(head_timeout: Duration, idle_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            head_timeout,
            idle_timeout,
        })
    }

    async fn idle_bounded<T>(&self, step: impl Future<Output = reqwest::Result<T>>) -> Result<T, FetchError> {
        match tokio::time::timeout(self.idle_timeout, step).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FetchError::Stalled(self.idle_timeout)),
        }
    }
}

impl HttpClient for ReqwestClient {
    async fn head(&self, url: &Url) -> Result<HeadResponse, FetchError> {
        let response = self
            .client
            .head(url.clone())
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FetchError::Unreachable(e.to_string())
                } else {
                    FetchError::Transport(e)
                }
            })?;
        let etag = response.headers().get(ETAG).and_then(|value| match value.to_str() {
            Ok(etag) => Some(etag.to_string()),
            Err(_) => {
                log::warn!("Ignoring non-ASCII ETag from {}: {:?}", url, value);
                None
            }
        });

        Ok(HeadResponse {
            status: response.status().as_u16(),
            etag,
        })
    }

    async fn download(&self, url: &Url, sink: &mut (dyn Write + Send)) -> Result<u64, FetchError> {
        let mut response = self.idle_bounded(self.client.get(url.clone()).send()).await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mut written = 0u64;
        while let Some(chunk) = self.idle_bounded(response.chunk()).await? {
            sink.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        sink.flush()?;

        Ok(written)
    }
}
