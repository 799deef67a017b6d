//! Track payload fetching
//!
//! [`TrackFetcher`] is the seam between the run loop and the network. The run
//! loop passes the job's cancellation token into every call and expects a
//! cancelled request to fail with [`FetchError::Cancelled`], distinct from any
//! other failure.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ApiClient;
use crate::config::CoverConfig;
use crate::error::FetchError;
use crate::types::Format;

/// Largest buffer reserved up front from an advertised `Content-Length`
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// One track payload request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Track id
    pub track_id: String,
    /// Requested quality tier
    pub format: Format,
    /// Cover art to embed
    pub cover: CoverConfig,
}

/// Abstraction over track payload retrieval, enabling testability
#[async_trait::async_trait]
pub trait TrackFetcher: Send + Sync {
    /// Fetch the complete payload of one track
    ///
    /// `progress` receives `(bytes_loaded, total_bytes)` after every chunk; the
    /// total is `None` when the server sends no `Content-Length`. Implementations
    /// must return [`FetchError::Cancelled`] once `cancel` fires.
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
        progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> Result<Vec<u8>, FetchError>;
}

/// Production [`TrackFetcher`] streaming payloads from the content API
#[derive(Clone, Debug)]
pub struct HttpTrackFetcher {
    client: ApiClient,
}

impl HttpTrackFetcher {
    /// Create a fetcher on top of an API client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl TrackFetcher for HttpTrackFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
        progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let url = self.client.download_url(&request.track_id);
        let send = self
            .client
            .http()
            .get(&url)
            .query(&ApiClient::download_query(request.format, &request.cover))
            .send();

        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let total = response.content_length();
        let mut data =
            Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATION) as usize);
        progress(0, total);

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                chunk = response.chunk() => chunk?,
            };
            match chunk {
                Some(bytes) => {
                    data.extend_from_slice(&bytes);
                    progress(data.len() as u64, total);
                }
                None => break,
            }
        }

        debug!(
            track_id = %request.track_id,
            format = request.format.as_str(),
            size_bytes = data.len(),
            "track payload fetched"
        );
        Ok(data)
    }
}
