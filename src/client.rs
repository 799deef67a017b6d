//! HTTP client for the content API
//!
//! The content API resolves tracks, albums and playlists to metadata and serves
//! track payloads with tags and cover art already embedded:
//!
//! | Endpoint | Response |
//! |----------|----------|
//! | `GET /track/{id}` | [`TrackPage`] |
//! | `GET /album/{id}` | [`AlbumPage`] |
//! | `GET /playlist/{id}` | [`PlaylistPage`] |
//! | `GET /search?query=&type=&index=&limit=` | `{"results": SearchResults}` |
//! | `GET /track/{id}/download?format=&cover_format=&cover_size=` | audio bytes |

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ApiConfig, CoverConfig};
use crate::error::{Error, Result};
use crate::types::{AlbumPage, Format, PlaylistPage, SearchResults, SearchType, TrackPage};

/// Number of search results the listing pages request at a time
pub const SEARCH_PAGE_SIZE: u32 = 20;

#[derive(Deserialize)]
struct SearchResponse<T> {
    results: SearchResults<T>,
}

/// Content API client (cheap to clone, shares one connection pool)
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Payload URL of a track
    pub fn download_url(&self, track_id: &str) -> String {
        self.endpoint(&format!("track/{track_id}/download"))
    }

    /// Query parameters of a payload request
    pub fn download_query(format: Format, cover: &CoverConfig) -> [(&'static str, String); 3] {
        [
            ("cover_format", cover.format.clone()),
            ("cover_size", cover.size_param()),
            ("format", format.as_str().to_string()),
        ]
    }

    /// Look up a track and its album
    pub async fn track(&self, id: &str) -> Result<TrackPage> {
        self.get_json(&format!("track/{id}"), &[]).await
    }

    /// Look up an album and its tracks
    pub async fn album(&self, id: &str) -> Result<AlbumPage> {
        self.get_json(&format!("album/{id}"), &[]).await
    }

    /// Look up a playlist and its tracks
    pub async fn playlist(&self, id: &str) -> Result<PlaylistPage> {
        self.get_json(&format!("playlist/{id}"), &[]).await
    }

    /// Search the catalogue
    ///
    /// `T` is [`Track`](crate::Track), [`Album`](crate::Album) or
    /// [`Playlist`](crate::Playlist) to match `kind`. Pages start at `index`
    /// and hold at most `limit` entries; see [`SEARCH_PAGE_SIZE`].
    pub async fn search<T: DeserializeOwned>(
        &self,
        query: &str,
        kind: SearchType,
        index: u32,
        limit: u32,
    ) -> Result<SearchResults<T>> {
        let params = [
            ("query", query.to_string()),
            ("type", kind.as_str().to_string()),
            ("index", index.to_string()),
            ("limit", limit.to_string()),
        ];
        let response: SearchResponse<T> = self.get_json("search", &params).await?;
        debug!(
            %kind,
            total = response.results.total,
            count = response.results.data.len(),
            "search results"
        );
        Ok(response.results)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!(%url, "content API request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
