//! Typed catalog endpoints
//!
//! Thin wrappers over [`ApiClient::request`] for the endpoints the client
//! uses: albums, album tracks, the saved-album library, search and artists.

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::api::{ApiClient, ForbiddenHook, RequestOptions};
use super::error::ApiError;
use crate::models::{Album, ArtistDetails, Paging, SavedAlbum, SearchResponse, SearchType, Track};

/// Largest page the catalog hands out
pub const MAX_PAGE_SIZE: u32 = 50;

/// Catalog endpoints bound to a bearer token
#[derive(Clone)]
pub struct Catalog {
    api: ApiClient,
    token: String,
    on_forbidden: Option<Arc<ForbiddenHook>>,
}

impl Catalog {
    pub fn new(api: ApiClient, token: String) -> Self {
        Self {
            api,
            token,
            on_forbidden: None,
        }
    }

    /// Run `hook` whenever the service answers 403
    pub fn on_forbidden(mut self, hook: Arc<ForbiddenHook>) -> Self {
        self.on_forbidden = Some(hook);
        self
    }

    /// `GET /albums/{id}`
    pub async fn get_album(&self, id: &str) -> Result<Album, ApiError> {
        self.fetch(&path(&["albums", id])?).await
    }

    /// `GET /albums/{id}/tracks`
    pub async fn get_album_tracks(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Track>, ApiError> {
        let query = page_query(limit, offset)?;
        self.fetch(&format!("{}?{}", path(&["albums", id, "tracks"])?, query))
            .await
    }

    /// `GET /tracks/{id}`
    pub async fn get_track(&self, id: &str) -> Result<Track, ApiError> {
        self.fetch(&path(&["tracks", id])?).await
    }

    /// `GET /me/albums`
    pub async fn saved_albums(&self, limit: u32, offset: u32) -> Result<Paging<SavedAlbum>, ApiError> {
        let query = page_query(limit, offset)?;
        self.fetch(&format!("/me/albums?{}", query)).await
    }

    /// `PUT /me/albums?ids=..`
    pub async fn save_albums(&self, ids: &[&str]) -> Result<(), ApiError> {
        let query = ids_query(ids)?;
        self.send(&format!("/me/albums?{}", query), RequestOptions::put())
            .await
    }

    /// `DELETE /me/albums?ids=..`
    pub async fn remove_saved_albums(&self, ids: &[&str]) -> Result<(), ApiError> {
        let query = ids_query(ids)?;
        self.send(&format!("/me/albums?{}", query), RequestOptions::delete())
            .await
    }

    /// `GET /me/albums/contains?ids=..`, one flag per id in request order
    pub async fn check_saved_albums(&self, ids: &[&str]) -> Result<Vec<bool>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = ids_query(ids)?;
        self.fetch(&format!("/me/albums/contains?{}", query))
            .await
    }

    /// `GET /search?q=..&type=..`
    pub async fn search(
        &self,
        query: &str,
        types: &[SearchType],
        limit: u32,
        offset: u32,
    ) -> Result<SearchResponse, ApiError> {
        let types = if types.is_empty() {
            SearchType::default().as_str().to_string()
        } else {
            types
                .iter()
                .map(SearchType::as_str)
                .collect::<Vec<_>>()
                .join(",")
        };

        let params = [
            ("q", query.to_string()),
            ("type", types),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("offset", offset.to_string()),
        ];
        let query = encode(&params)?;
        self.fetch(&format!("/search?{}", query)).await
    }

    /// `GET /artists/{id}`
    pub async fn get_artist(&self, id: &str) -> Result<ArtistDetails, ApiError> {
        self.fetch(&path(&["artists", id])?).await
    }

    /// `GET /artists/{id}`, abandoned if `cancel` fires first
    pub async fn get_artist_cancellable(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ArtistDetails, ApiError> {
        let body = self
            .api
            .request_cancellable(
                &path(&["artists", id])?,
                &self.token,
                RequestOptions::get(),
                self.on_forbidden.as_deref(),
                cancel,
            )
            .await?;
        body.ok_or_else(empty_body)
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let body = self
            .api
            .request(
                endpoint,
                &self.token,
                RequestOptions::get(),
                self.on_forbidden.as_deref(),
            )
            .await?;
        body.ok_or_else(empty_body)
    }

    async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<(), ApiError> {
        self.api
            .request::<serde_json::Value>(
                endpoint,
                &self.token,
                options,
                self.on_forbidden.as_deref(),
            )
            .await?;
        Ok(())
    }
}

fn empty_body() -> ApiError {
    ApiError::InvalidResponse("expected a response body".to_string())
}

/// Endpoint path from raw segments, each percent-encoded
fn path(segments: &[&str]) -> Result<String, ApiError> {
    let mut url = Url::parse("http://localhost/").map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidRequest("cannot build endpoint path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

fn encode(params: &[(&str, String)]) -> Result<String, ApiError> {
    serde_urlencoded::to_string(params).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn page_query(limit: u32, offset: u32) -> Result<String, ApiError> {
    encode(&[
        ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ("offset", offset.to_string()),
    ])
}

fn ids_query(ids: &[&str]) -> Result<String, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::InvalidRequest("no ids given".to_string()));
    }
    encode(&[("ids", ids.join(","))])
}
