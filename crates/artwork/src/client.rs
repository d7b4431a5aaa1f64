//! SteamGridDB API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! Only the endpoints the resolver needs: name search, grids by Steam
//! app id, grids by SteamGridDB game id, and raw image download.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::ArtworkError;
use crate::types::{ApiResponse, GridImage, SearchResult};

const DEFAULT_BASE_URL: &str = "https://www.steamgriddb.com/api/v2";

/// SteamGridDB API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client with the given API key.
    pub fn new(api_key: &str) -> Result<Self, ArtworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|_| ArtworkError::InvalidKey)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a local server instead of SteamGridDB.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Performs an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<Vec<u8>, ArtworkError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ArtworkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    /// Searches for games by name.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, ArtworkError> {
        let encoded = utf8_percent_encode(term, NON_ALPHANUMERIC).to_string();
        let body = self.get(&format!("/search/autocomplete/{encoded}")).await?;
        let resp: ApiResponse<Vec<SearchResult>> = serde_json::from_slice(&body)?;
        Ok(resp.data)
    }

    /// Returns grid images for a Steam app id.
    pub async fn grids_for_steam_app(&self, app_id: u32) -> Result<Vec<GridImage>, ArtworkError> {
        let body = self.get(&format!("/grids/steam/{app_id}")).await?;
        let resp: ApiResponse<Vec<GridImage>> = serde_json::from_slice(&body)?;
        Ok(resp.data)
    }

    /// Returns grid images for a SteamGridDB game id.
    pub async fn grids_for_game(&self, game_id: i32) -> Result<Vec<GridImage>, ArtworkError> {
        let body = self.get(&format!("/grids/game/{game_id}")).await?;
        let resp: ApiResponse<Vec<GridImage>> = serde_json::from_slice(&body)?;
        Ok(resp.data)
    }

    /// Downloads image data from a URL.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, ArtworkError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ArtworkError::Api {
                status: status.as_u16(),
                body: "download failed".into(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
