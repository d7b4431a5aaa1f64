//! API response types for SteamGridDB.

use serde::{Deserialize, Serialize};

/// A game search result from the SteamGridDB API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Grid image metadata from the SteamGridDB API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridImage {
    pub id: i32,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumb: String,
}

/// API response wrapper (internal).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    #[allow(dead_code)]
    pub success: bool,
    #[serde(default)]
    pub data: T,
}
