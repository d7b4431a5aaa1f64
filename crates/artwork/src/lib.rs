//! Cover-art resolution for discovered titles.
//!
//! An ordered fallback chain: SteamGridDB (credentialed), then the Steam
//! CDN (credential-free), then nothing. Every payload is validated as a
//! decodable image before touching the artwork directory; a title
//! without resolvable artwork is a normal outcome, never an error.

pub mod cdn;
pub mod client;
pub mod resolver;
pub mod types;

pub use cdn::CdnClient;
pub use client::Client;
pub use resolver::{ArtworkRequest, ArtworkResolver};
pub use types::{GridImage, SearchResult};

/// Errors from artwork providers.
#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid API key")]
    InvalidKey,

    #[error("payload is not a decodable image")]
    InvalidImage,
}
