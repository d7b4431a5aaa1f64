//! Credential-free Steam CDN cover fallback.
//!
//! When no SteamGridDB key is configured (or the provider yields
//! nothing), titles with a Steam app id can still get a cover straight
//! from the store CDN: high-res library capsule, standard capsule, then
//! the wide header tile.

use tracing::debug;

use crate::ArtworkError;

const DEFAULT_BASE_URL: &str = "https://steamcdn-a.akamaihd.net/steam/apps";

/// Cover candidates per app id, best first.
const COVER_FILES: [&str; 3] = ["library_600x900_2x.jpg", "library_600x900.jpg", "header.jpg"];

/// Steam CDN client.
pub struct CdnClient {
    http: reqwest::Client,
    base_url: String,
}

impl CdnClient {
    pub fn new() -> Result<Self, ArtworkError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a local server instead of the CDN.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Fetches the best available cover for an app id.
    ///
    /// A non-success status moves on to the next candidate; `Ok(None)`
    /// means the CDN has no cover at all for this id. Network failures
    /// are returned for the caller's retry policy to handle.
    pub async fn fetch_cover(&self, app_id: u32) -> Result<Option<Vec<u8>>, ArtworkError> {
        for file in COVER_FILES {
            let url = format!("{}/{app_id}/{file}", self.base_url);
            let resp = self.http.get(&url).send().await?;
            if resp.status().is_success() {
                return Ok(Some(resp.bytes().await?.to_vec()));
            }
            debug!(url, status = %resp.status(), "cdn candidate unavailable");
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Mock CDN: answers 200 with `body` for requests whose path contains
    /// `serve_file`, 404 otherwise.
    async fn mock_cdn(serve_file: &str, body: &[u8]) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let serve_file = serve_file.to_string();
        let body = body.to_vec();

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let req = String::from_utf8_lossy(&buf[..n]).into_owned();

                let resp = if req.contains(&serve_file) {
                    let mut head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    )
                    .into_bytes();
                    head.extend_from_slice(&body);
                    head
                } else {
                    b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_vec()
                };
                let _ = stream.write_all(&resp).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, handle)
    }

    #[tokio::test]
    async fn serves_first_available_candidate() {
        let (url, handle) = mock_cdn("library_600x900_2x.jpg", b"hi-res").await;
        let cdn = CdnClient::new().unwrap().with_base_url(url);
        let bytes = cdn.fetch_cover(440).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(b"hi-res".as_slice()));
        handle.abort();
    }

    #[tokio::test]
    async fn falls_through_to_header_tile() {
        let (url, handle) = mock_cdn("header.jpg", b"wide").await;
        let cdn = CdnClient::new().unwrap().with_base_url(url);
        let bytes = cdn.fetch_cover(440).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(b"wide".as_slice()));
        handle.abort();
    }

    #[tokio::test]
    async fn no_candidate_is_none() {
        let (url, handle) = mock_cdn("nothing-matches", b"").await;
        let cdn = CdnClient::new().unwrap().with_base_url(url);
        let bytes = cdn.fetch_cover(440).await.unwrap();
        assert!(bytes.is_none());
        handle.abort();
    }
}
