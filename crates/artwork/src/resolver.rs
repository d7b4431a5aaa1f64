//! Tiered artwork resolution.
//!
//! Tier 1: SteamGridDB, when an API key is configured; by Steam app id
//! directly, or via name search for titles from other launchers.
//! Tier 2: the Steam CDN, when the title has a Steam app id.
//! Tier 3: nothing, and the entry is saved without artwork.
//!
//! Each downloaded payload must decode as an image; a corrupt payload
//! fails its tier and the chain moves on.

use std::io::Cursor;
use std::path::PathBuf;

use gamesphere_common::RetryPolicy;
use tracing::{debug, warn};

use crate::cdn::CdnClient;
use crate::client::Client;
use crate::ArtworkError;

/// One title's artwork lookup input.
pub struct ArtworkRequest<'a> {
    /// Identity-derived file stem for the saved cover.
    pub file_stem: &'a str,
    pub display_name: &'a str,
    /// Platform-native numeric identity, when known.
    pub steam_app_id: Option<u32>,
}

/// Resolves covers through the provider fallback chain and persists them
/// into the artwork directory.
pub struct ArtworkResolver {
    grid: Option<Client>,
    cdn: CdnClient,
    artwork_dir: PathBuf,
    retry: RetryPolicy,
}

impl ArtworkResolver {
    /// Creates a resolver; the SteamGridDB tier is active only when an
    /// API key is supplied.
    pub fn new(api_key: Option<&str>, artwork_dir: PathBuf) -> Result<Self, ArtworkError> {
        let grid = match api_key {
            Some(key) if !key.is_empty() => Some(Client::new(key)?),
            _ => None,
        };
        Ok(Self {
            grid,
            cdn: CdnClient::new()?,
            artwork_dir,
            retry: RetryPolicy::default(),
        })
    }

    /// Assembles a resolver from pre-built clients (test servers).
    pub fn from_clients(
        grid: Option<Client>,
        cdn: CdnClient,
        artwork_dir: PathBuf,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            grid,
            cdn,
            artwork_dir,
            retry,
        }
    }

    /// Resolves and persists a cover, returning its local path.
    ///
    /// `None` is a valid terminal state: provider outages, missing
    /// matches and corrupt payloads all end here, never as run failures.
    pub async fn resolve(&self, req: &ArtworkRequest<'_>) -> Option<PathBuf> {
        let bytes = match self.tier_griddb(req).await {
            Some(bytes) => Some(bytes),
            None => self.tier_cdn(req).await,
        }?;

        self.persist(req.file_stem, &bytes)
    }

    /// Tier 1: SteamGridDB grid lookup.
    async fn tier_griddb(&self, req: &ArtworkRequest<'_>) -> Option<Vec<u8>> {
        let grid = self.grid.as_ref()?;

        let fetched = self
            .retry
            .run("steamgriddb grid fetch", || async {
                let grids = match req.steam_app_id {
                    Some(app_id) => grid.grids_for_steam_app(app_id).await?,
                    None => {
                        let results = grid.search(req.display_name).await?;
                        let Some(first) = results.first() else {
                            return Ok(None);
                        };
                        grid.grids_for_game(first.id).await?
                    }
                };
                let Some(image) = grids.first() else {
                    return Ok(None);
                };
                let bytes = grid.download_image(&image.url).await?;
                Ok::<_, ArtworkError>(Some(bytes))
            })
            .await;

        let bytes = match fetched {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(name = req.display_name, "no grid match on steamgriddb");
                return None;
            }
            Err(e) => {
                warn!(name = req.display_name, error = %e, "steamgriddb tier failed");
                return None;
            }
        };

        validate_as_png(&bytes)
            .map_err(|e| warn!(name = req.display_name, error = %e, "discarding corrupt grid payload"))
            .ok()
    }

    /// Tier 2: Steam CDN cover, app id required.
    async fn tier_cdn(&self, req: &ArtworkRequest<'_>) -> Option<Vec<u8>> {
        let app_id = req.steam_app_id?;

        let fetched = self
            .retry
            .run("steam cdn cover fetch", || self.cdn.fetch_cover(app_id))
            .await;

        let bytes = match fetched {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(app_id, "no cover on steam cdn");
                return None;
            }
            Err(e) => {
                warn!(app_id, error = %e, "steam cdn tier failed");
                return None;
            }
        };

        validate_as_png(&bytes)
            .map_err(|e| warn!(app_id, error = %e, "discarding corrupt cdn payload"))
            .ok()
    }

    /// Writes validated PNG bytes as `<stem>.png` in the artwork dir.
    fn persist(&self, stem: &str, png: &[u8]) -> Option<PathBuf> {
        let write = || -> Result<PathBuf, ArtworkError> {
            std::fs::create_dir_all(&self.artwork_dir)?;
            let path = self.artwork_dir.join(format!("{stem}.png"));
            std::fs::write(&path, png)?;
            Ok(path)
        };
        match write() {
            Ok(path) => {
                debug!(path = %path.display(), "saved artwork");
                Some(path)
            }
            Err(e) => {
                warn!(stem, error = %e, "failed to persist artwork");
                None
            }
        }
    }
}

/// Decodes the payload and re-encodes it as PNG.
///
/// The decode doubles as corruption detection; the re-encode gives every
/// saved cover a uniform format regardless of what the provider served.
fn validate_as_png(bytes: &[u8]) -> Result<Vec<u8>, ArtworkError> {
    let img = image::load_from_memory(bytes).map_err(|_| ArtworkError::InvalidImage)?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|_| ArtworkError::InvalidImage)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn tiny_png() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(1, 1));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    /// Mock server answering by path substring; unmatched paths get 404.
    async fn mock_routes(
        routes: Vec<(String, String, Vec<u8>)>,
    ) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let req = String::from_utf8_lossy(&buf[..n]).into_owned();

                    let resp = routes
                        .iter()
                        .find(|(path, _, _)| req.contains(path.as_str()))
                        .map(|(_, content_type, body)| {
                            let mut head = format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                                body.len()
                            )
                            .into_bytes();
                            head.extend_from_slice(body);
                            head
                        })
                        .unwrap_or_else(|| {
                            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()
                        });
                    let _ = stream.write_all(&resp).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (url, handle)
    }

    #[tokio::test]
    async fn no_key_and_no_app_id_resolves_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = ArtworkResolver::from_clients(
            None,
            CdnClient::new().unwrap().with_base_url("http://127.0.0.1:9".into()),
            tmp.path().to_path_buf(),
            fast_retry(),
        );

        let req = ArtworkRequest {
            file_stem: "abc",
            display_name: "Custom Tool",
            steam_app_id: None,
        };
        assert!(resolver.resolve(&req).await.is_none());
        assert!(std::fs::read_dir(tmp.path()).map(|d| d.count() == 0).unwrap_or(true));
    }

    #[tokio::test]
    async fn griddb_by_steam_app_id() {
        let png = tiny_png();
        let (img_url, img_handle) =
            mock_routes(vec![("/img.png".into(), "image/png".into(), png)]).await;
        let (api_url, api_handle) = mock_routes(vec![(
            "/grids/steam/440".into(),
            "application/json".into(),
            format!(r#"{{"success":true,"data":[{{"id":1,"url":"{img_url}/img.png"}}]}}"#)
                .into_bytes(),
        )])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let resolver = ArtworkResolver::from_clients(
            Some(Client::new("key").unwrap().with_base_url(api_url)),
            CdnClient::new().unwrap().with_base_url("http://127.0.0.1:9".into()),
            tmp.path().to_path_buf(),
            fast_retry(),
        );

        let req = ArtworkRequest {
            file_stem: "440",
            display_name: "Team Fortress 2",
            steam_app_id: Some(440),
        };
        let path = resolver.resolve(&req).await.unwrap();
        assert!(path.ends_with("440.png"));
        assert!(image::load_from_memory(&std::fs::read(&path).unwrap()).is_ok());

        img_handle.abort();
        api_handle.abort();
    }

    #[tokio::test]
    async fn griddb_via_name_search_for_non_steam() {
        let png = tiny_png();
        let (img_url, img_handle) =
            mock_routes(vec![("/img.png".into(), "image/png".into(), png)]).await;
        let (api_url, api_handle) = mock_routes(vec![
            (
                "/search/autocomplete/".into(),
                "application/json".into(),
                br#"{"success":true,"data":[{"id":77,"name":"Night Drive"}]}"#.to_vec(),
            ),
            (
                "/grids/game/77".into(),
                "application/json".into(),
                format!(r#"{{"success":true,"data":[{{"id":9,"url":"{img_url}/img.png"}}]}}"#)
                    .into_bytes(),
            ),
        ])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let resolver = ArtworkResolver::from_clients(
            Some(Client::new("key").unwrap().with_base_url(api_url)),
            CdnClient::new().unwrap().with_base_url("http://127.0.0.1:9".into()),
            tmp.path().to_path_buf(),
            fast_retry(),
        );

        let req = ArtworkRequest {
            file_stem: "deadbeef",
            display_name: "Night Drive",
            steam_app_id: None,
        };
        let path = resolver.resolve(&req).await.unwrap();
        assert!(path.ends_with("deadbeef.png"));

        img_handle.abort();
        api_handle.abort();
    }

    #[tokio::test]
    async fn corrupt_griddb_payload_falls_back_to_cdn() {
        let (api_url, api_handle) = mock_routes(vec![
            (
                "/grids/steam/100".into(),
                "application/json".into(),
                br#"{"success":true,"data":[{"id":1,"url":"SELF/junk.bin"}]}"#.to_vec(),
            ),
            ("/junk.bin".into(), "image/png".into(), b"not an image".to_vec()),
        ])
        .await;
        // Rewire the grid url to the api server itself.
        let (api_url2, api_handle2) = mock_routes(vec![
            (
                "/grids/steam/100".into(),
                "application/json".into(),
                format!(r#"{{"success":true,"data":[{{"id":1,"url":"{api_url}/junk.bin"}}]}}"#)
                    .into_bytes(),
            ),
        ])
        .await;

        let png = tiny_png();
        let (cdn_url, cdn_handle) = mock_routes(vec![(
            "/100/library_600x900_2x.jpg".into(),
            "image/jpeg".into(),
            png,
        )])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let resolver = ArtworkResolver::from_clients(
            Some(Client::new("key").unwrap().with_base_url(api_url2)),
            CdnClient::new().unwrap().with_base_url(cdn_url),
            tmp.path().to_path_buf(),
            fast_retry(),
        );

        let req = ArtworkRequest {
            file_stem: "100",
            display_name: "Some Game",
            steam_app_id: Some(100),
        };
        let path = resolver.resolve(&req).await.unwrap();
        assert!(path.ends_with("100.png"));

        api_handle.abort();
        api_handle2.abort();
        cdn_handle.abort();
    }

    #[tokio::test]
    async fn no_key_uses_cdn_for_steam_titles() {
        let png = tiny_png();
        let (cdn_url, cdn_handle) =
            mock_routes(vec![("/220/header.jpg".into(), "image/jpeg".into(), png)]).await;

        let tmp = tempfile::tempdir().unwrap();
        let resolver = ArtworkResolver::from_clients(
            None,
            CdnClient::new().unwrap().with_base_url(cdn_url),
            tmp.path().to_path_buf(),
            fast_retry(),
        );

        let req = ArtworkRequest {
            file_stem: "220",
            display_name: "Half-Life 2",
            steam_app_id: Some(220),
        };
        let path = resolver.resolve(&req).await.unwrap();
        assert!(path.ends_with("220.png"));

        cdn_handle.abort();
    }

    #[test]
    fn validate_rejects_junk() {
        assert!(validate_as_png(b"definitely not an image").is_err());
    }

    #[test]
    fn validate_accepts_and_reencodes_png() {
        let png = tiny_png();
        let out = validate_as_png(&png).unwrap();
        assert!(image::load_from_memory(&out).is_ok());
    }
}
