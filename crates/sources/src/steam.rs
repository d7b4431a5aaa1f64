//! Steam adapter: library folder enumeration plus store name resolution.
//!
//! `libraryfolders.vdf` is Valve's text KeyValues format; every app id
//! under every library folder is collected, then names are resolved
//! through the store with a bounded worker pool.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use crate::appdetails::{AppDetailsClient, NameCache, lookup_name};
use crate::types::{InstalledTitle, Source};
use crate::SourceError;

/// Concurrent name lookups. The store API is rate-limited; keep this low.
pub const NAME_LOOKUP_WORKERS: usize = 10;

/// One library folder block from `libraryfolders.vdf`.
///
/// Only the `apps` map matters here; `path`, `label` and the rest are
/// ignored. Values in `apps` are install sizes, keys are app ids.
#[derive(Debug, Deserialize)]
struct LibraryFolder {
    #[serde(default)]
    apps: BTreeMap<String, String>,
}

/// Extracts all installed app ids from library folder VDF text.
///
/// Ids are deduplicated across folders and returned in ascending numeric
/// order, which fixes the discovery insertion order for new entries.
pub fn parse_library_app_ids(vdf_text: &str) -> Result<Vec<String>, SourceError> {
    let folders: BTreeMap<String, LibraryFolder> = keyvalues_serde::from_str(vdf_text)
        .map_err(|e| SourceError::Vdf(format!("malformed library folders file: {e}")))?;

    let mut seen = HashSet::new();
    let mut ids: Vec<String> = folders
        .values()
        .flat_map(|folder| folder.apps.keys().cloned())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    ids.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX));
    Ok(ids)
}

/// Discovers installed Steam titles.
///
/// Ids whose name lookup ultimately fails are silently excluded; a
/// missing name means the title cannot be presented, not that the run
/// failed. A missing VDF file yields an empty collection.
pub async fn discover(
    vdf_path: &Path,
    client: &AppDetailsClient,
    cache: &NameCache,
) -> Result<Vec<InstalledTitle>, SourceError> {
    if !vdf_path.exists() {
        debug!(path = %vdf_path.display(), "steam library file not present, skipping source");
        return Ok(Vec::new());
    }

    let text = std::fs::read_to_string(vdf_path)?;
    let ids = parse_library_app_ids(&text)?;
    info!(count = ids.len(), "resolving steam app names");

    let mut resolved: Vec<(String, Option<String>)> =
        futures_util::stream::iter(ids.iter().cloned())
            .map(|id| async move {
                let name = lookup_name(client, cache, &id).await;
                (id, name)
            })
            .buffer_unordered(NAME_LOOKUP_WORKERS)
            .collect()
            .await;

    // buffer_unordered scrambles completion order; restore id order.
    let order: BTreeMap<&String, usize> =
        ids.iter().zip(0..).map(|(id, i)| (id, i)).collect();
    resolved.sort_by_key(|(id, _)| order.get(id).copied().unwrap_or(usize::MAX));

    let titles = resolved
        .into_iter()
        .filter_map(|(id, name)| {
            let name = name?;
            Some(InstalledTitle {
                source: Source::Steam,
                identity: id,
                display_name: name,
                exe_path: None,
                image_hint: None,
            })
        })
        .collect();

    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesphere_common::RetryPolicy;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE_VDF: &str = r#"
"libraryfolders"
{
    "0"
    {
        "path"        "C:\\Program Files (x86)\\Steam"
        "label"       ""
        "contentid"   "1234567890"
        "apps"
        {
            "440"     "20123456789"
            "100"     "998877"
        }
    }
    "1"
    {
        "path"        "D:\\SteamLibrary"
        "apps"
        {
            "220"     "7766554433"
            "440"     "20123456789"
        }
    }
}
"#;

    #[test]
    fn parse_ids_dedup_and_order() {
        let ids = parse_library_app_ids(SAMPLE_VDF).unwrap();
        assert_eq!(ids, vec!["100", "220", "440"]);
    }

    #[test]
    fn parse_ids_folder_without_apps() {
        let vdf = r#"
"libraryfolders"
{
    "0"
    {
        "path"    "/home/user/.steam"
    }
}
"#;
        let ids = parse_library_app_ids(vdf).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn parse_ids_rejects_garbage() {
        assert!(parse_library_app_ids("not a vdf file").is_err());
    }

    /// Mock appdetails server answering every request from a canned
    /// id → name table.
    async fn mock_store(names: Vec<(&str, &str)>) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let names: Vec<(String, String)> = names
            .into_iter()
            .map(|(id, n)| (id.to_string(), n.to_string()))
            .collect();

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let names = names.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let req = String::from_utf8_lossy(&buf[..n]).into_owned();

                    let body = names
                        .iter()
                        .find(|(id, _)| req.contains(&format!("appids={id}")))
                        .map(|(id, name)| {
                            format!(
                                r#"{{"{id}":{{"success":true,"data":{{"name":"{name}"}}}}}}"#
                            )
                        })
                        .unwrap_or_else(|| r#"{"0":{"success":false}}"#.to_string());

                    let resp = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(resp.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (url, handle)
    }

    fn fast_client(url: String) -> AppDetailsClient {
        AppDetailsClient::with_retry(RetryPolicy::new(2, Duration::from_millis(1)))
            .unwrap()
            .with_base_url(url)
    }

    #[tokio::test]
    async fn discover_missing_file_is_empty() {
        let client = fast_client("http://127.0.0.1:9".into());
        let cache = NameCache::new();
        let titles = discover(Path::new("/nonexistent/libraryfolders.vdf"), &client, &cache)
            .await
            .unwrap();
        assert!(titles.is_empty());
    }

    #[tokio::test]
    async fn discover_resolves_names_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let vdf = dir.path().join("libraryfolders.vdf");
        std::fs::write(&vdf, SAMPLE_VDF).unwrap();

        let (url, handle) = mock_store(vec![
            ("100", "Counter-Strike Neo"),
            ("220", "Half-Life 2"),
            ("440", "Team Fortress 2"),
        ])
        .await;

        let client = fast_client(url);
        let cache = NameCache::new();
        let titles = discover(&vdf, &client, &cache).await.unwrap();

        let got: Vec<(&str, &str)> = titles
            .iter()
            .map(|t| (t.identity.as_str(), t.display_name.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("100", "Counter-Strike Neo"),
                ("220", "Half-Life 2"),
                ("440", "Team Fortress 2"),
            ]
        );
        assert!(titles.iter().all(|t| t.source == Source::Steam));

        handle.abort();
    }

    #[tokio::test]
    async fn discover_drops_unresolvable_ids() {
        let dir = tempfile::tempdir().unwrap();
        let vdf = dir.path().join("libraryfolders.vdf");
        std::fs::write(&vdf, SAMPLE_VDF).unwrap();

        // 220 is unknown to the store; it must be excluded, not fatal.
        let (url, handle) = mock_store(vec![
            ("100", "Counter-Strike Neo"),
            ("440", "Team Fortress 2"),
        ])
        .await;

        let client = fast_client(url);
        let cache = NameCache::new();
        let titles = discover(&vdf, &client, &cache).await.unwrap();

        let ids: Vec<&str> = titles.iter().map(|t| t.identity.as_str()).collect();
        assert_eq!(ids, vec!["100", "440"]);

        handle.abort();
    }
}
