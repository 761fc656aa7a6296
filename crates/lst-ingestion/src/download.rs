//! Tile download and lookup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::extract::ExtractionFailure;
use crate::records::{DownloadLink, GranuleRecord};

/// Pick the data link of a granule.
///
/// The first `https://` href containing `host_marker` and ending in `.hdf`.
pub fn select_download_url<'a>(links: &'a [DownloadLink], host_marker: &str) -> Option<&'a str> {
    links
        .iter()
        .map(|link| link.href.as_str())
        .find(|href| href.starts_with("https://") && href.contains(host_marker) && href.ends_with(".hdf"))
}

/// File name a granule's tile is stored under.
pub fn tile_file_name(granule: &GranuleRecord) -> String {
    format!("{}.hdf", granule.granule_id)
}

/// `<root>/<region_id>`, or `TileUnavailable` when either id could escape
/// `root` as a path component.
pub fn tile_dir(root: &Path, granule: &GranuleRecord) -> std::result::Result<PathBuf, ExtractionFailure> {
    for id in [&granule.region_id, &granule.granule_id] {
        if !is_safe_component(id) {
            return Err(ExtractionFailure::TileUnavailable(format!(
                "id '{}' is not usable as a file name",
                id
            )));
        }
    }
    Ok(root.join(&granule.region_id))
}

// Same rule as partition keys.
fn is_safe_component(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\', '\0']) && !id.starts_with('.')
}

/// Makes a granule's tile available on the local filesystem.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, granule: &GranuleRecord) -> std::result::Result<PathBuf, ExtractionFailure>;
}

// ============================================================================
// HTTP
// ============================================================================

/// Downloads tiles into `<download_dir>/<region_id>/<granule_id>.hdf`.
pub struct HttpTileFetcher {
    client: Client,
    download_dir: PathBuf,
    auth_token: Option<String>,
    host_marker: String,
}

impl HttpTileFetcher {
    pub fn new(
        download_dir: impl Into<PathBuf>,
        auth_token: Option<String>,
        host_marker: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IngestionError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
            auth_token,
            host_marker: host_marker.into(),
        })
    }

    async fn download(&self, url: &str, final_path: &Path) -> std::result::Result<(), String> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
        }
        let temp_path = final_path.with_extension("hdf.partial");

        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let bytes = stream_to_file(response.bytes_stream(), &temp_path).await?;

        fs::rename(&temp_path, final_path)
            .await
            .map_err(|e| e.to_string())?;

        info!(path = %final_path.display(), bytes, "Download completed");
        Ok(())
    }
}

/// Write a byte stream to `path`, removing the partial file on error.
async fn stream_to_file<S, B, E>(stream: S, path: &Path) -> std::result::Result<u64, String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let result = write_stream(stream, path).await;
    if result.is_err() {
        fs::remove_file(path).await.ok();
    }
    result
}

async fn write_stream<S, B, E>(stream: S, path: &Path) -> std::result::Result<u64, String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;

    futures::pin_mut!(stream);
    let mut bytes = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| format!("error reading response: {}", e))?;
        let chunk = chunk.as_ref();
        file.write_all(chunk).await.map_err(|e| e.to_string())?;
        bytes += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| e.to_string())?;
    Ok(bytes)
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, granule), fields(granule = %granule.granule_id))]
    async fn fetch(&self, granule: &GranuleRecord) -> std::result::Result<PathBuf, ExtractionFailure> {
        let url = select_download_url(&granule.links, &self.host_marker)
            .ok_or(ExtractionFailure::NoDownloadUrl)?;

        let final_path = tile_dir(&self.download_dir, granule)?.join(tile_file_name(granule));

        if final_path.exists() {
            debug!(path = %final_path.display(), "Tile already downloaded");
            return Ok(final_path);
        }

        self.download(url, &final_path).await.map_err(|e| {
            warn!(url, error = %e, "Download failed");
            ExtractionFailure::DownloadFailed(e)
        })?;
        Ok(final_path)
    }
}

// ============================================================================
// Local directory
// ============================================================================

/// Resolves tiles already present under `<root>/<region_id>/`.
///
/// Accepts `<granule_id>.hdf`, `<granule_id>.tif` or a `<granule_id>/`
/// directory of GeoTIFF exports.
#[derive(Debug, Clone)]
pub struct LocalTileDirectory {
    root: PathBuf,
}

impl LocalTileDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TileFetcher for LocalTileDirectory {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, granule: &GranuleRecord) -> std::result::Result<PathBuf, ExtractionFailure> {
        let dir = tile_dir(&self.root, granule)?;
        let candidates = [
            dir.join(tile_file_name(granule)),
            dir.join(format!("{}.tif", granule.granule_id)),
            dir.join(&granule.granule_id),
        ];
        candidates
            .into_iter()
            .find(|path| path.exists())
            .ok_or_else(|| {
                ExtractionFailure::TileUnavailable(format!(
                    "no local tile for {} under {}",
                    granule.granule_id,
                    dir.display()
                ))
            })
    }
}
