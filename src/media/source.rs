/// Descriptor and media acquisition
///
/// The descriptor list comes from an HTTP endpoint returning
/// `{ "images": [...] }`. When every endpoint fails, a static manifest
/// stands in; when both are unavailable the most specific collected error
/// is surfaced. Individual media fetches share one helper and report
/// errors as plain strings so task messages stay cheap to clone.
use std::path::PathBuf;

use iced::widget::image::Handle;
use serde::Deserialize;
use thiserror::Error;

use super::descriptor::{self, MediaDescriptor, RawMediaItem};

#[derive(Debug, Error)]
pub enum SourceError {
    /// Every endpoint failed and no usable fallback manifest exists.
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaPayload {
    images: Vec<RawMediaItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
}

/// A resolved refresh: the normalized list plus where it came from.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub descriptors: Vec<MediaDescriptor>,
    pub fallback: bool,
}

/// One fetched and decoded media asset.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub url: String,
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// Resolve the descriptor list: endpoints in order, then the manifest.
pub async fn fetch_descriptors(
    endpoints: Vec<String>,
    fallback_manifest: Vec<RawMediaItem>,
) -> Result<FetchOutcome, SourceError> {
    let mut errors = Vec::new();

    for endpoint in &endpoints {
        match fetch_endpoint(endpoint).await {
            Ok(items) => {
                return Ok(FetchOutcome {
                    descriptors: descriptor::normalize_items(&items),
                    fallback: false,
                });
            }
            Err(message) => {
                log::warn!("descriptor endpoint failed: {endpoint}: {message}");
                errors.push(format!("{endpoint}: {message}"));
            }
        }
    }

    let fallback = descriptor::normalize_fallback(&fallback_manifest);
    if !fallback.is_empty() {
        return Ok(FetchOutcome {
            descriptors: fallback,
            fallback: true,
        });
    }

    Err(SourceError::Unavailable(
        errors
            .into_iter()
            .next()
            .unwrap_or_else(|| "Could not read media library".to_string()),
    ))
}

async fn fetch_endpoint(endpoint: &str) -> Result<Vec<RawMediaItem>, String> {
    let response = reqwest::get(endpoint).await.map_err(|error| error.to_string())?;
    let status = response.status();

    if !status.is_success() {
        // Prefer the body's own message over the bare status line.
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        return Err(message);
    }

    let payload = response
        .json::<MediaPayload>()
        .await
        .map_err(|error| error.to_string())?;
    Ok(payload.images)
}

/// Fetch one media asset and decode it into a renderable handle.
pub async fn fetch_media(url: String) -> Result<FetchedMedia, String> {
    let bytes = fetch_bytes(&url).await?;
    decode_media(url, bytes)
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    log::debug!("Fetching media from URL: {url}");

    let response = reqwest::get(url).await.map_err(|error| error.to_string())?;
    if !response.status().is_success() {
        log::warn!("Failed to fetch media: {url} - {}", response.status());
        return Err(format!(
            "Request failed with status {}",
            response.status().as_u16()
        ));
    }

    let bytes = response.bytes().await.map_err(|error| error.to_string())?;
    Ok(bytes.to_vec())
}

fn decode_media(url: String, bytes: Vec<u8>) -> Result<FetchedMedia, String> {
    let decoded = image::load_from_memory(&bytes)
        .map_err(|error| format!("Failed to decode {url}: {error}"))?;
    let (width, height) = (decoded.width(), decoded.height());

    Ok(FetchedMedia {
        url,
        handle: Handle::from_bytes(bytes),
        width,
        height,
    })
}

/// Read the static manifest from disk. Missing or malformed files are an
/// empty fallback, not an error.
pub async fn load_manifest(path: PathBuf) -> Vec<RawMediaItem> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<RawMediaItem>>(&bytes) {
            Ok(items) => {
                log::info!("Loaded {} manifest entries from {}", items.len(), path.display());
                items
            }
            Err(error) => {
                log::warn!("Manifest {} is not valid JSON: {error}", path.display());
                Vec::new()
            }
        },
        Err(error) => {
            log::debug!("No static manifest at {}: {error}", path.display());
            Vec::new()
        }
    }
}
