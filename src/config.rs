/// Runtime configuration for the board
///
/// Everything is environment-driven so the same binary can point at a
/// different media server, manifest file, or refresh cadence without
/// rebuilding.
use std::path::PathBuf;
use std::time::Duration;

/// Endpoints tried in order until one answers.
const DEFAULT_ENDPOINTS: &str = "http://127.0.0.1:8080/api/images,http://localhost:8080/api/images";

/// Static manifest consulted when every endpoint is unreachable.
const DEFAULT_MANIFEST: &str = "./media-index.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Descriptor endpoints, in the order they are tried.
    pub endpoints: Vec<String>,
    /// Path of the static fallback manifest (JSON array of raw items).
    pub manifest_path: PathBuf,
    /// Seconds between automatic refreshes. 0 disables the timer and the
    /// status pill reports "Manual refresh".
    pub refresh_secs: u64,
    /// Pre-populated meta fields. When set, refreshes never overwrite them.
    pub static_started: Option<String>,
    pub static_modified: Option<String>,
    pub static_length: Option<String>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_environment() -> Self {
        let endpoints = std::env::var("PINBOARD_ENDPOINTS")
            .unwrap_or_else(|_| DEFAULT_ENDPOINTS.to_string());
        let manifest_path = std::env::var("PINBOARD_MANIFEST")
            .unwrap_or_else(|_| DEFAULT_MANIFEST.to_string());
        let refresh_secs = std::env::var("PINBOARD_REFRESH_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0);

        Self {
            endpoints: parse_endpoints(&endpoints),
            manifest_path: PathBuf::from(manifest_path),
            refresh_secs,
            static_started: non_empty_var("PINBOARD_META_STARTED"),
            static_modified: non_empty_var("PINBOARD_META_MODIFIED"),
            static_length: non_empty_var("PINBOARD_META_LENGTH"),
        }
    }

    /// Timer cadence for the sync loop, if one is configured.
    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.refresh_secs))
        }
    }
}

/// Split a comma-separated endpoint list, dropping empty entries.
fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
