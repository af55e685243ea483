/// Media descriptor normalization
///
/// Raw records arrive as loosely-typed JSON, either from the descriptor
/// endpoint or from the static fallback manifest. This module validates
/// them into canonical, immutable descriptors: `name` is the identity key
/// across refreshes, `key` is the change-detection token, and every field
/// the rest of the app relies on is guaranteed present.
use serde::Deserialize;

/// File extensions the board knows how to present.
const ALLOWED_MEDIA_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "webp", "gif", "avif", "mp4", "m4v", "webm", "mov",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

/// One untyped record, exactly as the wire or the manifest carries it.
/// Every field is optional; normalization fills the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMediaItem {
    pub name: Option<String>,
    pub modified_ms: Option<f64>,
    pub size: Option<f64>,
    pub media_type: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub url: Option<String>,
    pub thumb_url: Option<String>,
    pub key: Option<String>,
}

/// Canonical descriptor. Immutable once constructed: content changes are
/// represented as a new descriptor with the same `name` and a new `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    pub name: String,
    pub key: String,
    pub media_type: MediaType,
    pub url: String,
    pub thumb_url: String,
    pub modified_ms: i64,
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaDescriptor {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Human label: extension stripped, underscore/dash runs collapsed.
    pub fn display_label(&self) -> String {
        display_label(&self.name)
    }

    /// Full-resolution source with the cache-busting stamp.
    pub fn full_url(&self) -> String {
        with_modified_query(&self.url, self.modified_ms)
    }

    /// Thumbnail source with the cache-busting stamp.
    pub fn thumbnail_url(&self) -> String {
        with_modified_query(&self.thumb_url, self.modified_ms)
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        match (self.width, self.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(width as f32 / height as f32)
            }
            _ => None,
        }
    }
}

/// Validate and normalize one raw record. Returns None when the record
/// has no usable name or an unsupported extension.
pub fn normalize_item(raw: &RawMediaItem) -> Option<MediaDescriptor> {
    let name = raw.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return None;
    }

    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
    if !ALLOWED_MEDIA_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    let modified_ms = finite(raw.modified_ms)
        .map(|value| value.floor() as i64)
        .unwrap_or(0);
    let media_type = match raw.media_type.as_deref() {
        Some("video") => MediaType::Video,
        _ => MediaType::Image,
    };
    let url = raw
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("./media/{}", urlencoding::encode(name)));
    let thumb_url = raw
        .thumb_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.clone());
    let key = raw
        .key
        .as_deref()
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{name}-{modified_ms}"));

    Some(MediaDescriptor {
        name: name.to_string(),
        key,
        media_type,
        url,
        thumb_url,
        modified_ms,
        size: positive(raw.size).map(|value| value as u64).unwrap_or(0),
        width: positive(raw.width).map(|value| value.round() as u32),
        height: positive(raw.height).map(|value| value.round() as u32),
    })
}

/// Normalize a payload in caller order; invalid records are dropped.
pub fn normalize_items(raw: &[RawMediaItem]) -> Vec<MediaDescriptor> {
    raw.iter().filter_map(normalize_item).collect()
}

/// Normalize the fallback manifest, newest first.
pub fn normalize_fallback(raw: &[RawMediaItem]) -> Vec<MediaDescriptor> {
    let mut descriptors = normalize_items(raw);
    descriptors.sort_by(|a, b| b.modified_ms.cmp(&a.modified_ms));
    descriptors
}

/// Turn a file name into a display label.
pub fn display_label(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    let mut label = String::with_capacity(stem.len());
    let mut previous_was_separator = false;
    for ch in stem.chars() {
        if ch == '_' || ch == '-' {
            if !previous_was_separator {
                label.push(' ');
            }
            previous_was_separator = true;
        } else {
            label.push(ch);
            previous_was_separator = false;
        }
    }
    label.trim().to_string()
}

/// Append the `v=<stamp>` cache-busting parameter.
pub fn with_modified_query(url: &str, modified_ms: i64) -> String {
    if url.trim().is_empty() {
        return String::new();
    }
    let joiner = if url.contains('?') { '&' } else { '?' };
    format!("{url}{joiner}v={modified_ms}")
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

fn positive(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|value| *value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawMediaItem {
        RawMediaItem {
            name: Some(name.to_string()),
            ..RawMediaItem::default()
        }
    }

    #[test]
    fn test_rejects_records_without_a_name() {
        assert!(normalize_item(&RawMediaItem::default()).is_none());
        assert!(normalize_item(&raw("   ")).is_none());
    }

    #[test]
    fn test_rejects_unsupported_extensions() {
        assert!(normalize_item(&raw("notes.txt")).is_none());
        assert!(normalize_item(&raw("no-extension")).is_none());
        assert!(normalize_item(&raw("clip.MP4")).is_some());
    }

    #[test]
    fn test_derives_missing_fields() {
        let mut item = raw("sunset hills.jpg");
        item.modified_ms = Some(1_700_000_123.9);

        let descriptor = normalize_item(&item).unwrap();
        assert_eq!(descriptor.url, "./media/sunset%20hills.jpg");
        assert_eq!(descriptor.thumb_url, descriptor.url);
        assert_eq!(descriptor.modified_ms, 1_700_000_123);
        assert_eq!(descriptor.key, "sunset hills.jpg-1700000123");
        assert_eq!(descriptor.media_type, MediaType::Image);
    }

    #[test]
    fn test_honors_explicit_fields() {
        let item = RawMediaItem {
            name: Some("reel.webm".to_string()),
            media_type: Some("video".to_string()),
            url: Some("https://cdn.example/reel.webm".to_string()),
            thumb_url: Some("https://cdn.example/reel.jpg".to_string()),
            key: Some("abc123".to_string()),
            width: Some(1920.0),
            height: Some(1080.0),
            ..RawMediaItem::default()
        };

        let descriptor = normalize_item(&item).unwrap();
        assert!(descriptor.is_video());
        assert_eq!(descriptor.key, "abc123");
        assert_eq!(descriptor.width, Some(1920));
        assert_eq!(descriptor.aspect_ratio(), Some(1920.0 / 1080.0));
    }

    #[test]
    fn test_fallback_sorts_newest_first() {
        let mut older = raw("older.png");
        older.modified_ms = Some(1_000.0);
        let mut newer = raw("newer.png");
        newer.modified_ms = Some(2_000.0);

        let descriptors = normalize_fallback(&[older, newer]);
        assert_eq!(descriptors[0].name, "newer.png");
        assert_eq!(descriptors[1].name, "older.png");
    }

    #[test]
    fn test_display_label_cleanup() {
        assert_eq!(display_label("winter__morning-walk.jpg"), "winter morning walk");
        assert_eq!(display_label("plain.png"), "plain");
        assert_eq!(display_label("_edges_.gif"), "edges");
    }

    #[test]
    fn test_cache_busting_joiner() {
        assert_eq!(with_modified_query("./a.jpg", 5), "./a.jpg?v=5");
        assert_eq!(with_modified_query("./a.jpg?w=2", 5), "./a.jpg?w=2&v=5");
        assert_eq!(with_modified_query("   ", 5), "");
    }
}
