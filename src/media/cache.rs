/// URL-keyed cache of decoded media handles
///
/// Shared by the card pipeline, the lightbox, and neighbor prefetch: a URL
/// that is already `Loading` or `Loaded` is never fetched again for
/// warming purposes, which bounds prefetch to one request per URL.
use std::collections::HashMap;

use iced::widget::image::Handle;

#[derive(Debug, Clone)]
pub enum CachedImage {
    Loading,
    Loaded(Handle),
    Failed,
}

#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, CachedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&CachedImage> {
        self.entries.get(url)
    }

    /// Decoded handle for a URL, if its fetch already succeeded.
    pub fn handle(&self, url: &str) -> Option<Handle> {
        match self.entries.get(url) {
            Some(CachedImage::Loaded(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn set_loading(&mut self, url: String) {
        self.entries.insert(url, CachedImage::Loading);
    }

    pub fn set_loaded(&mut self, url: String, handle: Handle) {
        self.entries.insert(url, CachedImage::Loaded(handle));
    }

    pub fn set_failed(&mut self, url: String) {
        self.entries.insert(url, CachedImage::Failed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Handle {
        Handle::from_rgba(1, 1, vec![0, 0, 0, 255])
    }

    #[test]
    fn test_handle_only_for_loaded_entries() {
        let mut cache = ImageCache::new();
        assert!(cache.handle("a").is_none());

        cache.set_loading("a".to_string());
        assert!(cache.handle("a").is_none());
        assert!(matches!(cache.get("a"), Some(CachedImage::Loading)));

        cache.set_loaded("a".to_string(), handle());
        assert!(cache.handle("a").is_some());

        cache.set_failed("a".to_string());
        assert!(cache.handle("a").is_none());
        assert_eq!(cache.len(), 1);
    }
}
