//! Visibility-driven media loading.
//!
//! Two deferred-loading state machines, one per media kind, both with the
//! same shape: `Unloaded → Loading → Ready`, where `Ready` is terminal for
//! success and failure alike. A broken asset never blocks the rest of the
//! board, and an element transitions at most once.

use std::collections::HashSet;

use iced::widget::image::Handle;

use crate::media::descriptor::{MediaDescriptor, MediaType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPriority {
    High,
    Low,
}

/// How much of a video to pull before it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadHint {
    Auto,
    Metadata,
}

/// A fetch the caller must schedule. Produced exactly once per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub priority: LoadPriority,
}

#[derive(Debug, Clone)]
pub struct ImageElement {
    pub source_url: String,
    pub state: LoadState,
    pub priority: LoadPriority,
    pub handle: Option<Handle>,
    pub dimensions: Option<(u32, u32)>,
}

impl ImageElement {
    pub fn new(source_url: String, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            source_url,
            state: LoadState::Unloaded,
            priority: LoadPriority::Low,
            handle: None,
            dimensions,
        }
    }

    /// `Unloaded → Loading`. Returns the fetch request the first time only.
    pub fn begin_load(&mut self, priority: LoadPriority) -> Option<FetchRequest> {
        if self.state != LoadState::Unloaded {
            return None;
        }
        self.priority = priority;
        self.state = LoadState::Loading;
        Some(FetchRequest {
            url: self.source_url.clone(),
            priority,
        })
    }

    /// Terminal transition. An error still yields `Ready` so the card is
    /// never stuck waiting for a retry that will not come.
    pub fn finish_load(&mut self, result: Result<(Handle, (u32, u32)), String>) {
        if self.state == LoadState::Ready {
            return;
        }
        self.state = LoadState::Ready;
        match result {
            Ok((handle, dimensions)) => {
                self.handle = Some(handle);
                self.dimensions = Some(dimensions);
            }
            Err(error) => {
                log::debug!("image load failed for {}: {error}", self.source_url);
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }
}

#[derive(Debug, Clone)]
pub struct VideoElement {
    /// The assigned playback source.
    pub source_url: String,
    /// Thumbnail fetched as the card's visual.
    pub poster_url: String,
    pub state: LoadState,
    pub priority: LoadPriority,
    pub preload: PreloadHint,
    pub muted: bool,
    pub looping: bool,
    pub autoplay: bool,
    pub inline: bool,
    pub poster: Option<Handle>,
    pub dimensions: Option<(u32, u32)>,
    pub playing: bool,
}

impl VideoElement {
    pub fn new(source_url: String, poster_url: String, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            source_url,
            poster_url,
            state: LoadState::Unloaded,
            priority: LoadPriority::Low,
            preload: PreloadHint::Metadata,
            muted: true,
            looping: true,
            autoplay: true,
            inline: true,
            poster: None,
            dimensions,
            playing: false,
        }
    }

    /// `Unloaded → Loading`. Playback attributes are (re-)forced here:
    /// autoplay must never carry audio.
    pub fn begin_load(&mut self, priority: LoadPriority) -> Option<FetchRequest> {
        if self.state != LoadState::Unloaded {
            return None;
        }
        self.priority = priority;
        self.preload = match priority {
            LoadPriority::High => PreloadHint::Auto,
            LoadPriority::Low => PreloadHint::Metadata,
        };
        self.muted = true;
        self.looping = true;
        self.autoplay = true;
        self.inline = true;
        self.state = LoadState::Loading;
        Some(FetchRequest {
            url: self.poster_url.clone(),
            priority,
        })
    }

    /// Terminal transition; playback starts immediately. A poster that
    /// failed to decode leaves the placeholder visible, nothing more.
    pub fn finish_load(&mut self, result: Result<(Handle, (u32, u32)), String>) {
        if self.state == LoadState::Ready {
            return;
        }
        self.state = LoadState::Ready;
        match result {
            Ok((handle, dimensions)) => {
                self.poster = Some(handle);
                self.dimensions = Some(dimensions);
            }
            Err(error) => {
                log::debug!("video poster failed for {}: {error}", self.poster_url);
            }
        }
        self.playing = true;
    }

    /// Resume playback. Only meaningful once loaded; a rejected start is
    /// silently ignored, so this never reports failure.
    pub fn play(&mut self) {
        if self.state == LoadState::Ready {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }
}

/// The single media element a rendered card owns.
#[derive(Debug, Clone)]
pub enum MediaElement {
    Image(ImageElement),
    Video(VideoElement),
}

impl MediaElement {
    pub fn for_descriptor(descriptor: &MediaDescriptor) -> Self {
        let dimensions = descriptor.width.zip(descriptor.height);
        match descriptor.media_type {
            MediaType::Video => MediaElement::Video(VideoElement::new(
                descriptor.full_url(),
                descriptor.thumbnail_url(),
                dimensions,
            )),
            MediaType::Image => {
                MediaElement::Image(ImageElement::new(descriptor.thumbnail_url(), dimensions))
            }
        }
    }

    pub fn state(&self) -> LoadState {
        match self {
            MediaElement::Image(image) => image.state,
            MediaElement::Video(video) => video.state,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaElement::Video(_))
    }

    pub fn begin_load(&mut self, priority: LoadPriority) -> Option<FetchRequest> {
        match self {
            MediaElement::Image(image) => image.begin_load(priority),
            MediaElement::Video(video) => video.begin_load(priority),
        }
    }

    pub fn finish_load(&mut self, result: Result<(Handle, (u32, u32)), String>) {
        match self {
            MediaElement::Image(image) => image.finish_load(result),
            MediaElement::Video(video) => video.finish_load(result),
        }
    }

    /// Whatever the card already shows, for use as a lightbox preview.
    pub fn preview_handle(&self) -> Option<Handle> {
        match self {
            MediaElement::Image(image) => image.handle.clone(),
            MediaElement::Video(video) => video.poster.clone(),
        }
    }
}

/// Explicit registration set standing in for an intersection observer.
///
/// The board feeds it visibility ratios computed from scroll geometry;
/// tests feed it ratios directly. Taking an intersection unregisters the
/// name, giving the load pipeline its one-shot semantics.
#[derive(Debug)]
pub struct VisibilityObserver {
    pub margin: f32,
    pub ratio_threshold: f32,
    observed: HashSet<String>,
}

impl VisibilityObserver {
    pub fn new(margin: f32, ratio_threshold: f32) -> Self {
        Self {
            margin,
            ratio_threshold,
            observed: HashSet::new(),
        }
    }

    pub fn observe(&mut self, name: &str) {
        self.observed.insert(name.to_string());
    }

    pub fn unobserve(&mut self, name: &str) {
        self.observed.remove(name);
    }

    pub fn is_observing(&self, name: &str) -> bool {
        self.observed.contains(name)
    }

    /// Snapshot of registered names, so callers can mutate while walking.
    pub fn observed_names(&self) -> Vec<String> {
        self.observed.iter().cloned().collect()
    }

    /// One-shot: true exactly once per name, when its ratio first crosses
    /// the threshold. The name is unregistered as a side effect.
    pub fn take_intersection(&mut self, name: &str, ratio: f32) -> bool {
        if ratio < self.ratio_threshold || !self.observed.contains(name) {
            return false;
        }
        self.observed.remove(name);
        true
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Handle {
        Handle::from_rgba(1, 1, vec![0, 0, 0, 255])
    }

    #[test]
    fn test_image_load_is_one_shot() {
        let mut element = ImageElement::new("./media/a.jpg?v=1".to_string(), None);

        let request = element.begin_load(LoadPriority::High).unwrap();
        assert_eq!(request.url, "./media/a.jpg?v=1");
        assert_eq!(request.priority, LoadPriority::High);
        assert_eq!(element.state, LoadState::Loading);

        // Repeat invocations are no-ops.
        assert!(element.begin_load(LoadPriority::Low).is_none());

        element.finish_load(Ok((handle(), (4, 3))));
        assert!(element.is_ready());
        assert_eq!(element.dimensions, Some((4, 3)));
        assert!(element.begin_load(LoadPriority::High).is_none());
    }

    #[test]
    fn test_image_error_is_terminal_ready() {
        let mut element = ImageElement::new("./media/broken.jpg?v=0".to_string(), None);
        element.begin_load(LoadPriority::Low);
        element.finish_load(Err("boom".to_string()));

        assert!(element.is_ready());
        assert!(element.handle.is_none());

        // A late success cannot resurrect the element.
        element.finish_load(Ok((handle(), (1, 1))));
        assert!(element.handle.is_none());
    }

    #[test]
    fn test_video_load_forces_silent_autoplay() {
        let mut element = VideoElement::new(
            "./media/clip.mp4?v=1".to_string(),
            "./media/clip.jpg?v=1".to_string(),
            None,
        );
        element.muted = false;
        element.autoplay = false;

        let request = element.begin_load(LoadPriority::High).unwrap();
        assert_eq!(request.url, "./media/clip.jpg?v=1");
        assert!(element.muted);
        assert!(element.autoplay);
        assert!(element.looping);
        assert!(element.inline);
        assert_eq!(element.preload, PreloadHint::Auto);

        element.finish_load(Err("decode".to_string()));
        assert!(element.is_ready());
        assert!(element.playing, "ready videos start playback");
    }

    #[test]
    fn test_video_preload_follows_priority() {
        let mut element = VideoElement::new("v.mp4".to_string(), "v.jpg".to_string(), None);
        element.begin_load(LoadPriority::Low);
        assert_eq!(element.preload, PreloadHint::Metadata);
    }

    #[test]
    fn test_video_play_requires_ready() {
        let mut element = VideoElement::new("v.mp4".to_string(), "v.jpg".to_string(), None);
        element.play();
        assert!(!element.playing);

        element.begin_load(LoadPriority::Low);
        element.finish_load(Ok((handle(), (16, 9))));
        element.pause();
        element.play();
        assert!(element.playing);
    }

    #[test]
    fn test_observer_take_is_one_shot() {
        let mut observer = VisibilityObserver::new(640.0, 0.01);
        observer.observe("a");

        assert!(!observer.take_intersection("a", 0.0));
        assert!(observer.is_observing("a"));

        assert!(observer.take_intersection("a", 0.5));
        assert!(!observer.is_observing("a"));

        // Already taken: never fires again.
        assert!(!observer.take_intersection("a", 1.0));
        assert!(!observer.take_intersection("unknown", 1.0));
    }
}
