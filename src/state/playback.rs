//! Play/pause control for video cards.
//!
//! Decoupled from the load pipeline on purpose: load state is one-shot
//! and permanent, while playback must pause on scroll-away even after the
//! resource is cached, and resume when the card comes back.

use std::collections::HashSet;

use super::loader::{FetchRequest, LoadState, VideoElement};

#[derive(Debug)]
pub struct PlaybackController {
    pub margin: f32,
    pub play_ratio: f32,
    observed: HashSet<String>,
}

impl PlaybackController {
    pub fn new(margin: f32, play_ratio: f32) -> Self {
        Self {
            margin,
            play_ratio,
            observed: HashSet::new(),
        }
    }

    /// Registration is permanent for the card's lifetime, unlike the
    /// one-shot load observer.
    pub fn observe(&mut self, name: &str) {
        self.observed.insert(name.to_string());
    }

    pub fn unobserve(&mut self, name: &str) {
        self.observed.remove(name);
    }

    pub fn is_observing(&self, name: &str) -> bool {
        self.observed.contains(name)
    }

    pub fn observed_names(&self) -> Vec<String> {
        self.observed.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// Apply one visibility sample to a video element. Sufficient
    /// visibility plays a ready element or starts the load of an
    /// unloaded one (returning the fetch to schedule); anything less
    /// pauses it.
    pub fn apply(&self, video: &mut VideoElement, ratio: f32) -> Option<FetchRequest> {
        if ratio >= self.play_ratio {
            match video.state {
                LoadState::Ready => {
                    video.play();
                    None
                }
                LoadState::Unloaded => {
                    let priority = video.priority;
                    video.begin_load(priority)
                }
                LoadState::Loading => None,
            }
        } else {
            video.pause();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::loader::LoadPriority;
    use iced::widget::image::Handle;

    fn controller() -> PlaybackController {
        PlaybackController::new(260.0, 0.15)
    }

    fn ready_video() -> VideoElement {
        let mut video = VideoElement::new("v.mp4".to_string(), "v.jpg".to_string(), None);
        video.begin_load(LoadPriority::Low);
        video.finish_load(Ok((Handle::from_rgba(1, 1, vec![0, 0, 0, 255]), (16, 9))));
        video
    }

    #[test]
    fn test_visible_ready_video_plays() {
        let mut video = ready_video();
        video.pause();

        assert!(controller().apply(&mut video, 0.2).is_none());
        assert!(video.playing);
    }

    #[test]
    fn test_leaving_the_viewport_pauses() {
        let mut video = ready_video();
        assert!(video.playing);

        controller().apply(&mut video, 0.05);
        assert!(!video.playing);
    }

    #[test]
    fn test_visible_unloaded_video_loads_once() {
        let mut video = VideoElement::new("v.mp4".to_string(), "v.jpg".to_string(), None);

        let request = controller().apply(&mut video, 0.5);
        assert_eq!(request.unwrap().url, "v.jpg");

        // Still loading: no duplicate request while the fetch is in flight.
        assert!(controller().apply(&mut video, 0.5).is_none());
    }
}
