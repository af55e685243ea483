//! Incremental reconciliation of the rendered card collection.
//!
//! Given a refreshed descriptor list, mutate the on-screen collection
//! minimally: unchanged identities in unchanged order are left alone, a
//! changed `key` rebuilds one card in place, vanished names are torn
//! down, and the display order is replaced as a single batch only when it
//! actually differs. The collection is owned here exclusively; other
//! components only read cards and toggle element flags.

use std::collections::{HashMap, HashSet};

use iced::widget::image::Handle;

use crate::media::descriptor::MediaDescriptor;

use super::loader::{FetchRequest, LoadPriority, LoadState, MediaElement, VisibilityObserver};
use super::playback::PlaybackController;

/// Cards loaded immediately, without waiting for a visibility signal.
pub const EAGER_LOAD_COUNT: usize = 8;

/// One on-screen card, keyed by descriptor name.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    /// Build stamp; a card keeps it for as long as it lives, so identity
    /// stability across reconciles is directly observable.
    pub id: u64,
    pub name: String,
    pub key: String,
    pub label: String,
    pub media: MediaElement,
    /// Set for cards that appeared in this reconcile, for entrance styling.
    pub is_new: bool,
}

/// A fetch scheduled during reconciliation, tagged with the card's build
/// stamp so completions for replaced cards can be discarded.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub name: String,
    pub card_id: u64,
    pub request: FetchRequest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub replaced: usize,
    pub removed: usize,
    pub reordered: bool,
    /// The incoming list was empty; the caller should show the empty state.
    pub empty: bool,
}

#[derive(Debug, Default)]
pub struct CardCollection {
    cards: HashMap<String, RenderedCard>,
    order: Vec<String>,
    next_card_id: u64,
}

impl CardCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RenderedCard> {
        self.cards.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RenderedCard> {
        self.cards.get_mut(name)
    }

    /// Display position of a card, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|entry| entry == name)
    }

    /// Cards in display order.
    pub fn ordered(&self) -> impl Iterator<Item = &RenderedCard> {
        self.order.iter().filter_map(|name| self.cards.get(name))
    }

    /// Diff the collection against a refreshed descriptor list.
    ///
    /// Returns the mutation summary plus the eager-load fetches to
    /// schedule. Observer registration happens here and nowhere else.
    pub fn reconcile(
        &mut self,
        next: &[MediaDescriptor],
        image_observer: &mut VisibilityObserver,
        playback: &mut PlaybackController,
    ) -> (ReconcileOutcome, Vec<LoadTicket>) {
        let mut outcome = ReconcileOutcome {
            empty: next.is_empty(),
            ..ReconcileOutcome::default()
        };

        // Tear down cards whose name fell out of the list.
        let next_names: HashSet<&str> = next.iter().map(|d| d.name.as_str()).collect();
        let stale: Vec<String> = self
            .cards
            .keys()
            .filter(|name| !next_names.contains(name.as_str()))
            .cloned()
            .collect();
        for name in stale {
            self.teardown(&name, image_observer, playback);
            outcome.removed += 1;
        }

        // Build new cards; rebuild in place where the key changed.
        for descriptor in next {
            let existing_key = self.cards.get(&descriptor.name).map(|card| card.key.clone());
            match existing_key {
                Some(key) if key == descriptor.key => {}
                Some(_) => {
                    self.teardown(&descriptor.name, image_observer, playback);
                    let card = self.build_card(descriptor, false);
                    self.cards.insert(descriptor.name.clone(), card);
                    outcome.replaced += 1;
                }
                None => {
                    let card = self.build_card(descriptor, true);
                    self.cards.insert(descriptor.name.clone(), card);
                    outcome.created += 1;
                }
            }
        }

        // Replace the display order as one batch, and only when needed.
        let next_order: Vec<String> = next.iter().map(|d| d.name.clone()).collect();
        let differs = next_order.len() != self.order.len()
            || next_order
                .iter()
                .zip(self.order.iter())
                .any(|(a, b)| a != b);
        if differs {
            self.order = next_order;
            outcome.reordered = true;
        }

        // Queue loading: the first EAGER_LOAD_COUNT cards load now, later
        // images wait for visibility, and every video card answers to the
        // playback controller regardless of position.
        let mut tickets = Vec::new();
        for (index, name) in self.order.iter().enumerate() {
            let Some(card) = self.cards.get_mut(name) else {
                continue;
            };
            let eager = index < EAGER_LOAD_COUNT;

            match &mut card.media {
                MediaElement::Video(video) => {
                    playback.observe(name);
                    if eager {
                        if let Some(request) = video.begin_load(LoadPriority::High) {
                            tickets.push(LoadTicket {
                                name: name.clone(),
                                card_id: card.id,
                                request,
                            });
                        }
                    } else if video.state == LoadState::Unloaded {
                        video.priority = LoadPriority::Low;
                    }
                }
                MediaElement::Image(image) => {
                    if eager {
                        if let Some(request) = image.begin_load(LoadPriority::High) {
                            tickets.push(LoadTicket {
                                name: name.clone(),
                                card_id: card.id,
                                request,
                            });
                        }
                    } else if image.state == LoadState::Unloaded {
                        image.priority = LoadPriority::Low;
                        image_observer.observe(name);
                    }
                }
            }
        }

        (outcome, tickets)
    }

    /// Finish an in-flight card load. Returns false when the completion
    /// is stale because the card was replaced or removed since the fetch
    /// began.
    pub fn finish_load(
        &mut self,
        name: &str,
        card_id: u64,
        result: Result<(Handle, (u32, u32)), String>,
    ) -> bool {
        match self.cards.get_mut(name) {
            Some(card) if card.id == card_id => {
                card.media.finish_load(result);
                true
            }
            _ => false,
        }
    }

    /// Unregister from both observers, stop playback, then remove.
    fn teardown(
        &mut self,
        name: &str,
        image_observer: &mut VisibilityObserver,
        playback: &mut PlaybackController,
    ) {
        image_observer.unobserve(name);
        playback.unobserve(name);
        if let Some(card) = self.cards.get_mut(name) {
            if let MediaElement::Video(video) = &mut card.media {
                video.pause();
            }
        }
        self.cards.remove(name);
    }

    fn build_card(&mut self, descriptor: &MediaDescriptor, is_new: bool) -> RenderedCard {
        self.next_card_id += 1;
        RenderedCard {
            id: self.next_card_id,
            name: descriptor.name.clone(),
            key: descriptor.key.clone(),
            label: descriptor.display_label(),
            media: MediaElement::for_descriptor(descriptor),
            is_new,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::descriptor::MediaType;

    fn descriptor(name: &str, key: &str) -> MediaDescriptor {
        MediaDescriptor {
            name: name.to_string(),
            key: key.to_string(),
            media_type: MediaType::Image,
            url: format!("./media/{name}"),
            thumb_url: format!("./media/{name}"),
            modified_ms: 0,
            size: 0,
            width: None,
            height: None,
        }
    }

    fn video_descriptor(name: &str, key: &str) -> MediaDescriptor {
        MediaDescriptor {
            media_type: MediaType::Video,
            ..descriptor(name, key)
        }
    }

    fn observers() -> (VisibilityObserver, PlaybackController) {
        (
            VisibilityObserver::new(640.0, 0.01),
            PlaybackController::new(260.0, 0.15),
        )
    }

    fn list(count: usize) -> Vec<MediaDescriptor> {
        (0..count)
            .map(|index| descriptor(&format!("item-{index}.jpg"), "k1"))
            .collect()
    }

    fn handle() -> Handle {
        Handle::from_rgba(1, 1, vec![0, 0, 0, 255])
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let descriptors = list(12);

        let (first, tickets) = cards.reconcile(&descriptors, &mut observer, &mut playback);
        assert_eq!(first.created, 12);
        assert!(first.reordered);
        assert_eq!(tickets.len(), EAGER_LOAD_COUNT);

        let (second, tickets) = cards.reconcile(&descriptors, &mut observer, &mut playback);
        assert_eq!(second, ReconcileOutcome::default());
        assert!(tickets.is_empty());
    }

    #[test]
    fn test_unchanged_cards_keep_their_instance() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let descriptors = list(3);

        cards.reconcile(&descriptors, &mut observer, &mut playback);
        let id_before = cards.get("item-1.jpg").unwrap().id;
        assert!(cards.finish_load("item-1.jpg", id_before, Ok((handle(), (2, 2)))));

        cards.reconcile(&descriptors, &mut observer, &mut playback);
        let card = cards.get("item-1.jpg").unwrap();
        assert_eq!(card.id, id_before);
        assert!(card.media.preview_handle().is_some(), "load state survives");
    }

    #[test]
    fn test_key_change_rebuilds_in_place() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let mut descriptors = list(10);

        cards.reconcile(&descriptors, &mut observer, &mut playback);
        let id_before = cards.get("item-9.jpg").unwrap().id;
        let position = cards.index_of("item-9.jpg").unwrap();
        assert!(observer.is_observing("item-9.jpg"));

        descriptors[9].key = "k2".to_string();
        let (outcome, _) = cards.reconcile(&descriptors, &mut observer, &mut playback);

        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.removed, 0);
        assert!(!outcome.reordered, "same membership, same order");

        let card = cards.get("item-9.jpg").unwrap();
        assert_ne!(card.id, id_before, "a replacement is a fresh card");
        assert!(!card.is_new, "replacements do not animate in");
        assert_eq!(cards.index_of("item-9.jpg"), Some(position));
        assert!(observer.is_observing("item-9.jpg"), "re-registered after rebuild");
    }

    #[test]
    fn test_removed_names_are_torn_down() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let mut descriptors = list(10);
        descriptors.push(video_descriptor("clip.mp4", "k1"));

        cards.reconcile(&descriptors, &mut observer, &mut playback);
        assert!(playback.is_observing("clip.mp4"));
        assert!(observer.is_observing("item-9.jpg"));

        descriptors.truncate(4);
        let (outcome, _) = cards.reconcile(&descriptors, &mut observer, &mut playback);

        assert_eq!(outcome.removed, 7);
        assert_eq!(cards.len(), 4);
        assert!(!playback.is_observing("clip.mp4"));
        assert!(!observer.is_observing("item-9.jpg"));
        assert!(cards.get("clip.mp4").is_none());
    }

    #[test]
    fn test_reorder_is_batched_and_conditional() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let mut descriptors = list(5);

        cards.reconcile(&descriptors, &mut observer, &mut playback);

        descriptors.swap(0, 4);
        let (outcome, _) = cards.reconcile(&descriptors, &mut observer, &mut playback);
        assert!(outcome.reordered);
        assert_eq!(outcome.created + outcome.removed + outcome.replaced, 0);

        let ordered: Vec<&str> = cards.ordered().map(|card| card.name.as_str()).collect();
        assert_eq!(ordered[0], "item-4.jpg");
        assert_eq!(ordered[4], "item-0.jpg");
    }

    #[test]
    fn test_eager_bound_is_min_of_eight_and_total() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();

        let (_, tickets) = cards.reconcile(&list(5), &mut observer, &mut playback);
        assert_eq!(tickets.len(), 5);

        let mut cards = CardCollection::new();
        let (mut observer, mut playback) = observers();
        let (_, tickets) = cards.reconcile(&list(20), &mut observer, &mut playback);
        assert_eq!(tickets.len(), EAGER_LOAD_COUNT);
        // Everything past the eager window waits on visibility.
        assert_eq!(observer.len(), 12);
    }

    #[test]
    fn test_videos_register_playback_not_image_observer() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let mut descriptors = list(10);
        descriptors.push(video_descriptor("tail-clip.mp4", "k1"));

        cards.reconcile(&descriptors, &mut observer, &mut playback);

        assert!(playback.is_observing("tail-clip.mp4"));
        assert!(!observer.is_observing("tail-clip.mp4"));
        // Deferred video: no eager ticket, load comes from the playback side.
        let card = cards.get("tail-clip.mp4").unwrap();
        assert_eq!(card.media.state(), LoadState::Unloaded);
    }

    #[test]
    fn test_empty_list_clears_everything() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        cards.reconcile(&list(6), &mut observer, &mut playback);

        let (outcome, tickets) = cards.reconcile(&[], &mut observer, &mut playback);
        assert!(outcome.empty);
        assert_eq!(outcome.removed, 6);
        assert!(cards.is_empty());
        assert!(tickets.is_empty());
        assert!(observer.is_empty());
    }

    #[test]
    fn test_stale_load_completion_is_discarded() {
        let (mut observer, mut playback) = observers();
        let mut cards = CardCollection::new();
        let mut descriptors = list(1);

        let (_, tickets) = cards.reconcile(&descriptors, &mut observer, &mut playback);
        let stale_id = tickets[0].card_id;

        // The card is replaced while its fetch is in flight.
        descriptors[0].key = "k2".to_string();
        cards.reconcile(&descriptors, &mut observer, &mut playback);

        assert!(!cards.finish_load("item-0.jpg", stale_id, Ok((handle(), (1, 1)))));
        let card = cards.get("item-0.jpg").unwrap();
        assert!(card.media.preview_handle().is_none());
    }
}
