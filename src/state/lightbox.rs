//! Full-screen viewer keyed to the live descriptor list.
//!
//! Navigation wraps modulo the list; every render bumps a monotonically
//! increasing swap token, and asynchronous image swaps commit only when
//! their captured token is still current. Nothing in flight is ever
//! aborted; stale results are simply dropped, so rapid navigation can
//! never flash an outdated asset into the visible element.

use iced::widget::image::Handle;

use crate::media::cache::ImageCache;
use crate::media::descriptor::MediaDescriptor;

/// Warm the cache this many positions to each side of the current item.
pub const PREFETCH_NEIGHBOR_COUNT: usize = 2;

/// What the viewer is currently presenting.
#[derive(Debug, Clone)]
pub enum LightboxDisplay {
    Image {
        handle: Option<Handle>,
        loading: bool,
    },
    Video {
        poster: Option<Handle>,
        playing: bool,
        muted: bool,
        looping: bool,
    },
}

/// Ephemeral viewer state; exists only while the modal is open.
#[derive(Debug, Clone)]
pub struct LightboxSession {
    pub index: usize,
    pub name: String,
    pub key: String,
    pub display: LightboxDisplay,
}

/// Side effects requested by the navigator. The update loop turns these
/// into tasks; the navigator itself never spawns anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightboxCommand {
    /// Fetch the full-resolution asset; the completion must echo `token`.
    FetchFull { url: String, token: u64 },
    /// Warm the cache for a neighbor.
    Prefetch { url: String },
}

#[derive(Debug, Default)]
pub struct Lightbox {
    session: Option<LightboxSession>,
    swap_token: u64,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&LightboxSession> {
        self.session.as_ref()
    }

    pub fn current_token(&self) -> u64 {
        self.swap_token
    }

    /// Open on an index (wrapped into range). A preview handle, usually
    /// whatever the card already shows, is painted immediately for
    /// non-video items so the modal never opens blank.
    pub fn open(
        &mut self,
        index: usize,
        preview: Option<Handle>,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        if descriptors.is_empty() {
            return Vec::new();
        }

        let index = index % descriptors.len();
        let descriptor = &descriptors[index];
        let display = if descriptor.is_video() {
            LightboxDisplay::Video {
                poster: None,
                playing: false,
                muted: true,
                looping: true,
            }
        } else {
            LightboxDisplay::Image {
                handle: preview,
                loading: true,
            }
        };
        self.session = Some(LightboxSession {
            index,
            name: descriptor.name.clone(),
            key: descriptor.key.clone(),
            display,
        });

        self.render(index, descriptors, cache)
    }

    /// Open on a name from the live list; unknown names are ignored.
    pub fn open_by_name(
        &mut self,
        name: &str,
        preview: Option<Handle>,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        match descriptors.iter().position(|d| d.name == name) {
            Some(index) => self.open(index, preview, descriptors, cache),
            None => Vec::new(),
        }
    }

    /// Present the item at `index`, invalidating any in-flight swap.
    pub fn render(
        &mut self,
        index: usize,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        let Some(descriptor) = descriptors.get(index) else {
            return Vec::new();
        };
        if self.session.is_none() {
            return Vec::new();
        }

        self.swap_token += 1;
        let token = self.swap_token;
        let source = descriptor.full_url();
        let mut commands = Vec::new();

        if descriptor.is_video() {
            // Video commits synchronously (there is no preload object to
            // wait for) but still validates the token for symmetry with
            // the image path.
            if token == self.swap_token {
                if let Some(session) = &mut self.session {
                    session.index = index;
                    session.name = descriptor.name.clone();
                    session.key = descriptor.key.clone();
                    session.display = LightboxDisplay::Video {
                        poster: cache.handle(&descriptor.thumbnail_url()),
                        playing: true,
                        muted: true,
                        looping: true,
                    };
                }
            }
        } else {
            if let Some(session) = &mut self.session {
                session.index = index;
                session.name = descriptor.name.clone();
                session.key = descriptor.key.clone();
                // Keep whatever is on screen until the swap commits.
                match &mut session.display {
                    LightboxDisplay::Image { loading, .. } => *loading = true,
                    display @ LightboxDisplay::Video { .. } => {
                        *display = LightboxDisplay::Image {
                            handle: None,
                            loading: true,
                        };
                    }
                }
            }

            match cache.handle(&source) {
                Some(handle) => self.finish_image_swap(token, Ok(handle)),
                None => {
                    cache.set_loading(source.clone());
                    commands.push(LightboxCommand::FetchFull {
                        url: source,
                        token,
                    });
                }
            }
        }

        commands.extend(self.prefetch_neighbors(index, descriptors, cache));
        commands
    }

    /// Commit an asynchronous image swap. Results issued under an older
    /// token (superseded navigation, or a closed session) are dropped.
    pub fn finish_image_swap(&mut self, token: u64, result: Result<Handle, String>) {
        if token != self.swap_token {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };

        match result {
            Ok(handle) => {
                session.display = LightboxDisplay::Image {
                    handle: Some(handle),
                    loading: false,
                };
            }
            Err(error) => {
                log::debug!("lightbox swap failed: {error}");
                if let LightboxDisplay::Image { loading, .. } = &mut session.display {
                    *loading = false;
                }
            }
        }
    }

    /// Step through the list; no-op when closed or with fewer than two
    /// items.
    pub fn navigate(
        &mut self,
        step: isize,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        if descriptors.len() < 2 {
            return Vec::new();
        }
        let Some(session) = &self.session else {
            return Vec::new();
        };

        let len = descriptors.len() as isize;
        let index = (session.index as isize + step).rem_euclid(len) as usize;
        self.render(index, descriptors, cache)
    }

    /// Hide the viewer. Dropping the session stops and unloads any active
    /// video; bumping the token strands every pending swap.
    pub fn close(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.session = None;
        self.swap_token += 1;
    }

    /// Reconcile the open session with a refreshed descriptor list. The
    /// previously displayed name is re-resolved: gone closes the viewer, a
    /// changed key re-renders, an unchanged key only refreshes neighbor
    /// prefetch (navigation enablement is derived from list length).
    pub fn resync(
        &mut self,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let name = session.name.clone();
        let key = session.key.clone();

        let Some(index) = descriptors.iter().position(|d| d.name == name) else {
            self.close();
            return Vec::new();
        };

        if descriptors[index].key != key {
            // Content changed underneath the viewer.
            return self.render(index, descriptors, cache);
        }

        if let Some(session) = &mut self.session {
            session.index = index;
        }
        self.prefetch_neighbors(index, descriptors, cache)
    }

    /// Warm the cache around `index`. Videos are skipped to save real
    /// bandwidth, and the cache dedupes, so each URL goes out at most
    /// once per run.
    fn prefetch_neighbors(
        &self,
        index: usize,
        descriptors: &[MediaDescriptor],
        cache: &mut ImageCache,
    ) -> Vec<LightboxCommand> {
        let len = descriptors.len();
        let mut commands = Vec::new();
        if len < 2 {
            return commands;
        }

        for step in 1..=PREFETCH_NEIGHBOR_COUNT {
            let forward = (index + step) % len;
            let backward = (index + len - (step % len)) % len;
            for neighbor in [forward, backward] {
                let descriptor = &descriptors[neighbor];
                if descriptor.is_video() {
                    continue;
                }
                let url = descriptor.full_url();
                if cache.get(&url).is_none() {
                    cache.set_loading(url.clone());
                    commands.push(LightboxCommand::Prefetch { url });
                }
            }
        }

        commands
    }
}
