use iced::keyboard::{self, key};
use iced::widget::{center, column, mouse_area, opaque, scrollable, stack};
use iced::{Element, Subscription, Task, Theme};

// Declare the application modules
mod config;
mod media;
mod state;
mod ui;

use config::AppConfig;
use media::cache::ImageCache;
use media::descriptor::{MediaDescriptor, RawMediaItem};
use media::source::{self, FetchOutcome, FetchedMedia};
use state::cards::{CardCollection, LoadTicket};
use state::lightbox::{Lightbox, LightboxCommand};
use state::loader::{LoadPriority, MediaElement, VisibilityObserver};
use state::playback::PlaybackController;
use state::sync::{MetaPanel, StatusPill, SyncGuard};
use state::viewport::{self, GridMetrics, ScrollWindow};

/// Main application state
struct Pinboard {
    config: AppConfig,
    /// Static fallback manifest, loaded once at startup.
    manifest: Vec<RawMediaItem>,
    /// The live descriptor list, newest refresh wins.
    descriptors: Vec<MediaDescriptor>,
    cards: CardCollection,
    image_observer: VisibilityObserver,
    playback: PlaybackController,
    lightbox: Lightbox,
    cache: ImageCache,
    status: StatusPill,
    meta: MetaPanel,
    guard: SyncGuard,
    /// Last known scroll state of the board.
    window: ScrollWindow,
    /// True after a refresh where every source failed; hides the board.
    show_error_state: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// The static fallback manifest finished loading (possibly empty)
    ManifestLoaded(Vec<RawMediaItem>),
    /// User asked for a refresh (toolbar button or the R key)
    RefreshRequested,
    /// The periodic sync timer fired
    RefreshTick,
    /// A descriptor fetch resolved
    PayloadFetched(Result<FetchOutcome, String>),
    /// The board scrolled or resized
    GridScrolled(scrollable::Viewport),
    /// A card was clicked
    CardPressed(String),
    /// A card's media fetch completed
    CardMediaLoaded {
        name: String,
        card_id: u64,
        url: String,
        result: Result<FetchedMedia, String>,
    },
    /// A full-resolution lightbox swap completed
    LightboxSwapLoaded {
        token: u64,
        url: String,
        result: Result<FetchedMedia, String>,
    },
    /// A neighbor prefetch completed
    NeighborPrefetched {
        url: String,
        result: Result<FetchedMedia, String>,
    },
    LightboxNavigate(isize),
    LightboxClosed,
    KeyPressed(keyboard::Key),
}

impl Pinboard {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::from_environment();
        println!("🖼️  Pinboard starting • endpoints: {}", config.endpoints.join(", "));

        let manifest_path = config.manifest_path.clone();
        let app = Pinboard {
            meta: MetaPanel::new(
                config.static_started.clone(),
                config.static_modified.clone(),
                config.static_length.clone(),
            ),
            config,
            manifest: Vec::new(),
            descriptors: Vec::new(),
            cards: CardCollection::new(),
            image_observer: VisibilityObserver::new(viewport::LOAD_MARGIN, viewport::LOAD_RATIO),
            playback: PlaybackController::new(viewport::PLAYBACK_MARGIN, viewport::PLAYBACK_RATIO),
            lightbox: Lightbox::new(),
            cache: ImageCache::new(),
            status: StatusPill::loading(),
            guard: SyncGuard::default(),
            window: ScrollWindow::default(),
            show_error_state: false,
        };

        (
            app,
            Task::perform(source::load_manifest(manifest_path), Message::ManifestLoaded),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ManifestLoaded(items) => {
                self.manifest = items;
                self.begin_refresh()
            }
            Message::RefreshRequested | Message::RefreshTick => self.begin_refresh(),
            Message::PayloadFetched(Ok(outcome)) => {
                self.guard.finish();
                self.show_error_state = false;
                self.descriptors = outcome.descriptors;

                let (summary, tickets) = self.cards.reconcile(
                    &self.descriptors,
                    &mut self.image_observer,
                    &mut self.playback,
                );
                if summary.created + summary.replaced + summary.removed > 0 || summary.reordered {
                    log::info!(
                        "reconciled board: +{} ~{} -{} reordered={}",
                        summary.created,
                        summary.replaced,
                        summary.removed,
                        summary.reordered
                    );
                }

                let mut tasks = vec![self.spawn_card_loads(tickets)];
                // Cards placed inside the current load window start
                // immediately, without waiting for the next scroll event.
                tasks.push(self.run_visibility_pass());

                let commands = self.lightbox.resync(&self.descriptors, &mut self.cache);
                tasks.push(self.spawn_lightbox_commands(commands));

                self.meta.sync(&self.descriptors);
                self.status = StatusPill::live(outcome.fallback, self.config.refresh_secs);

                Task::batch(tasks)
            }
            Message::PayloadFetched(Err(message)) => {
                self.guard.finish();
                self.status = StatusPill::error(message);
                self.show_error_state = true;
                Task::none()
            }
            Message::GridScrolled(viewport) => {
                let offset = viewport.absolute_offset();
                let bounds = viewport.bounds();
                self.window = ScrollWindow {
                    offset_y: offset.y,
                    width: bounds.width,
                    height: bounds.height,
                };
                self.run_visibility_pass()
            }
            Message::CardPressed(name) => {
                let preview = self
                    .cards
                    .get(&name)
                    .and_then(|card| card.media.preview_handle());
                let commands =
                    self.lightbox
                        .open_by_name(&name, preview, &self.descriptors, &mut self.cache);
                self.spawn_lightbox_commands(commands)
            }
            Message::CardMediaLoaded {
                name,
                card_id,
                url,
                result,
            } => {
                match &result {
                    Ok(media) => self.cache.set_loaded(url, media.handle.clone()),
                    Err(error) => {
                        log::debug!("card media failed: {error}");
                        self.cache.set_failed(url);
                    }
                }
                let outcome = result.map(|media| (media.handle, (media.width, media.height)));
                if !self.cards.finish_load(&name, card_id, outcome) {
                    log::debug!("dropped stale media completion for {name}");
                }
                Task::none()
            }
            Message::LightboxSwapLoaded { token, url, result } => {
                match &result {
                    Ok(media) => self.cache.set_loaded(url, media.handle.clone()),
                    Err(_) => self.cache.set_failed(url),
                }
                self.lightbox
                    .finish_image_swap(token, result.map(|media| media.handle));
                Task::none()
            }
            Message::NeighborPrefetched { url, result } => {
                match result {
                    Ok(media) => self.cache.set_loaded(url, media.handle),
                    Err(error) => {
                        log::debug!("neighbor prefetch failed: {error}");
                        self.cache.set_failed(url);
                    }
                }
                Task::none()
            }
            Message::LightboxNavigate(step) => self.navigate_lightbox(step),
            Message::LightboxClosed => {
                self.lightbox.close();
                Task::none()
            }
            Message::KeyPressed(pressed) => self.handle_key(pressed),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = ui::header::header(&self.status, &self.meta);

        let body: Element<Message> = if self.show_error_state {
            ui::board::error_state(&self.status.message)
        } else if self.cards.is_empty() {
            ui::board::empty_state()
        } else {
            ui::board::board(self.cards.ordered())
        };

        let base = column![header, body].spacing(14.0).padding(18.0);

        match self.lightbox.session() {
            Some(session) => {
                let modal = ui::lightbox::overlay(session, self.descriptors.len() > 1);
                stack![
                    base,
                    opaque(mouse_area(center(opaque(modal))).on_press(Message::LightboxClosed)),
                ]
                .into()
            }
            None => base.into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(handle_key_press);

        match self.config.refresh_interval() {
            Some(interval) => Subscription::batch([
                keys,
                iced::time::every(interval).map(|_| Message::RefreshTick),
            ]),
            None => keys,
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Kick a fetch/reconcile cycle unless one is already in flight.
    fn begin_refresh(&mut self) -> Task<Message> {
        if !self.guard.try_begin() {
            return Task::none();
        }

        self.status = StatusPill::loading();
        let endpoints = self.config.endpoints.clone();
        let manifest = self.manifest.clone();

        Task::perform(source::fetch_descriptors(endpoints, manifest), |result| {
            Message::PayloadFetched(result.map_err(|error| error.to_string()))
        })
    }

    /// Feed the current scroll window through both observers.
    fn run_visibility_pass(&mut self) -> Task<Message> {
        let metrics = GridMetrics::for_width(self.window.width);
        let mut tickets: Vec<LoadTicket> = Vec::new();

        // One-shot image loads.
        for name in self.image_observer.observed_names() {
            let Some(index) = self.cards.index_of(&name) else {
                continue;
            };
            let ratio = metrics.visibility_ratio(index, self.window, self.image_observer.margin);
            if !self.image_observer.take_intersection(&name, ratio) {
                continue;
            }
            if let Some(card) = self.cards.get_mut(&name) {
                if let Some(request) = card.media.begin_load(LoadPriority::Low) {
                    tickets.push(LoadTicket {
                        name: name.clone(),
                        card_id: card.id,
                        request,
                    });
                }
            }
        }

        // Play/pause sweep over every video card.
        for name in self.playback.observed_names() {
            let Some(index) = self.cards.index_of(&name) else {
                continue;
            };
            let ratio = metrics.visibility_ratio(index, self.window, self.playback.margin);
            if let Some(card) = self.cards.get_mut(&name) {
                if let MediaElement::Video(video) = &mut card.media {
                    if let Some(request) = self.playback.apply(video, ratio) {
                        tickets.push(LoadTicket {
                            name: name.clone(),
                            card_id: card.id,
                            request,
                        });
                    }
                }
            }
        }

        self.spawn_card_loads(tickets)
    }

    /// Turn reconciler/visibility tickets into fetch tasks.
    fn spawn_card_loads(&mut self, tickets: Vec<LoadTicket>) -> Task<Message> {
        let mut tasks = Vec::new();
        for ticket in tickets {
            let LoadTicket {
                name,
                card_id,
                request,
            } = ticket;
            self.cache.set_loading(request.url.clone());
            log::debug!("card fetch ({:?} priority): {}", request.priority, request.url);

            let url = request.url;
            tasks.push(Task::perform(source::fetch_media(url.clone()), move |result| {
                Message::CardMediaLoaded {
                    name: name.clone(),
                    card_id,
                    url: url.clone(),
                    result,
                }
            }));
        }
        Task::batch(tasks)
    }

    /// Turn navigator commands into fetch tasks.
    fn spawn_lightbox_commands(&mut self, commands: Vec<LightboxCommand>) -> Task<Message> {
        let mut tasks = Vec::new();
        for command in commands {
            match command {
                LightboxCommand::FetchFull { url, token } => {
                    tasks.push(Task::perform(
                        source::fetch_media(url.clone()),
                        move |result| Message::LightboxSwapLoaded {
                            token,
                            url: url.clone(),
                            result,
                        },
                    ));
                }
                LightboxCommand::Prefetch { url } => {
                    tasks.push(Task::perform(
                        source::fetch_media(url.clone()),
                        move |result| Message::NeighborPrefetched {
                            url: url.clone(),
                            result,
                        },
                    ));
                }
            }
        }
        Task::batch(tasks)
    }

    fn navigate_lightbox(&mut self, step: isize) -> Task<Message> {
        let commands = self
            .lightbox
            .navigate(step, &self.descriptors, &mut self.cache);
        self.spawn_lightbox_commands(commands)
    }

    fn handle_key(&mut self, pressed: keyboard::Key) -> Task<Message> {
        if self.lightbox.is_open() {
            match pressed.as_ref() {
                keyboard::Key::Named(key::Named::Escape) => {
                    self.lightbox.close();
                    return Task::none();
                }
                keyboard::Key::Named(key::Named::ArrowLeft) => return self.navigate_lightbox(-1),
                keyboard::Key::Named(key::Named::ArrowRight) => return self.navigate_lightbox(1),
                _ => {}
            }
        }

        if let keyboard::Key::Character(character) = pressed.as_ref() {
            if character == "r" {
                return self.begin_refresh();
            }
        }

        Task::none()
    }
}

fn handle_key_press(pressed: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    Some(Message::KeyPressed(pressed))
}

fn init_logger() {
    use env_logger::{Builder, Target};
    use log::LevelFilter;

    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
    } else {
        Builder::new()
            .target(Target::Stdout)
            .filter_level(LevelFilter::Warn)
            .filter_module("pinboard", LevelFilter::Info)
            .init();
    }
}

fn main() -> iced::Result {
    init_logger();

    iced::application("Pinboard", Pinboard::update, Pinboard::view)
        .subscription(Pinboard::subscription)
        .theme(Pinboard::theme)
        .centered()
        .run_with(Pinboard::new)
}
