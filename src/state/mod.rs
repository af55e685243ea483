/// State management module
///
/// This module owns all engine state for the board:
/// - Rendered card collection and reconciliation (cards.rs)
/// - Visibility-driven load state machines (loader.rs)
/// - Video play/pause control (playback.rs)
/// - Scroll geometry feeding both observers (viewport.rs)
/// - The full-screen viewer session (lightbox.rs)
/// - Refresh bookkeeping: status, meta, in-flight guard (sync.rs)
pub mod cards;
pub mod lightbox;
pub mod loader;
pub mod playback;
pub mod sync;
pub mod viewport;
