/// Media acquisition module
///
/// This module handles everything between the outside world and the
/// canonical descriptor list:
/// - Normalization of raw records (descriptor.rs)
/// - Endpoint fetching, fallback manifest, media byte fetches (source.rs)
/// - The shared decoded-handle cache (cache.rs)
pub mod cache;
pub mod descriptor;
pub mod source;
