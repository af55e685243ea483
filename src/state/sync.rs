//! Refresh-cycle bookkeeping: the status pill, the aggregate meta panel,
//! and the guard that keeps one fetch/reconcile cycle in flight at a time.

use chrono::{DateTime, Local, TimeZone};

use crate::media::descriptor::MediaDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Loading,
    Live,
    Error,
}

/// Human-readable sync state for the header pill.
#[derive(Debug, Clone)]
pub struct StatusPill {
    pub message: String,
    pub level: StatusLevel,
}

impl StatusPill {
    pub fn loading() -> Self {
        Self {
            message: "Syncing media library…".to_string(),
            level: StatusLevel::Loading,
        }
    }

    /// A successful refresh; the message says where the data came from
    /// and when it landed.
    pub fn live(fallback: bool, refresh_secs: u64) -> Self {
        let time = format_sync_time(Local::now());
        let message = if fallback {
            format!("Loaded static media index • {time}")
        } else if refresh_secs > 0 {
            format!("Loaded • {time} • Auto-sync {refresh_secs}s")
        } else {
            format!("Loaded • {time} • Manual refresh")
        };
        Self {
            message,
            level: StatusLevel::Live,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Error,
        }
    }
}

/// One header field. Statically seeded fields keep their value across
/// refreshes; dynamic ones track the descriptor list.
#[derive(Debug, Clone)]
pub struct MetaField {
    value: String,
    is_static: bool,
}

impl MetaField {
    fn dynamic() -> Self {
        Self {
            value: "—".to_string(),
            is_static: false,
        }
    }

    fn fixed(value: String) -> Self {
        Self {
            value,
            is_static: true,
        }
    }

    fn from_static(value: Option<String>) -> Self {
        match value {
            Some(value) => Self::fixed(value),
            None => Self::dynamic(),
        }
    }

    fn set(&mut self, value: String) {
        if !self.is_static {
            self.value = value;
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Aggregate facts shown in the header: item count plus the span between
/// the oldest and the most recent modification.
#[derive(Debug, Clone)]
pub struct MetaPanel {
    pub count: usize,
    pub started: MetaField,
    pub modified: MetaField,
    pub length: MetaField,
}

impl MetaPanel {
    pub fn new(
        static_started: Option<String>,
        static_modified: Option<String>,
        static_length: Option<String>,
    ) -> Self {
        Self {
            count: 0,
            started: MetaField::from_static(static_started),
            modified: MetaField::from_static(static_modified),
            length: MetaField::from_static(static_length),
        }
    }

    /// Refresh the panel. The list is newest-first, so the most recent
    /// stamp is the head and the oldest is the tail.
    pub fn sync(&mut self, descriptors: &[MediaDescriptor]) {
        self.count = descriptors.len();
        self.length.set(self.count.to_string());

        let (Some(latest), Some(oldest)) = (descriptors.first(), descriptors.last()) else {
            self.started.set("—".to_string());
            self.modified.set("—".to_string());
            return;
        };

        self.modified.set(format_meta_date(latest.modified_ms));
        self.started.set(format_meta_date(oldest.modified_ms));
    }
}

/// Mutual exclusion for the refresh cycle. A refresh in flight is never
/// re-entered; user-driven lightbox navigation is unaffected.
#[derive(Debug, Default)]
pub struct SyncGuard {
    in_flight: bool,
}

impl SyncGuard {
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// `3:07 PM`, the stamp shown in the status pill.
pub fn format_sync_time(when: DateTime<Local>) -> String {
    when.format("%-I:%M %p").to_string()
}

/// `Mar 4, 2026`, or a dash for missing stamps.
pub fn format_meta_date(modified_ms: i64) -> String {
    if modified_ms <= 0 {
        return "—".to_string();
    }
    match Local.timestamp_millis_opt(modified_ms).single() {
        Some(when) => when.format("%b %-d, %Y").to_string(),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::descriptor::MediaType;

    fn descriptor(name: &str, modified_ms: i64) -> MediaDescriptor {
        MediaDescriptor {
            name: name.to_string(),
            key: format!("{name}-{modified_ms}"),
            media_type: MediaType::Image,
            url: format!("./media/{name}"),
            thumb_url: format!("./media/{name}"),
            modified_ms,
            size: 0,
            width: None,
            height: None,
        }
    }

    #[test]
    fn test_meta_tracks_newest_first_list() {
        let mut panel = MetaPanel::new(None, None, None);
        panel.sync(&[descriptor("new.jpg", 1_700_000_000_000), descriptor("old.jpg", 1_500_000_000_000)]);

        assert_eq!(panel.count, 2);
        assert_eq!(panel.length.value(), "2");
        assert_ne!(panel.modified.value(), "—");
        assert_ne!(panel.started.value(), "—");
        assert_ne!(panel.modified.value(), panel.started.value());
    }

    #[test]
    fn test_meta_static_fields_survive_refreshes() {
        let mut panel = MetaPanel::new(Some("Jan 1, 2019".to_string()), None, None);
        panel.sync(&[descriptor("a.jpg", 1_700_000_000_000)]);

        assert_eq!(panel.started.value(), "Jan 1, 2019");
        assert_ne!(panel.modified.value(), "—");
    }

    #[test]
    fn test_meta_empty_list_shows_dashes() {
        let mut panel = MetaPanel::new(None, None, None);
        panel.sync(&[descriptor("a.jpg", 1_700_000_000_000)]);
        panel.sync(&[]);

        assert_eq!(panel.count, 0);
        assert_eq!(panel.started.value(), "—");
        assert_eq!(panel.modified.value(), "—");
    }

    #[test]
    fn test_guard_is_not_reentrant() {
        let mut guard = SyncGuard::default();
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.finish();
        assert!(guard.try_begin());
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(StatusPill::loading().level, StatusLevel::Loading);

        let live = StatusPill::live(false, 0);
        assert!(live.message.starts_with("Loaded •"));
        assert!(live.message.ends_with("Manual refresh"));

        let auto = StatusPill::live(false, 30);
        assert!(auto.message.ends_with("Auto-sync 30s"));

        let fallback = StatusPill::live(true, 0);
        assert!(fallback.message.starts_with("Loaded static media index"));
        assert_eq!(fallback.level, StatusLevel::Live);

        let error = StatusPill::error("Could not read media library");
        assert_eq!(error.level, StatusLevel::Error);
    }

    #[test]
    fn test_meta_date_handles_missing_stamp() {
        assert_eq!(format_meta_date(0), "—");
        assert_eq!(format_meta_date(-5), "—");
        assert!(format_meta_date(1_700_000_000_000).contains(", 2023"));
    }
}
