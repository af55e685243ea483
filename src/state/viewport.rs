//! Scroll-derived visibility geometry for the card grid.
//!
//! The loaders never look at widgets: they consume plain visibility
//! ratios computed here from the scroll offset and the grid's fixed tile
//! pitch. Tests drive the observers with synthetic windows instead of a
//! rendering surface.

/// Fixed tile pitch; the wrap layout and this module must agree on it.
pub const TILE_WIDTH: f32 = 248.0;
pub const TILE_HEIGHT: f32 = 312.0;
pub const GRID_SPACING: f32 = 18.0;

/// Load observer tuning: start fetching well before entry.
pub const LOAD_MARGIN: f32 = 640.0;
pub const LOAD_RATIO: f32 = 0.01;

/// Playback observer tuning: tighter margin, meaningful visibility.
pub const PLAYBACK_MARGIN: f32 = 260.0;
pub const PLAYBACK_RATIO: f32 = 0.15;

/// Last known scroll state of the board.
#[derive(Debug, Clone, Copy)]
pub struct ScrollWindow {
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ScrollWindow {
    /// Before the first scroll event we assume a typical window so the
    /// initial visibility pass can run at all.
    fn default() -> Self {
        Self {
            offset_y: 0.0,
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Column/row arithmetic for a fixed-pitch wrapped grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub columns: usize,
}

impl GridMetrics {
    pub fn for_width(content_width: f32) -> Self {
        let pitch = TILE_WIDTH + GRID_SPACING;
        let columns = ((content_width + GRID_SPACING) / pitch).floor() as usize;
        Self {
            columns: columns.max(1),
        }
    }

    pub fn row_of(&self, index: usize) -> usize {
        index / self.columns
    }

    /// Top edge of a tile in board coordinates.
    pub fn item_top(&self, index: usize) -> f32 {
        self.row_of(index) as f32 * (TILE_HEIGHT + GRID_SPACING)
    }

    /// Fraction of the tile inside the window extended by `margin` on
    /// both vertical edges. 0.0 when fully outside, 1.0 when fully inside.
    pub fn visibility_ratio(&self, index: usize, window: ScrollWindow, margin: f32) -> f32 {
        let extended_top = window.offset_y - margin;
        let extended_bottom = window.offset_y + window.height + margin;

        let top = self.item_top(index);
        let bottom = top + TILE_HEIGHT;

        let overlap = bottom.min(extended_bottom) - top.max(extended_top);
        (overlap / TILE_HEIGHT).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(offset_y: f32, height: f32) -> ScrollWindow {
        ScrollWindow {
            offset_y,
            width: 1280.0,
            height,
        }
    }

    #[test]
    fn test_columns_for_width() {
        assert_eq!(GridMetrics::for_width(1280.0).columns, 4);
        assert_eq!(GridMetrics::for_width(TILE_WIDTH).columns, 1);
        // Never zero columns, even for absurd widths.
        assert_eq!(GridMetrics::for_width(10.0).columns, 1);
    }

    #[test]
    fn test_rows_follow_columns() {
        let metrics = GridMetrics { columns: 4 };
        assert_eq!(metrics.row_of(0), 0);
        assert_eq!(metrics.row_of(3), 0);
        assert_eq!(metrics.row_of(4), 1);
        assert_eq!(metrics.item_top(4), TILE_HEIGHT + GRID_SPACING);
    }

    #[test]
    fn test_ratio_inside_and_outside() {
        let metrics = GridMetrics { columns: 1 };

        // First tile fully inside the window.
        assert_eq!(metrics.visibility_ratio(0, window(0.0, 800.0), 0.0), 1.0);

        // A tile several rows below a short window is invisible.
        assert_eq!(metrics.visibility_ratio(5, window(0.0, 300.0), 0.0), 0.0);
    }

    #[test]
    fn test_margin_extends_the_window() {
        let metrics = GridMetrics { columns: 1 };
        let short = window(0.0, 100.0);

        // Row 1 starts past the bare window but inside the 640px margin.
        assert_eq!(metrics.visibility_ratio(1, short, 0.0), 0.0);
        assert!(metrics.visibility_ratio(1, short, LOAD_MARGIN) > 0.9);
    }

    #[test]
    fn test_partial_overlap_ratio() {
        let metrics = GridMetrics { columns: 1 };
        // Window ends halfway through the first tile.
        let ratio = metrics.visibility_ratio(0, window(0.0, TILE_HEIGHT / 2.0), 0.0);
        assert!((ratio - 0.5).abs() < 0.01);
    }
}
