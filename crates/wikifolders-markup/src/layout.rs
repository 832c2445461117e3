//! Fixed canvas arithmetic for the rendered document.

use wikifolders_config::constants::{
    ICON_MARGIN, OPTIMAL_ICON_SIZE, RENDER_WINDOW_EXTRA_HEIGHT, TITLESTRIPE_MARGIN_SPACING,
};

/// Pixel geometry substituted into the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLayout {
    /// Canvas width.
    pub width: u32,
    /// Canvas height, including the extra render height.
    pub height: u32,
    /// Offset of the content below the icon row and title stripe.
    pub content_top: u32,
    /// Left/right content margin.
    pub content_margin: u32,
}

impl CanvasLayout {
    /// Layout for a folder window of the given size.
    ///
    /// The height saturates rather than overflowing for absurd windows.
    pub fn for_window(window_width: u32, window_height: u32) -> Self {
        Self {
            width: window_width,
            height: window_height.saturating_add(RENDER_WINDOW_EXTRA_HEIGHT),
            content_top: OPTIMAL_ICON_SIZE + 2 * ICON_MARGIN + TITLESTRIPE_MARGIN_SPACING,
            content_margin: TITLESTRIPE_MARGIN_SPACING,
        }
    }
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self::for_window(480, 320)
    }
}
