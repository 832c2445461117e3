//! File names and layout constants.
//!
//! The file names are part of the on-disk contract with external
//! collaborators (the icon compositor reads [`ARTIFACT_FILENAME`]).

/// Per-folder annotation file holding the raw markup.
pub const WIKITEXT_FILENAME: &str = ".wikitext";

/// Rendered HTML artifact written next to the annotation.
pub const ARTIFACT_FILENAME: &str = ".wikitext.html";

/// Prefix of the numbered "write in progress" marker.
pub const PLACEHOLDER_PREFIX: &str = "~wikithinking_placeholder_file";

/// Suffix of the numbered "write in progress" marker.
pub const PLACEHOLDER_SUFFIX: &str = ".tmp";

/// HTML template resource name inside the resources directory.
pub const HTML_TEMPLATE_FILENAME: &str = "template.html";

/// Background image resource name inside the resources directory.
pub const BACKGROUND_IMAGE_FILENAME: &str = "background.png";

/// Edge length of the icons drawn in the folder's title stripe.
pub const OPTIMAL_ICON_SIZE: u32 = 24;

/// Spacing between the title stripe and the rendered content.
pub const TITLESTRIPE_MARGIN_SPACING: u32 = 10;

/// Margin around each icon.
pub const ICON_MARGIN: u32 = 2;

/// Extra height added to the folder window when rendering.
pub const RENDER_WINDOW_EXTRA_HEIGHT: u32 = 32;

/// File name of the `n`th placeholder marker.
pub fn placeholder_filename(n: u32) -> String {
    format!("{PLACEHOLDER_PREFIX}{n}{PLACEHOLDER_SUFFIX}")
}

/// Whether `name` is a placeholder marker produced by [`placeholder_filename`].
pub fn is_placeholder_filename(name: &str) -> bool {
    name.strip_prefix(PLACEHOLDER_PREFIX)
        .and_then(|rest| rest.strip_suffix(PLACEHOLDER_SUFFIX))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}


/// Largest accepted folder window side, in pixels.
pub const MAX_WINDOW_DIMENSION: u32 = 16_384;
