//! Document composition
//!
//! The template is plain HTML with `{{key}}` placeholders:
//! `content`, `background`, `width`, `height`, `top`, `margin`,
//! `font_size` and `border`. Unknown keys are left as written.
//!
//! Substitution is a single pass over the template, so placeholder-like
//! text inside the converted content is never expanded.

use crate::error::{RenderError, RenderResult};
use crate::layout::CanvasLayout;
use crate::rewriter::to_html_counted;
use std::path::{Path, PathBuf};
use tracing::debug;
use wikifolders_config::Preferences;

/// Built-in document used when the template resource is unavailable.
pub const FALLBACK_TEMPLATE: &str = concat!(
    "<!DOCTYPE html>\n",
    "<html><head><meta charset=\"utf-8\"></head>\n",
    "<body style=\"margin:0;width:{{width}}px;height:{{height}}px;\">\n",
    "<div style=\"padding:{{top}}px {{margin}}px 0 {{margin}}px;font-size:{{font_size}}px;\">",
    "{{content}}</div>\n",
    "</body></html>\n"
);

/// Preference-derived values substituted into the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Canvas geometry.
    pub layout: CanvasLayout,
    /// Content font size in pixels.
    pub font_size: u32,
    /// Draw a border around the content.
    pub draw_border: bool,
}

impl RenderSettings {
    /// Settings taken from user preferences.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            layout: CanvasLayout::for_window(prefs.window_width, prefs.window_height),
            font_size: prefs.rendered_font_size,
            draw_border: prefs.draw_icon_borders,
        }
    }

    fn border_css(&self) -> &'static str {
        if self.draw_border {
            "1px solid #808080"
        } else {
            "none"
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_preferences(&Preferences::default())
    }
}

/// Renders annotations against a fixed template and background image.
#[derive(Debug, Clone)]
pub struct Renderer {
    template_path: PathBuf,
    background_path: PathBuf,
    settings: RenderSettings,
}

impl Renderer {
    /// Create a renderer for explicit resources.
    pub fn new(
        template_path: impl Into<PathBuf>,
        background_path: impl Into<PathBuf>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            background_path: background_path.into(),
            settings,
        }
    }

    /// Create a renderer using the resources directory from preferences.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(
            prefs.template_path(),
            prefs.background_path(),
            RenderSettings::from_preferences(prefs),
        )
    }

    /// Template resource path.
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Background image path.
    pub fn background_path(&self) -> &Path {
        &self.background_path
    }

    /// Render settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `markup` into a complete document.
    pub async fn render(&self, markup: &str) -> RenderResult<String> {
        render(markup, &self.template_path, &self.background_path, &self.settings).await
    }

    /// Render `markup` with the built-in template, ignoring the resources.
    pub fn render_fallback(&self, markup: &str) -> String {
        compose(FALLBACK_TEMPLATE, markup, &self.background_path, &self.settings)
    }
}

/// Render `markup` with the template and background at the given paths.
///
/// Identical inputs always produce byte-identical output.
pub async fn render(
    markup: &str,
    template_path: &Path,
    background_path: &Path,
    settings: &RenderSettings,
) -> RenderResult<String> {
    let template =
        tokio::fs::read_to_string(template_path)
            .await
            .map_err(|source| RenderError::TemplateMissing {
                path: template_path.to_path_buf(),
                source,
            })?;

    if tokio::fs::metadata(background_path).await.is_err() {
        return Err(RenderError::ResourceMissing(background_path.to_path_buf()));
    }

    Ok(compose(&template, markup, background_path, settings))
}

/// Substitute converted markup and layout values into `template`.
pub fn compose(
    template: &str,
    markup: &str,
    background_path: &Path,
    settings: &RenderSettings,
) -> String {
    let content = to_html_counted(markup);
    debug!(
        replacements = content.replacements,
        unmatched = content.unmatched,
        "Composing rendered document"
    );

    let background = background_path.display().to_string();
    let layout = &settings.layout;

    fill_template(template, |key| match key {
        "content" => Some(content.text.clone()),
        "background" => Some(background.clone()),
        "width" => Some(layout.width.to_string()),
        "height" => Some(layout.height.to_string()),
        "top" => Some(layout.content_top.to_string()),
        "margin" => Some(layout.content_margin.to_string()),
        "font_size" => Some(settings.font_size.to_string()),
        "border" => Some(settings.border_css().to_string()),
        _ => None,
    })
}

fn fill_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let key = &after_open[..close];
        out.push_str(&rest[..open]);
        match lookup(key.trim()) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}
