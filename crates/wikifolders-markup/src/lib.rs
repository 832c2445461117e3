//! WikiFolders markup engine
//!
//! Converts the forgiving wiki-style annotation dialect to HTML and back,
//! and composes the converted HTML into the folder's rendered document.
//!
//! - [`to_html`] / [`to_markup`]: bidirectional tag rewriting
//! - [`Renderer`]: template + background + layout composition
//!
//! Neither direction fails on malformed input. Unmatched delimiters are
//! left as literal text and reported through [`Rewrite::unmatched`].

pub mod error;
pub mod layout;
pub mod render;
pub mod rewriter;
pub mod tags;

pub use error::{RenderError, RenderResult};
pub use layout::CanvasLayout;
pub use render::{render, RenderSettings, Renderer};
pub use rewriter::{to_html, to_html_counted, to_markup, to_markup_counted, Rule, TagPair, RULES};
pub use tags::{replace_occurrences, replace_tag_pair, Rewrite};
