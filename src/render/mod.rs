//! Markdown to HTML rendering for the answer surface.
//!
//! Accumulated Markdown is converted with `pulldown-cmark` and painted onto
//! a [`Surface`](crate::traits::Surface). During streaming, renders are
//! coalesced by [`ThrottledRenderer`]: at most one paint per window while
//! fragments keep arriving, plus one forced paint at the end.
//!
//! # Module structure
//! - `html` - think-marker substitution and the Markdown to HTML conversion
//! - `throttle` - the coalescing renderer
//! - `document` - ordered sections composed into one Markdown document
//! - `surface` - in-memory and file-backed surfaces

mod document;
mod html;
mod surface;
mod throttle;

pub use document::{error_markdown, RenderDocument, Section, WAITING_PLACEHOLDER};
pub use html::{render_html, substitute_think_markers};
pub use surface::{FileSurface, MemorySurface};
pub use throttle::ThrottledRenderer;
