//! Bill XML rendering and HTML-to-text/Markdown conversion.
//!
//! A [`Stylesheet`] maps bill XML elements to HTML. The [`Transformer`] applies
//! it to whole bills and to individual sections, then runs every rendered
//! fragment through one shared [`convert`] routine producing plain text and
//! link/image-free Markdown.

mod cleanup;
mod convert;
mod stylesheet;
mod transform;

pub use convert::{Converted, convert, html_to_markdown, html_to_text};
pub use stylesheet::{ElementRule, Stylesheet};
pub use transform::{Rendered, RenderedSection, TransformedBill, Transformer};
