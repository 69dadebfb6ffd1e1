// Text normalisation for Arabic body text
//
// This module produces the two renderings stored for every page: a cleaned
// plain-text string that preserves diacritics, and an HTML rendering that
// maps Shamela's typographic separators to block-level markup.

pub mod cleaner;
pub mod html;

pub use cleaner::{clean_text, is_arabic_diacritic};
pub use html::{render_html, COMPOUND_SEPARATOR};
