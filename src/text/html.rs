//! HTML rendering of cleaned page text.
//!
//! Shamela text marks section breaks with typographic separators instead of
//! markup: a run of equals signs, a run of underscores, a run of tatweel
//! (U+0640) characters, or the compound footnote rule `¬` followed by
//! underscores. Rendering maps those to centered paragraph blocks and
//! everything else to plain `<p>` paragraphs with `<br>` line joins.
//!
//! The formatter is idempotent over its own output's plain text: separators
//! that already sit on their own lines between blank lines render to the
//! same bytes on a second pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical form of the compound footnote rule: `¬` plus ten underscores.
pub const COMPOUND_SEPARATOR: &str = "¬__________";

const CENTERED_OPEN: &str = "<p style=\"text-align: center; margin: 10px 0;\">";

static RE_COMPOUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"¬\s*_+").unwrap());
static RE_EQUALS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"={3,}").unwrap());
static RE_TATWEEL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\u{0640}{3,}").unwrap());
static RE_UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{3,}").unwrap());

static RE_EQUALS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^={3,}$").unwrap());
static RE_TATWEEL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\u{0640}{3,}$").unwrap());
static RE_UNDERSCORE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_{3,}$").unwrap());
static RE_COMPOUND_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^¬_+$").unwrap());

/// Whether a trimmed line is a structural separator.
fn is_separator_line(line: &str) -> bool {
    RE_EQUALS_LINE.is_match(line)
        || RE_UNDERSCORE_LINE.is_match(line)
        || RE_TATWEEL_LINE.is_match(line)
        || RE_COMPOUND_LINE.is_match(line)
}

/// Puts every structural separator on its own line.
///
/// The compound rule is canonicalised first (covering both the inline
/// `¬____` form and the two-line `¬`-then-underscores form), so the
/// generic underscore rule can skip runs that belong to a compound.
fn inject_separator_breaks(text: &str) -> String {
    let text = RE_COMPOUND.replace_all(text, format!("\n{}\n", COMPOUND_SEPARATOR).as_str());
    let text = RE_EQUALS_RUN.replace_all(&text, "\n${0}\n");
    let text = RE_TATWEEL_RUN.replace_all(&text, "\n${0}\n");

    // Underscore runs directly after ¬ are the compound's tail; leave them.
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for found in RE_UNDERSCORE_RUN.find_iter(&text) {
        if text[..found.start()].chars().next_back() == Some('¬') {
            continue;
        }
        out.push_str(&text[last..found.start()]);
        out.push('\n');
        out.push_str(found.as_str());
        out.push('\n');
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Renders cleaned text as paragraph-level HTML.
///
/// Non-empty, non-separator lines accumulate into a paragraph; a blank
/// line flushes the paragraph as `<p>…</p>` with `<br>` joins; a separator
/// line flushes and then emits a centered block. Blocks are joined with
/// `\n`. Never fails; empty input yields the empty string.
pub fn render_html(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let prepared = inject_separator_breaks(text);
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for line in prepared.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_paragraph(&mut blocks, &mut paragraph);
        } else if is_separator_line(trimmed) {
            flush_paragraph(&mut blocks, &mut paragraph);
            blocks.push(format!("{}{}</p>", CENTERED_OPEN, trimmed));
        } else {
            paragraph.push(htmlescape::encode_minimal(trimmed));
        }
    }
    flush_paragraph(&mut blocks, &mut paragraph);

    blocks.join("\n")
}

fn flush_paragraph(blocks: &mut Vec<String>, paragraph: &mut Vec<String>) {
    if !paragraph.is_empty() {
        blocks.push(format!("<p>{}</p>", paragraph.join("<br>")));
        paragraph.clear();
    }
}
