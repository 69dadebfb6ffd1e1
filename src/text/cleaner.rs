//! Text cleaning that preserves Arabic diacritics.
//!
//! Shamela cells carry stray control characters, Windows line endings, and
//! decorative junk from decades of re-exports. Cleaning strips all of that
//! while keeping every Arabic combining mark intact: fatha, damma, kasra,
//! sukun, shadda, tanwin and the Quranic annotation marks all sit in
//! U+064B–065F, U+0670 and U+06D6–06ED, and a naive "remove non-printable"
//! pass eats them.
//!
//! Rules run in a fixed order: line-ending normalisation, control strip,
//! whitespace collapse, character-class retention, trim. Cleaning never
//! fails; empty input yields the empty string.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Whether `c` is an Arabic combining mark that must survive cleaning.
pub fn is_arabic_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

/// Control characters stripped by rule 1. Tab, LF and CR survive; CR is
/// folded into LF beforehand.
fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{0008}'
            | '\u{000B}'..='\u{000C}'
            | '\u{000E}'..='\u{001F}'
            | '\u{007F}'..='\u{009F}'
    )
}

/// Characters kept by the retention pass: the Arabic blocks, ASCII digits,
/// whitespace, common punctuation, and the structural separators.
fn is_retained(c: char) -> bool {
    c.is_ascii_digit()
        || c.is_whitespace()
        || matches!(
            c,
            '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{08A0}'..='\u{08FF}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}'
        )
        || ".,;:!?()[]{}\"'-".contains(c)
        || matches!(c, '=' | '«' | '»' | '¬' | '_')
}

/// Cleans one cell of source text.
///
/// The result keeps every Arabic code point (diacritics included) in its
/// original order and drops everything outside the retained classes.
pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let stripped: String = unified.chars().filter(|c| !is_stripped_control(*c)).collect();

    let collapsed = RE_SPACE_RUNS.replace_all(&stripped, " ");
    let collapsed = RE_BLANK_RUNS.replace_all(&collapsed, "\n\n");

    let retained: String = collapsed.chars().filter(|c| is_retained(*c)).collect();
    retained.trim().to_string()
}
