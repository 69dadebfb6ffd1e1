//! Slug generation for book rows.
//!
//! Slugs must stay globally unique across every ingest, including repeated
//! ingests of the same file: the base slug carries the unix epoch, and the
//! loader retries with a counter suffix when even that collides (two
//! ingests of one title within the same second).

use once_cell::sync::Lazy;
use regex::Regex;

/// Slug used when a title cleans down to nothing.
const FALLBACK_SLUG: &str = "book";

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").unwrap());

/// Turns a cleaned title into a slug body.
///
/// Word characters (Arabic letters included; `\w` is Unicode-aware) are
/// kept; whitespace and hyphen runs become single hyphens.
pub fn slugify(title: &str) -> String {
    let stripped = RE_NON_WORD.replace_all(title.trim(), "");
    let joined = RE_SEPARATOR_RUNS.replace_all(&stripped, "-");
    let slug = joined.trim_matches('-').to_lowercase();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Base slug for one ingest: title slug plus the epoch disambiguator.
pub fn slug_base(title: &str, epoch_seconds: i64) -> String {
    format!("{}-{}", slugify(title), epoch_seconds)
}

/// Candidate for the `attempt`-th collision retry (0 = the base itself).
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
