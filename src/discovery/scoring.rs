//! Scoring heuristic for classifying source tables.
//!
//! Shamela files usually follow the `Main` / `b<digits>` / `t<digits>`
//! naming convention, but enough books in the wild rename their tables
//! that discovery cannot rely on names alone. The heuristic is expressed
//! as data (needle lists and weight constants) so it can be tuned and
//! tested without touching the classification code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::readers::SourceRow;

/// Column-name needles marking a body-text column.
pub const TEXT_NEEDLES: &[&str] = &["nass", "text", "content", "matn", "متن", "نص"];

/// Column-name needles marking a printed-page-number column.
pub const PAGE_NEEDLES: &[&str] = &["page", "sahefa", "safha", "صفحة", "صحيفة"];

/// Column-name needles marking an identifier column.
pub const ID_NEEDLES: &[&str] = &["id", "معرف", "رقم"];

/// Column-name needles marking a volume/part column.
pub const PART_NEEDLES: &[&str] = &["part", "juz", "جزء"];

/// Column-name needles marking a chapter-heading column.
pub const TITLE_NEEDLES: &[&str] = &["tit", "عنوان"];

/// Column-name needles marking a heading-depth column.
pub const LEVEL_NEEDLES: &[&str] = &["lvl", "level", "مستوى"];

/// Table-name needles marking a table of contents.
const TOC_NAME_NEEDLES: &[&str] = &["toc", "index", "fhrs", "فهرس"];

const TEXT_COLUMN_WEIGHT: i32 = 30;
const PAGE_COLUMN_WEIGHT: i32 = 20;
const ID_COLUMN_WEIGHT: i32 = 10;
const TITLE_COLUMN_WEIGHT: i32 = 30;
const LEVEL_COLUMN_WEIGHT: i32 = 20;
const TOC_NAME_WEIGHT: i32 = 25;
const LONG_SAMPLE_WEIGHT: i32 = 15;
const LONG_SAMPLE_MIN_CHARS: usize = 100;

/// Fixed bonus for a traditional `b<digits>` content-table name.
pub const CONTENT_NAME_BONUS: i32 = 100;

/// Fixed bonus for a traditional `t<digits>` index-table name.
pub const INDEX_NAME_BONUS: i32 = 50;

/// Tables with fewer rows than this never enter the scoring pass.
pub const MIN_SCORED_ROWS: u64 = 10;

/// Minimum index score: an id column alone does not make a table of
/// contents.
pub const INDEX_MIN_SCORE: i32 = 25;

/// Row-count thresholds and the weight each one earns.
const ROW_COUNT_TIERS: &[(u64, i32)] = &[(1000, 25), (500, 15), (100, 10), (50, 5)];

static RE_CONTENT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^b\d+$").unwrap());
static RE_INDEX_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^t\d+$").unwrap());

/// Whether a table name follows the traditional `b<digits>` convention.
pub fn is_content_name(name: &str) -> bool {
    RE_CONTENT_NAME.is_match(&name.to_lowercase())
}

/// Whether a table name follows the traditional `t<digits>` convention.
pub fn is_index_name(name: &str) -> bool {
    RE_INDEX_NAME.is_match(&name.to_lowercase())
}

/// Whether any column name contains one of the needles (case-insensitive).
pub fn has_column(columns: &[String], needles: &[&str]) -> bool {
    columns.iter().any(|column| {
        let lower = column.to_lowercase();
        needles.iter().any(|needle| lower.contains(needle))
    })
}

/// Scores a table as a content-table candidate.
pub fn score_content_table(
    name: &str,
    columns: &[String],
    row_count: u64,
    sample: Option<&SourceRow>,
) -> i32 {
    let mut score = 0;
    if has_column(columns, TEXT_NEEDLES) {
        score += TEXT_COLUMN_WEIGHT;
    }
    if has_column(columns, PAGE_NEEDLES) {
        score += PAGE_COLUMN_WEIGHT;
    }
    if has_column(columns, ID_NEEDLES) {
        score += ID_COLUMN_WEIGHT;
    }
    for &(threshold, weight) in ROW_COUNT_TIERS {
        if row_count > threshold {
            score += weight;
            break;
        }
    }
    if sample.is_some_and(has_long_string) {
        score += LONG_SAMPLE_WEIGHT;
    }
    if is_content_name(name) {
        score += CONTENT_NAME_BONUS;
    } else if is_index_name(name) {
        score += INDEX_NAME_BONUS;
    }
    score
}

/// Scores a table as an index-table candidate.
///
/// Traditional `t<digits>` names dominate; otherwise a table qualifies by
/// carrying a heading column or a TOC-like name.
pub fn score_index_table(name: &str, columns: &[String]) -> i32 {
    let mut score = 0;
    if is_index_name(name) {
        score += INDEX_NAME_BONUS;
    }
    let lower = name.to_lowercase();
    if TOC_NAME_NEEDLES.iter().any(|needle| lower.contains(needle)) {
        score += TOC_NAME_WEIGHT;
    }
    if has_column(columns, TITLE_NEEDLES) {
        score += TITLE_COLUMN_WEIGHT;
    }
    if has_column(columns, LEVEL_NEEDLES) {
        score += LEVEL_COLUMN_WEIGHT;
    }
    if has_column(columns, ID_NEEDLES) {
        score += ID_COLUMN_WEIGHT;
    }
    score
}

fn has_long_string(row: &SourceRow) -> bool {
    row.columns().any(|column| {
        matches!(
            row.get(column),
            Some(Value::String(s)) if s.chars().count() > LONG_SAMPLE_MIN_CHARS
        )
    })
}
