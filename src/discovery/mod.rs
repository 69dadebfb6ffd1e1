//! Table discovery for source book files.
//!
//! Every Shamela file carries one bibliographic table, one body-text table,
//! and usually one table of contents, but the names vary: most books follow
//! the `Main` / `b<digits>` / `t<digits>` convention, while repackaged ones
//! rename tables freely. Discovery first tries the convention, then falls
//! back to the scoring heuristic in [`scoring`], and as a last resort takes
//! the largest table as the body with a warning.
//!
//! # Examples
//!
//! ```no_run
//! use shamela::discovery::discover;
//! use shamela::progress::NullSink;
//! use shamela::readers::BokReader;
//! use std::path::Path;
//!
//! # fn main() -> shamela::Result<()> {
//! let mut reader = BokReader::open(Path::new("/books/tafsir.bok"))?;
//! let schema = discover(&mut reader, &NullSink)?;
//! println!("content lives in {}", schema.content_table);
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod scoring;

pub use columns::{resolve_content_columns, resolve_index_columns, ContentColumns, IndexColumns};

use log::{info, warn};

use crate::progress::{ProgressLevel, ProgressSink};
use crate::readers::BokReader;
use crate::{Result, ShamelaError};
use scoring::{
    is_content_name, is_index_name, score_content_table, score_index_table, INDEX_MIN_SCORE,
    MIN_SCORED_ROWS,
};

/// Accepted names (lowercase) of the bibliographic table.
const INFO_TABLE_NAMES: &[&str] = &["main", "book_info", "info"];

/// Role assignment for one source file.
#[derive(Debug, Clone)]
pub struct BookSchema {
    /// Single-row bibliographic table, when present
    pub info_table: Option<String>,
    /// Body text table
    pub content_table: String,
    /// Table of contents, when present
    pub index_table: Option<String>,
}

struct TableStats {
    name: String,
    columns: Vec<String>,
    row_count: u64,
    content_score: Option<i32>,
}

/// Classifies the tables of an open book file.
///
/// # Errors
///
/// Returns [`ShamelaError::NoContentTable`] when no table can plausibly
/// hold the body text.
pub fn discover(reader: &mut BokReader, sink: &dyn ProgressSink) -> Result<BookSchema> {
    let tables = reader.table_names()?;
    let info_table = tables
        .iter()
        .find(|name| INFO_TABLE_NAMES.contains(&name.to_lowercase().as_str()))
        .cloned();
    if info_table.is_none() {
        sink.emit(
            ProgressLevel::Warning,
            "no bibliographic table; using placeholder book info",
        );
    }

    let candidates: Vec<String> = tables
        .into_iter()
        .filter(|name| Some(name) != info_table.as_ref())
        .collect();

    let content_named: Vec<&String> = candidates.iter().filter(|n| is_content_name(n)).collect();
    let index_named: Vec<&String> = candidates.iter().filter(|n| is_index_name(n)).collect();

    // Fast path: an unambiguous traditional layout needs no scoring.
    if content_named.len() == 1 && index_named.len() <= 1 {
        let schema = BookSchema {
            info_table,
            content_table: content_named[0].clone(),
            index_table: index_named.first().map(|name| (*name).clone()),
        };
        info!(
            "traditional layout: content={} index={:?}",
            schema.content_table, schema.index_table
        );
        return Ok(schema);
    }

    let mut stats = Vec::with_capacity(candidates.len());
    for name in &candidates {
        let desc = reader.describe(name)?;
        let content_score = if desc.row_count >= MIN_SCORED_ROWS {
            let sample = reader.sample_row(name)?;
            Some(score_content_table(name, &desc.columns, desc.row_count, sample.as_ref()))
        } else {
            None
        };
        stats.push(TableStats {
            name: name.clone(),
            columns: desc.columns,
            row_count: desc.row_count,
            content_score,
        });
    }

    let content_table = pick_content_table(&stats, sink)
        .ok_or_else(|| ShamelaError::no_content_table(reader.path().display().to_string()))?;
    let index_table = pick_index_table(&stats, &content_table);

    sink.emit(
        ProgressLevel::Info,
        &format!("content table: {}, index table: {:?}", content_table, index_table),
    );
    Ok(BookSchema { info_table, content_table, index_table })
}

fn pick_content_table(stats: &[TableStats], sink: &dyn ProgressSink) -> Option<String> {
    let best = stats
        .iter()
        .filter_map(|t| t.content_score.map(|score| (t, score)))
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score);
    if let Some((table, score)) = best {
        info!("scored {} as content table ({})", table.name, score);
        return Some(table.name.clone());
    }

    // Nothing scored; the largest table is the only remaining guess.
    let largest = stats.iter().max_by_key(|t| t.row_count)?;
    warn!(
        "no table scored as content; falling back to largest table {} ({} rows)",
        largest.name, largest.row_count
    );
    sink.emit(
        ProgressLevel::Warning,
        &format!("falling back to largest table {} as content", largest.name),
    );
    Some(largest.name.clone())
}

fn pick_index_table(stats: &[TableStats], content_table: &str) -> Option<String> {
    let others: Vec<&TableStats> = stats.iter().filter(|t| t.name != content_table).collect();

    let traditional = others
        .iter()
        .filter(|t| is_index_name(&t.name))
        .max_by_key(|t| score_index_table(&t.name, &t.columns));
    if let Some(table) = traditional {
        return Some(table.name.clone());
    }

    others
        .iter()
        .map(|t| (t, score_index_table(&t.name, &t.columns)))
        .filter(|(_, score)| *score >= INDEX_MIN_SCORE)
        .max_by_key(|(_, score)| *score)
        .map(|(t, _)| t.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use crate::readers::testing::MemoryDriver;
    use crate::readers::BokReader;
    use serde_json::{json, Value};
    use std::path::Path;

    fn content_rows(n: usize, text_col: &str) -> Vec<Vec<(String, Value)>> {
        (1..=n)
            .map(|i| {
                vec![
                    ("id".to_string(), json!(i)),
                    (text_col.to_string(), json!("نص ".repeat(60))),
                ]
            })
            .collect()
    }

    fn reader_with(driver: MemoryDriver) -> BokReader {
        BokReader::from_driver(Path::new("book.bok"), Box::new(driver))
    }

    #[test]
    fn test_traditional_layout() {
        // E1: Main / b12345 / t12345
        let mut driver = MemoryDriver::new();
        driver.add_table("Main", vec![vec![("Bk".to_string(), json!("كتاب الاختبار"))]]);
        driver.add_table("b12345", content_rows(3, "nass"));
        driver.add_table("t12345", vec![vec![
            ("id".to_string(), json!(1)),
            ("tit".to_string(), json!("المقدمة")),
        ]]);
        let schema = discover(&mut reader_with(driver), &NullSink).unwrap();
        assert_eq!(schema.info_table.as_deref(), Some("Main"));
        assert_eq!(schema.content_table, "b12345");
        assert_eq!(schema.index_table.as_deref(), Some("t12345"));
    }

    #[test]
    fn test_missing_index_table() {
        // E2: same file without t12345
        let mut driver = MemoryDriver::new();
        driver.add_table("Main", vec![vec![("Bk".to_string(), json!("كتاب"))]]);
        driver.add_table("b12345", content_rows(3, "nass"));
        let schema = discover(&mut reader_with(driver), &NullSink).unwrap();
        assert_eq!(schema.content_table, "b12345");
        assert_eq!(schema.index_table, None);
    }

    #[test]
    fn test_noisy_names_resolved_by_scoring() {
        // E3: DataTab (100 rows, matn column with long strings) and Toc
        let mut driver = MemoryDriver::new();
        let mut rows = Vec::new();
        for i in 1..=100 {
            rows.push(vec![
                ("rowid".to_string(), json!(i)),
                ("matn".to_string(), json!("كلام طويل جدا ".repeat(20))),
            ]);
        }
        driver.add_table("DataTab", rows);
        let toc: Vec<_> = (1..=10)
            .map(|i| {
                vec![
                    ("id".to_string(), json!(i * 7)),
                    ("tit".to_string(), json!(format!("باب {}", i))),
                ]
            })
            .collect();
        driver.add_table("Toc", toc);
        let schema = discover(&mut reader_with(driver), &NullSink).unwrap();
        assert_eq!(schema.info_table, None);
        assert_eq!(schema.content_table, "DataTab");
        assert_eq!(schema.index_table.as_deref(), Some("Toc"));
    }

    #[test]
    fn test_zero_scores_fall_back_to_largest_table() {
        let mut driver = MemoryDriver::new();
        let rows: Vec<_> = (1..=20)
            .map(|i| vec![("c1".to_string(), json!(i)), ("c2".to_string(), json!("x"))])
            .collect();
        driver.add_table("alpha", rows);
        driver.add_table("beta", vec![vec![("c1".to_string(), json!(1))]]);
        let schema = discover(&mut reader_with(driver), &NullSink).unwrap();
        assert_eq!(schema.content_table, "alpha");
        assert_eq!(schema.index_table, None);
    }

    #[test]
    fn test_empty_file_has_no_content_table() {
        let driver = MemoryDriver::new();
        let err = discover(&mut reader_with(driver), &NullSink).unwrap_err();
        assert!(err.is_no_content_table());
    }
}
