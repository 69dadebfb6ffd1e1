//! Destination loader: one book, one transaction.
//!
//! The loader owns the single destination connection and commits one
//! book's worth of rows atomically: authors and publishers are
//! deduplicated by name, the book row is inserted with a unique slug,
//! volumes are created per distinct part number, chapters carry their
//! source-id intervals, and pages receive a dense 1..N numbering with
//! chapter linkage by interval containment. A post-pass rewrites chapter
//! bounds to the dense numbering and stores the final page count; commit
//! is the last statement. Any failure rolls the whole file back.
//!
//! The only recoverable failure is a duplicate `internal_index` on a page
//! insert, which is logged and skipped so a file sharing ids with an
//! earlier ingest still commits its remaining pages.

pub mod chapters;
pub mod config;
pub mod schema_guard;
pub mod slug;

pub use config::DestinationConfig;

use std::collections::BTreeMap;

use chrono::Utc;
use log::{info, warn};
use mysql::prelude::Queryable;
use mysql::{Conn, Transaction, TxOpts};
use once_cell::sync::OnceCell;

use crate::model::{BookData, ContentRow};
use crate::progress::{ProgressLevel, ProgressSink};
use crate::{Result, ShamelaError};
use chapters::{chapter_spans, span_parts, ChapterAssigner};
use schema_guard::{column_exists, ensure_destination_schema};
use slug::{slug_base, slug_candidate};

/// Name stored when the source has no author.
pub const DEFAULT_AUTHOR: &str = "مؤلف غير معروف";

/// Name stored when the source has no publisher.
pub const DEFAULT_PUBLISHER: &str = "ناشر غير معروف";

/// MySQL ER_DUP_ENTRY.
const ER_DUP_ENTRY: u16 = 1062;

const ARABIC_ORDINALS: [&str; 10] = [
    "الأول", "الثاني", "الثالث", "الرابع", "الخامس",
    "السادس", "السابع", "الثامن", "التاسع", "العاشر",
];

/// The schema guard runs once per process; later connects reuse the result.
static SCHEMA_GUARD_DONE: OnceCell<()> = OnceCell::new();

/// Volume title for a part number: the fixed ordinal phrases for 1..10,
/// a numeric form beyond that.
pub fn volume_title(part: i64) -> String {
    match part {
        1..=10 => format!("المجلد {}", ARABIC_ORDINALS[(part - 1) as usize]),
        _ => format!("المجلد الـ{}", part),
    }
}

fn is_duplicate_entry(error: &mysql::Error) -> bool {
    matches!(error, mysql::Error::MySqlError(e) if e.code == ER_DUP_ENTRY)
}

/// Row counts of one committed book.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadSummary {
    pub volumes: u32,
    pub chapters: u32,
    pub pages: u32,
}

/// Destination connection plus the schema facts the loader adapts to.
pub struct MySqlLoader {
    conn: Conn,
    has_content_html: bool,
}

impl MySqlLoader {
    /// Connects to the destination and prepares it for loading.
    ///
    /// # Errors
    ///
    /// [`ShamelaError::DestinationUnavailable`] when the server cannot be
    /// reached or refuses the credentials;
    /// [`ShamelaError::SchemaMigration`] when the one-time schema repair
    /// fails. Both are fatal for a whole batch.
    pub fn connect(config: &DestinationConfig) -> Result<Self> {
        let mut conn = Conn::new(config.to_opts()).map_err(|source| {
            ShamelaError::DestinationUnavailable {
                source,
                backtrace: snafu::Backtrace::capture(),
            }
        })?;
        info!("connected to destination {}:{}/{}", config.host, config.port, config.database);

        if SCHEMA_GUARD_DONE.get().is_none() {
            ensure_destination_schema(&mut conn)?;
            let _ = SCHEMA_GUARD_DONE.set(());
        }

        let has_content_html = column_exists(&mut conn, "pages", "content_html")?;
        Ok(Self { conn, has_content_html })
    }

    /// Writes one extracted book inside a single transaction.
    pub fn load_book(&mut self, book: &BookData, sink: &dyn ProgressSink) -> Result<LoadSummary> {
        let has_content_html = self.has_content_html;
        let mut tx = self.conn.start_transaction(TxOpts::default())?;

        let author_id = upsert_by_name(&mut tx, "authors", "full_name", &book.info.author, DEFAULT_AUTHOR)?;
        let publisher_id = upsert_by_name(&mut tx, "publishers", "name", &book.info.publisher, DEFAULT_PUBLISHER)?;
        let book_id = insert_book(&mut tx, book, author_id, publisher_id)?;

        // Content in ascending id order drives both the page numbering and
        // the linear chapter matcher.
        let mut content: Vec<&ContentRow> = book.content.iter().collect();
        content.sort_by_key(|row| row.id);

        let volume_ids = insert_volumes(&mut tx, book_id, &content)?;

        let max_content_id = content.last().map(|row| row.id).unwrap_or(0);
        let spans = chapter_spans(&book.index, max_content_id);
        let parts_of_spans = span_parts(&spans, &content);
        let mut chapter_ids = Vec::with_capacity(spans.len());
        for (span, part) in spans.iter().zip(&parts_of_spans) {
            let volume_id = volume_ids
                .get(part)
                .or_else(|| volume_ids.get(&1))
                .or_else(|| volume_ids.values().next())
                .copied()
                .ok_or_else(|| ShamelaError::general_error("book has no volumes"))?;
            tx.exec_drop(
                "INSERT INTO chapters \
                 (book_id, volume_id, title, level, page_start, page_end, `order`, \
                  internal_index_start, internal_index_end, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())",
                (
                    book_id,
                    volume_id,
                    &span.title,
                    span.level,
                    span.start_id,
                    span.end_id,
                    span.start_id,
                    span.start_id,
                    span.end_id,
                ),
            )?;
            chapter_ids.push(last_insert_id(&tx)?);
        }

        let pages = insert_pages(&mut tx, book_id, &content, &spans, &chapter_ids, has_content_html, sink)?;

        sink.emit(ProgressLevel::Progress, "refreshing chapter page ranges");
        refresh_chapter_ranges(&mut tx, &chapter_ids)?;

        tx.exec_drop("UPDATE books SET page_count = ? WHERE id = ?", (pages, book_id))?;
        tx.commit()?;

        Ok(LoadSummary {
            volumes: volume_ids.len() as u32,
            chapters: chapter_ids.len() as u32,
            pages,
        })
    }
}

fn last_insert_id(tx: &Transaction) -> Result<u64> {
    tx.last_insert_id()
        .ok_or_else(|| ShamelaError::general_error("destination returned no insert id"))
}

/// Reuses a row by exact name match or inserts a new one. Empty names get
/// the domain placeholder.
fn upsert_by_name(
    tx: &mut Transaction,
    table: &str,
    column: &str,
    name: &str,
    placeholder: &str,
) -> Result<u64> {
    let name = name.trim();
    let name = if name.is_empty() { placeholder } else { name };

    let existing: Option<u64> = tx.exec_first(
        format!("SELECT id FROM {} WHERE {} = ?", table, column),
        (name,),
    )?;
    if let Some(id) = existing {
        return Ok(id);
    }
    tx.exec_drop(
        format!("INSERT INTO {} ({}, created_at, updated_at) VALUES (?, NOW(), NOW())", table, column),
        (name,),
    )?;
    last_insert_id(tx)
}

fn insert_book(tx: &mut Transaction, book: &BookData, author_id: u64, publisher_id: u64) -> Result<u64> {
    let base = slug_base(&book.info.title, Utc::now().timestamp());
    let mut attempt = 0u32;
    let slug = loop {
        let candidate = slug_candidate(&base, attempt);
        let taken: Option<u64> =
            tx.exec_first("SELECT id FROM books WHERE slug = ?", (&candidate,))?;
        if taken.is_none() {
            break candidate;
        }
        attempt += 1;
    };

    tx.exec_drop(
        "INSERT INTO books \
         (title, slug, description, shamela_id, status, page_count, author_id, publisher_id, \
          created_at, updated_at) \
         VALUES (?, ?, ?, ?, 'published', 0, ?, ?, NOW(), NOW())",
        (
            &book.info.title,
            &slug,
            &book.info.description,
            &book.info.shamela_id,
            author_id,
            publisher_id,
        ),
    )?;
    last_insert_id(tx)
}

/// One volume per distinct part number; NULL parts bucket to 1. An
/// already-existing `(book_id, number)` row is re-read instead of failing.
fn insert_volumes(
    tx: &mut Transaction,
    book_id: u64,
    content: &[&ContentRow],
) -> Result<BTreeMap<i64, u64>> {
    let mut parts: Vec<i64> = content.iter().map(|row| row.part.unwrap_or(1)).collect();
    parts.sort_unstable();
    parts.dedup();
    if parts.is_empty() {
        parts.push(1);
    }

    let mut volume_ids = BTreeMap::new();
    for part in parts {
        let insert = tx.exec_drop(
            "INSERT INTO volumes (book_id, number, title, created_at, updated_at) \
             VALUES (?, ?, ?, NOW(), NOW())",
            (book_id, part, volume_title(part)),
        );
        let id = match insert {
            Ok(()) => last_insert_id(tx)?,
            Err(e) if is_duplicate_entry(&e) => tx
                .exec_first(
                    "SELECT id FROM volumes WHERE book_id = ? AND number = ?",
                    (book_id, part),
                )?
                .ok_or_else(|| ShamelaError::general_error("duplicate volume vanished"))?,
            Err(e) => return Err(e.into()),
        };
        volume_ids.insert(part, id);
    }
    Ok(volume_ids)
}

/// Inserts pages with dense numbering. Duplicate `internal_index` rows are
/// skipped with a warning and do not advance the numbering.
fn insert_pages(
    tx: &mut Transaction,
    book_id: u64,
    content: &[&ContentRow],
    spans: &[chapters::ChapterSpan],
    chapter_ids: &[u64],
    has_content_html: bool,
    sink: &dyn ProgressSink,
) -> Result<u32> {
    let mut assigner = ChapterAssigner::new(spans);
    let mut inserted = 0u32;

    for row in content {
        let chapter_id = assigner.assign(row.id).map(|k| chapter_ids[k]);
        let page_number = inserted as i64 + 1;
        let internal_index = row.id.to_string();

        let outcome = if has_content_html {
            tx.exec_drop(
                "INSERT INTO pages \
                 (book_id, chapter_id, page_number, internal_index, content, content_html, part, \
                  created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())",
                (book_id, chapter_id, page_number, &internal_index, &row.text, &row.html, row.part),
            )
        } else {
            tx.exec_drop(
                "INSERT INTO pages \
                 (book_id, chapter_id, page_number, internal_index, content, part, \
                  created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())",
                (book_id, chapter_id, page_number, &internal_index, &row.text, row.part),
            )
        };

        match outcome {
            Ok(()) => inserted += 1,
            Err(e) if is_duplicate_entry(&e) => {
                warn!("skipping page with duplicate internal_index {}", internal_index);
                sink.emit(
                    ProgressLevel::Warning,
                    &format!("duplicate internal_index {}, page skipped", internal_index),
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(inserted)
}

/// Rewrites chapter bounds from source ids to the dense page numbering.
/// Chapters that ended up with no pages keep their interval ids.
fn refresh_chapter_ranges(tx: &mut Transaction, chapter_ids: &[u64]) -> Result<()> {
    for &chapter_id in chapter_ids {
        let bounds: Option<(Option<i64>, Option<i64>)> = tx.exec_first(
            "SELECT MIN(page_number), MAX(page_number) FROM pages WHERE chapter_id = ?",
            (chapter_id,),
        )?;
        if let Some((Some(first), Some(last))) = bounds {
            tx.exec_drop(
                "UPDATE chapters SET page_start = ?, page_end = ? WHERE id = ?",
                (first, last, chapter_id),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_titles_use_fixed_ordinals() {
        assert_eq!(volume_title(1), "المجلد الأول");
        assert_eq!(volume_title(2), "المجلد الثاني");
        assert_eq!(volume_title(10), "المجلد العاشر");
    }

    #[test]
    fn test_volume_titles_beyond_ten_are_numeric() {
        assert_eq!(volume_title(11), "المجلد الـ11");
        assert_eq!(volume_title(30), "المجلد الـ30");
    }
}
