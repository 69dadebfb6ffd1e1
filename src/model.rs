//! Source entities extracted from one book file.
//!
//! These structs are the bridge between the duck-typed source rows and the
//! loader: bibliographic data, body rows keyed by the origin-file id, and
//! table-of-contents rows. They live only for the duration of one file's
//! ingest.

use log::warn;

use crate::discovery::{ContentColumns, IndexColumns};
use crate::readers::SourceRow;

/// Placeholder title for files with no usable bibliographic table.
pub const UNTITLED_BOOK: &str = "كتاب بدون عنوان";

/// Bibliographic record of one book.
#[derive(Debug, Clone)]
pub struct BookInfo {
    /// Title (`Bk`)
    pub title: String,
    /// Author display name (`Auth`); empty when unknown
    pub author: String,
    /// Publisher display name (`Publisher`); empty when unknown
    pub publisher: String,
    /// Identifier in the origin library (`BkId`)
    pub shamela_id: String,
    /// Long description (`Betaka`)
    pub description: String,
    /// Publication year (`Year`), kept for diagnostics
    pub year: Option<i64>,
}

impl BookInfo {
    /// Info used when the file carries no bibliographic table.
    pub fn placeholder() -> Self {
        Self {
            title: UNTITLED_BOOK.to_string(),
            author: String::new(),
            publisher: String::new(),
            shamela_id: String::new(),
            description: String::new(),
            year: None,
        }
    }

    /// Reads the conventional `Main` columns; any may be absent.
    pub fn from_row(row: &SourceRow) -> Self {
        Self {
            title: row
                .get_string("Bk")
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED_BOOK.to_string()),
            author: row.get_string("Auth").unwrap_or_default(),
            publisher: row.get_string("Publisher").unwrap_or_default(),
            shamela_id: row.get_string("BkId").unwrap_or_default(),
            description: row.get_string("Betaka").unwrap_or_default(),
            year: row.get_i64("Year"),
        }
    }
}

/// One body record, usually one printed page.
#[derive(Debug, Clone)]
pub struct ContentRow {
    /// Origin-file primary key. Drives chapter interval linkage; this is
    /// NOT the printed page number.
    pub id: i64,
    /// Printed page number
    pub page: i64,
    /// Volume/part number; `None` buckets to volume 1
    pub part: Option<i64>,
    /// Cleaned plain text
    pub text: String,
    /// HTML rendering of `text`
    pub html: String,
}

impl ContentRow {
    /// Extracts one body row through resolved columns.
    ///
    /// Returns `None` when the row has no usable id; such rows cannot be
    /// linked to chapters and are skipped upstream.
    pub fn from_row(row: &SourceRow, columns: &ContentColumns) -> Option<Self> {
        let id_column = columns.id.as_deref()?;
        let Some(id) = row.get_i64(id_column) else {
            warn!("skipping content row with unusable id column {}", id_column);
            return None;
        };
        Some(Self {
            id,
            page: columns
                .page
                .as_deref()
                .and_then(|c| row.get_i64(c))
                .unwrap_or(1),
            part: columns.part.as_deref().and_then(|c| row.get_i64(c)),
            text: columns
                .text
                .as_deref()
                .and_then(|c| row.get_string(c))
                .unwrap_or_default(),
            html: String::new(),
        })
    }
}

/// One table-of-contents entry.
#[derive(Debug, Clone)]
pub struct IndexRow {
    /// Content-row id at which the chapter begins
    pub id: i64,
    /// Heading text
    pub title: String,
    /// Heading depth, 1 = top
    pub level: i64,
}

impl IndexRow {
    /// Extracts one heading through resolved columns.
    pub fn from_row(row: &SourceRow, columns: &IndexColumns) -> Option<Self> {
        let id_column = columns.id.as_deref()?;
        let Some(id) = row.get_i64(id_column) else {
            warn!("skipping index row with unusable id column {}", id_column);
            return None;
        };
        Some(Self {
            id,
            title: columns
                .title
                .as_deref()
                .and_then(|c| row.get_string(c))
                .unwrap_or_default(),
            level: columns
                .level
                .as_deref()
                .and_then(|c| row.get_i64(c))
                .unwrap_or(1),
        })
    }
}

/// Everything extracted from one source file, ready for loading.
#[derive(Debug, Clone)]
pub struct BookData {
    pub info: BookInfo,
    /// Body rows in ascending id order
    pub content: Vec<ContentRow>,
    /// Table-of-contents rows in ascending id order
    pub index: Vec<IndexRow>,
}
