//! Column resolution inside classified tables.
//!
//! Once a table's role is known, the essential columns are located by the
//! same needle lists the scoring pass uses. Resolution happens once per
//! table; extraction then reads rows through the resolved names instead of
//! probing at every call site.

use super::scoring::{
    ID_NEEDLES, LEVEL_NEEDLES, PAGE_NEEDLES, PART_NEEDLES, TEXT_NEEDLES, TITLE_NEEDLES,
};

/// Resolved column names of a content (body text) table.
#[derive(Debug, Clone, Default)]
pub struct ContentColumns {
    /// Origin-file primary key; drives chapter interval linkage
    pub id: Option<String>,
    /// Body text
    pub text: Option<String>,
    /// Printed page number; absent defaults to 1
    pub page: Option<String>,
    /// Volume/part number; absent means a single-volume book
    pub part: Option<String>,
}

/// Resolved column names of an index (table of contents) table.
#[derive(Debug, Clone, Default)]
pub struct IndexColumns {
    /// Content-row id where the chapter begins
    pub id: Option<String>,
    /// Heading text
    pub title: Option<String>,
    /// Heading depth, 1 = top
    pub level: Option<String>,
}

/// First column whose lowercase name contains one of the needles.
fn find_containing(columns: &[String], needles: &[&str]) -> Option<String> {
    columns
        .iter()
        .find(|column| {
            let lower = column.to_lowercase();
            needles.iter().any(|needle| lower.contains(needle))
        })
        .cloned()
}

/// First column whose lowercase name equals or ends with one of the
/// needles, falling back to the table's first column.
fn find_id_column(columns: &[String]) -> Option<String> {
    columns
        .iter()
        .find(|column| {
            let lower = column.to_lowercase();
            ID_NEEDLES
                .iter()
                .any(|needle| lower == *needle || lower.ends_with(needle))
        })
        .or_else(|| columns.first())
        .cloned()
}

/// Locates the essential columns of a content table.
pub fn resolve_content_columns(columns: &[String]) -> ContentColumns {
    ContentColumns {
        id: find_id_column(columns),
        text: find_containing(columns, TEXT_NEEDLES),
        page: find_containing(columns, PAGE_NEEDLES),
        part: find_containing(columns, PART_NEEDLES),
    }
}

/// Locates the essential columns of an index table.
pub fn resolve_index_columns(columns: &[String]) -> IndexColumns {
    IndexColumns {
        id: find_id_column(columns),
        title: find_containing(columns, TITLE_NEEDLES),
        level: find_containing(columns, LEVEL_NEEDLES),
    }
}
