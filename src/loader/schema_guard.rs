//! Runtime destination-schema repair.
//!
//! The destination schema has drifted over the years: early deployments
//! enforced uniqueness on `pages.page_number`, lacked the
//! `pages.internal_index` key, and had no chapter interval columns. The
//! guard runs once per process, before the first write, and brings any of
//! those deployments up to what the loader expects. Every step is
//! conditional on information_schema, so repeated runs are no-ops.
//!
//! Base tables are never created here; a destination without the library
//! tables is a provisioning error, not drift.

use log::info;
use mysql::Conn;
use mysql::prelude::Queryable;

use crate::{Result, ShamelaError};

/// Whether `table` carries a column named `column` in the current schema.
pub(crate) fn column_exists(conn: &mut Conn, table: &str, column: &str) -> Result<bool> {
    let count: Option<u64> = conn.exec_first(
        "SELECT COUNT(*) FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?",
        (table, column),
    )?;
    Ok(count.unwrap_or(0) > 0)
}

/// UNIQUE constraints on `pages.page_number` whose name marks them as the
/// obsolete uniqueness rule.
fn stale_page_number_uniques(conn: &mut Conn) -> Result<Vec<String>> {
    Ok(conn.exec(
        "SELECT DISTINCT tc.CONSTRAINT_NAME \
         FROM information_schema.TABLE_CONSTRAINTS tc \
         JOIN information_schema.KEY_COLUMN_USAGE kcu \
           ON kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
          AND kcu.TABLE_NAME = tc.TABLE_NAME \
          AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
         WHERE tc.TABLE_SCHEMA = DATABASE() \
           AND tc.TABLE_NAME = 'pages' \
           AND tc.CONSTRAINT_TYPE = 'UNIQUE' \
           AND kcu.COLUMN_NAME = 'page_number' \
           AND LOWER(tc.CONSTRAINT_NAME) LIKE '%unique%'",
        (),
    )?)
}

/// Brings the destination schema up to what the loader writes.
///
/// # Errors
///
/// Any failure is wrapped as [`ShamelaError::SchemaMigration`]; the caller
/// treats that as fatal for the whole batch.
pub(crate) fn ensure_destination_schema(conn: &mut Conn) -> Result<()> {
    repair(conn).map_err(|e| {
        ShamelaError::schema_migration(format!("destination schema repair failed: {}", e))
    })
}

fn repair(conn: &mut Conn) -> Result<()> {
    for constraint in stale_page_number_uniques(conn)? {
        info!("dropping obsolete unique constraint {} on pages.page_number", constraint);
        conn.query_drop(format!("ALTER TABLE pages DROP INDEX `{}`", constraint))?;
    }

    if !column_exists(conn, "pages", "internal_index")? {
        info!("adding pages.internal_index as the primary key");
        conn.query_drop(
            "ALTER TABLE pages \
             ADD COLUMN internal_index INT NOT NULL AUTO_INCREMENT FIRST, \
             ADD PRIMARY KEY (internal_index)",
        )?;
    }

    for column in ["internal_index_start", "internal_index_end"] {
        if !column_exists(conn, "chapters", column)? {
            info!("adding chapters.{}", column);
            conn.query_drop(format!("ALTER TABLE chapters ADD COLUMN {} INT NULL", column))?;
        }
    }

    Ok(())
}
