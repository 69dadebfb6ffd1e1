//! High-level reader for one Shamela book file.
//!
//! `BokReader` is the session handle the rest of the pipeline works with:
//! it validates the file signature, owns the table driver, filters out
//! system tables, and offers ordered scans. `.bok` and `.accdb` files open
//! through the same path; the extension is cosmetic.
//!
//! # Examples
//!
//! ```no_run
//! use shamela::readers::BokReader;
//! use std::path::Path;
//!
//! # fn main() -> shamela::Result<()> {
//! let mut reader = BokReader::open(Path::new("/books/tafsir.bok"))?;
//! for table in reader.table_names()? {
//!     let desc = reader.describe(&table)?;
//!     println!("{}: {} rows", table, desc.row_count);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use log::debug;

use crate::Result;
use super::mdb_driver::{MdbToolsDriver, TableDriver};
use super::row::SourceRow;
use super::signature::validate_source_file;

/// Column list and row count of one source table.
#[derive(Debug, Clone)]
pub struct TableDescription {
    /// Column names in declaration order
    pub columns: Vec<String>,
    /// Number of rows
    pub row_count: u64,
}

/// Read-only session over one source book file.
pub struct BokReader {
    path: PathBuf,
    driver: Box<dyn TableDriver>,
}

impl BokReader {
    /// Opens a book file, validating its Jet/ACE signature first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ShamelaError::SourceOpen`] when the path is
    /// missing, the file is too small, or the header is unrecognised.
    pub fn open(path: &Path) -> Result<Self> {
        validate_source_file(path)?;
        let driver = Box::new(MdbToolsDriver::new(path));
        Ok(Self { path: path.to_path_buf(), driver })
    }

    /// Wraps an already-constructed driver, bypassing file validation.
    ///
    /// This is the seam for alternative Jet/ACE connectors and for tests.
    pub fn from_driver(path: &Path, driver: Box<dyn TableDriver>) -> Self {
        Self { path: path.to_path_buf(), driver }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// User table names in file order.
    ///
    /// System catalog tables (`MSys*`) and deleted-object remnants (`~*`)
    /// are excluded.
    pub fn table_names(&mut self) -> Result<Vec<String>> {
        let tables: Vec<String> = self
            .driver
            .table_names()?
            .into_iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                !lower.starts_with("msys") && !name.starts_with('~')
            })
            .collect();
        debug!("{}: {} user tables", self.path.display(), tables.len());
        Ok(tables)
    }

    /// Column names and row count of one table.
    pub fn describe(&mut self, table: &str) -> Result<TableDescription> {
        let columns = self.driver.columns(table)?;
        let row_count = self.driver.row_count(table)?;
        Ok(TableDescription { columns, row_count })
    }

    /// Lazy scan over all rows of a table, in file order.
    pub fn scan(&mut self, table: &str) -> Result<Box<dyn Iterator<Item = Result<SourceRow>>>> {
        self.driver.scan(table)
    }

    /// Reads the first row of a table, if any.
    pub fn sample_row(&mut self, table: &str) -> Result<Option<SourceRow>> {
        self.driver.scan(table)?.next().transpose()
    }

    /// Collects all rows of a table ordered by an integer column.
    ///
    /// When the table does not carry `order_by`, rows keep their insertion
    /// order. Rows where the column is NULL or non-numeric sort last,
    /// keeping their relative order.
    pub fn scan_sorted(&mut self, table: &str, order_by: &str) -> Result<Vec<SourceRow>> {
        let mut rows = Vec::new();
        for row in self.driver.scan(table)? {
            rows.push(row?);
        }
        let has_column = rows.first().is_some_and(|row| row.get(order_by).is_some());
        if has_column {
            rows.sort_by_key(|row| row.get_i64(order_by).unwrap_or(i64::MAX));
        }
        Ok(rows)
    }

    /// Releases the session.
    ///
    /// Dropping the reader has the same effect; this form exists for call
    /// sites that want the release to be visible.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::testing::MemoryDriver;
    use serde_json::json;

    fn reader() -> BokReader {
        let mut driver = MemoryDriver::new();
        driver.add_table(
            "MSysObjects",
            vec![vec![("Id".to_string(), json!(1))]],
        );
        driver.add_table("~TMPCLP", vec![]);
        driver.add_table(
            "b100",
            vec![
                vec![("id".to_string(), json!(3)), ("nass".to_string(), json!("ج"))],
                vec![("id".to_string(), json!(1)), ("nass".to_string(), json!("أ"))],
                vec![("id".to_string(), json!(2)), ("nass".to_string(), json!("ب"))],
            ],
        );
        BokReader::from_driver(Path::new("book.bok"), Box::new(driver))
    }

    #[test]
    fn test_system_tables_are_hidden() {
        let mut reader = reader();
        assert_eq!(reader.table_names().unwrap(), vec!["b100".to_string()]);
    }

    #[test]
    fn test_describe_reports_columns_and_count() {
        let mut reader = reader();
        let desc = reader.describe("b100").unwrap();
        assert_eq!(desc.columns, vec!["id".to_string(), "nass".to_string()]);
        assert_eq!(desc.row_count, 3);
    }

    #[test]
    fn test_scan_sorted_orders_by_id() {
        let mut reader = reader();
        let rows = reader.scan_sorted("b100", "id").unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("id")).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_scan_sorted_missing_column_keeps_insertion_order() {
        let mut reader = reader();
        let rows = reader.scan_sorted("b100", "no_such_column").unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("id")).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
