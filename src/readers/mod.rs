// Readers for Shamela source book files
//
// This module provides signature validation, the opaque Jet/ACE table
// driver seam, and the high-level `BokReader` session used by the rest of
// the ingestion pipeline.

pub mod bok_reader;
pub mod mdb_driver;
pub mod row;
pub mod signature;

pub use bok_reader::{BokReader, TableDescription};
pub use mdb_driver::{MdbToolsDriver, TableDriver};
pub use row::SourceRow;
pub use signature::{validate_source_file, MIN_SOURCE_FILE_SIZE};

/// In-memory table driver for unit tests across the crate.
#[cfg(test)]
pub mod testing {
    use serde_json::Value;

    use crate::Result;
    use super::mdb_driver::TableDriver;
    use super::row::SourceRow;

    /// Tables held as (name, rows) in insertion order.
    #[derive(Default)]
    pub struct MemoryDriver {
        tables: Vec<(String, Vec<SourceRow>)>,
    }

    impl MemoryDriver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_table(&mut self, name: &str, rows: Vec<Vec<(String, Value)>>) {
            let rows = rows.into_iter().map(SourceRow::from_pairs).collect();
            self.tables.push((name.to_string(), rows));
        }

        fn rows(&self, table: &str) -> Vec<SourceRow> {
            self.tables
                .iter()
                .find(|(name, _)| name == table)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default()
        }
    }

    impl TableDriver for MemoryDriver {
        fn table_names(&mut self) -> Result<Vec<String>> {
            Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
        }

        fn columns(&mut self, table: &str) -> Result<Vec<String>> {
            Ok(self
                .rows(table)
                .first()
                .map(|row| row.columns().map(str::to_string).collect())
                .unwrap_or_default())
        }

        fn row_count(&mut self, table: &str) -> Result<u64> {
            Ok(self.rows(table).len() as u64)
        }

        fn scan(&mut self, table: &str) -> Result<Box<dyn Iterator<Item = Result<SourceRow>>>> {
            Ok(Box::new(self.rows(table).into_iter().map(Ok)))
        }
    }
}
