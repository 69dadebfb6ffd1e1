//! Jet/ACE table access through the mdbtools suite.
//!
//! The core treats the Jet/ACE connector as opaque: everything above this
//! module speaks [`TableDriver`], and tests substitute an in-memory driver.
//! The shipped implementation shells out to `mdbtools` (`mdb-tables`,
//! `mdb-json`, `mdb-count`), the standard way to read Access files on a
//! server without the Access runtime. Rows arrive as one JSON object per
//! line, which maps directly onto [`SourceRow`]'s name-indexed shape.
//!
//! Tool output is decoded as UTF-8 with a Windows-1256 fallback; Shamela
//! files older than Jet4 store Arabic text in the legacy codepage and some
//! mdbtools builds pass it through untranslated.
//!
//! All failures surface as [`ShamelaError::SourceOpen`]; callers never see
//! process- or driver-specific types.

use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, warn};
use serde_json::Value;

use crate::{Result, ShamelaError};
use super::row::SourceRow;

/// Capability set every Jet/ACE connector must provide.
///
/// Implementations expose raw tables only; name filtering, ordering, and
/// schema interpretation happen in the layers above.
pub trait TableDriver {
    /// All table names in the file, including system tables.
    fn table_names(&mut self) -> Result<Vec<String>>;

    /// Column names of a table in declaration order. May be empty when the
    /// table has no rows to sample.
    fn columns(&mut self, table: &str) -> Result<Vec<String>>;

    /// Number of rows in a table.
    fn row_count(&mut self, table: &str) -> Result<u64>;

    /// Lazy scan over all rows of a table, in file order.
    fn scan(&mut self, table: &str) -> Result<Box<dyn Iterator<Item = Result<SourceRow>>>>;
}

/// [`TableDriver`] backed by mdbtools child processes.
pub struct MdbToolsDriver {
    path: PathBuf,
}

impl MdbToolsDriver {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    fn run_tool(&self, tool: &str, table: Option<&str>) -> Result<String> {
        let mut command = Command::new(tool);
        command.arg(&self.path);
        if let Some(table) = table {
            command.arg(table);
        }
        let output = command.output().map_err(|e| self.spawn_error(tool, e))?;
        if !output.status.success() {
            return Err(ShamelaError::source_open(
                self.path.display().to_string(),
                format!("{} failed: {}", tool, String::from_utf8_lossy(&output.stderr).trim()),
            ));
        }
        Ok(decode_tool_output(&output.stdout))
    }

    fn spawn_error(&self, tool: &str, e: std::io::Error) -> ShamelaError {
        let message = if e.kind() == ErrorKind::NotFound {
            format!("{} not found; install the mdbtools package", tool)
        } else {
            format!("cannot run {}: {}", tool, e)
        };
        ShamelaError::source_open(self.path.display().to_string(), message)
    }
}

impl TableDriver for MdbToolsDriver {
    fn table_names(&mut self) -> Result<Vec<String>> {
        // -1 prints one table per line, which survives names with spaces
        let output = Command::new("mdb-tables")
            .arg("-1")
            .arg(&self.path)
            .output()
            .map_err(|e| self.spawn_error("mdb-tables", e))?;
        if !output.status.success() {
            return Err(ShamelaError::source_open(
                self.path.display().to_string(),
                format!(
                    "mdb-tables failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(decode_tool_output(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn columns(&mut self, table: &str) -> Result<Vec<String>> {
        let mut rows = self.scan(table)?;
        match rows.next() {
            Some(row) => Ok(row?.columns().map(str::to_string).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn row_count(&mut self, table: &str) -> Result<u64> {
        match self.run_tool("mdb-count", Some(table)) {
            Ok(output) => output.trim().parse::<u64>().map_err(|_| {
                ShamelaError::source_open(
                    self.path.display().to_string(),
                    format!("mdb-count produced no number for table {}", table),
                )
            }),
            Err(e) => {
                // Older mdbtools lacks mdb-count; fall back to a full scan.
                debug!("mdb-count unavailable ({}), counting {} by scan", e, table);
                let mut count = 0u64;
                for row in self.scan(table)? {
                    row?;
                    count += 1;
                }
                Ok(count)
            }
        }
    }

    fn scan(&mut self, table: &str) -> Result<Box<dyn Iterator<Item = Result<SourceRow>>>> {
        let mut child = Command::new("mdb-json")
            .arg(&self.path)
            .arg(table)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error("mdb-json", e))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ShamelaError::source_open(self.path.display().to_string(), "mdb-json gave no stdout")
        })?;
        Ok(Box::new(JsonRowIter {
            path: self.path.display().to_string(),
            child,
            reader: BufReader::new(stdout),
            finished: false,
        }))
    }
}

/// Streaming iterator over `mdb-json` output, one row per line.
struct JsonRowIter {
    path: String,
    child: Child,
    reader: BufReader<ChildStdout>,
    finished: bool,
}

impl Iterator for JsonRowIter {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.finished = true;
                    return match self.child.wait() {
                        Ok(status) if status.success() => None,
                        Ok(status) => Some(Err(ShamelaError::source_open(
                            &self.path,
                            format!("mdb-json exited with {}", status),
                        ))),
                        Err(e) => Some(Err(ShamelaError::source_open(
                            &self.path,
                            format!("mdb-json did not terminate cleanly: {}", e),
                        ))),
                    };
                }
                Ok(_) => {
                    let text = decode_tool_output(&line);
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(parse_row_line(&self.path, trimmed));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ShamelaError::source_open(
                        &self.path,
                        format!("reading mdb-json output: {}", e),
                    )));
                }
            }
        }
    }
}

impl Drop for JsonRowIter {
    fn drop(&mut self) {
        if !self.finished {
            // Scan abandoned early (e.g. single-row sampling)
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

fn parse_row_line(path: &str, line: &str) -> Result<SourceRow> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(object)) => Ok(SourceRow::from_object(object)),
        Ok(other) => Err(ShamelaError::source_open(
            path,
            format!("mdb-json emitted a non-object row: {}", other),
        )),
        Err(e) => Err(ShamelaError::source_open(
            path,
            format!("mdb-json emitted invalid JSON: {}", e),
        )),
    }
}

/// Decodes tool output as UTF-8, falling back to the Arabic Windows-1256
/// codepage used by pre-Jet4 Shamela files.
fn decode_tool_output(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("driver output is not UTF-8, decoding as windows-1256");
            let (decoded, _, _) = encoding_rs::WINDOWS_1256.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_passthrough() {
        assert_eq!(decode_tool_output("كتاب".as_bytes()), "كتاب");
    }

    #[test]
    fn test_decode_windows_1256_fallback() {
        // "كتاب" in Windows-1256
        let legacy = [0xDF, 0xCA, 0xC7, 0xC8];
        assert_eq!(decode_tool_output(&legacy), "كتاب");
    }

    #[test]
    fn test_parse_row_line_rejects_non_objects() {
        assert!(parse_row_line("book.bok", "[1, 2]").is_err());
        assert!(parse_row_line("book.bok", "not json").is_err());
        let row = parse_row_line("book.bok", r#"{"id": 1, "nass": "بسم الله"}"#).unwrap();
        assert_eq!(row.get_i64("id"), Some(1));
    }
}
