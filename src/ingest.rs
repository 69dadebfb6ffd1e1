//! The per-file ingestion pipeline and batch runner.
//!
//! One call to [`ingest`] carries a single source file through the whole
//! pipeline: open and validate, discover the table roles, extract and
//! normalise rows, and load the result transactionally. Batches run files
//! sequentially on one worker; every file is independent, and the shared
//! cancellation flag is honoured between files only.
//!
//! # Examples
//!
//! ```no_run
//! use shamela::ingest::ingest;
//! use shamela::loader::DestinationConfig;
//! use shamela::progress::LogSink;
//! use std::path::Path;
//!
//! # fn main() -> shamela::Result<()> {
//! let config = DestinationConfig::load(Path::new("destination.json"))?;
//! let stats = ingest(Path::new("/books/tafsir.bok"), &config, &LogSink)?;
//! println!("{} pages in {:?}", stats.pages, stats.duration);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::discovery::{discover, resolve_content_columns, resolve_index_columns, BookSchema};
use crate::loader::{DestinationConfig, MySqlLoader};
use crate::model::{BookData, BookInfo, ContentRow, IndexRow};
use crate::progress::{CancelToken, ProgressLevel, ProgressSink};
use crate::readers::BokReader;
use crate::text::{clean_text, render_html};
use crate::{Result, ShamelaError};

/// Counters for one committed book.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStats {
    pub books: u32,
    pub volumes: u32,
    pub chapters: u32,
    pub pages: u32,
    pub duration: Duration,
}

/// User-visible state of one file in a batch.
///
/// Reports returned by [`ingest_batch`] only carry terminal states;
/// `Running` exists for orchestrators that mirror live progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Not attempted (batch cancelled before the file started)
    Queued,
    /// Currently being processed
    Running,
    /// Committed successfully
    Committed,
    /// Rolled back; carries the error kind name
    Failed(String),
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub stats: Option<IngestStats>,
}

/// Ingests a single book file into the destination.
///
/// # Errors
///
/// Connection and schema-repair failures surface as-is; everything else is
/// wrapped in [`ShamelaError::Ingest`] with the filename attached, and the
/// destination is left unchanged for the file.
pub fn ingest(path: &Path, config: &DestinationConfig, sink: &dyn ProgressSink) -> Result<IngestStats> {
    let mut loader = MySqlLoader::connect(config)?;
    ingest_file(path, &mut loader, sink)
}

/// Ingests a batch of files sequentially over one destination connection.
///
/// A connect or schema-repair failure aborts the whole batch before any
/// file is attempted. Per-file failures roll back and the batch continues.
/// Cancellation is checked between files; files not attempted report
/// [`FileStatus::Queued`].
pub fn ingest_batch(
    paths: &[PathBuf],
    config: &DestinationConfig,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<Vec<FileReport>> {
    let mut loader = MySqlLoader::connect(config)?;
    let mut reports = Vec::with_capacity(paths.len());

    for path in paths {
        if cancel.is_cancelled() {
            sink.emit(ProgressLevel::Warning, "batch cancelled; remaining files left queued");
            reports.push(FileReport { path: path.clone(), status: FileStatus::Queued, stats: None });
            continue;
        }
        match ingest_file(path, &mut loader, sink) {
            Ok(stats) => {
                reports.push(FileReport {
                    path: path.clone(),
                    status: FileStatus::Committed,
                    stats: Some(stats),
                });
            }
            Err(e) => {
                sink.emit(ProgressLevel::Error, &format!("{}", e));
                warn!("{}", e);
                reports.push(FileReport {
                    path: path.clone(),
                    status: FileStatus::Failed(e.kind().to_string()),
                    stats: None,
                });
            }
        }
    }
    Ok(reports)
}

fn ingest_file(path: &Path, loader: &mut MySqlLoader, sink: &dyn ProgressSink) -> Result<IngestStats> {
    let name = path.display().to_string();
    run_pipeline(path, &name, loader, sink).map_err(|e| ShamelaError::ingest(&name, e))
}

fn run_pipeline(
    path: &Path,
    name: &str,
    loader: &mut MySqlLoader,
    sink: &dyn ProgressSink,
) -> Result<IngestStats> {
    let started = Instant::now();

    sink.emit(ProgressLevel::Progress, &format!("{}: opening", name));
    let mut reader = BokReader::open(path)?;

    sink.emit(ProgressLevel::Progress, &format!("{}: discovering tables", name));
    let schema = discover(&mut reader, sink)?;

    sink.emit(ProgressLevel::Progress, &format!("{}: extracting", name));
    let book = extract_book(&mut reader, &schema, sink)?;
    info!(
        "{}: {} content rows, {} headings",
        name,
        book.content.len(),
        book.index.len()
    );

    sink.emit(ProgressLevel::Progress, &format!("{}: loading", name));
    let summary = loader.load_book(&book, sink)?;
    reader.close();

    sink.emit(
        ProgressLevel::Success,
        &format!(
            "{}: committed ({} volumes, {} chapters, {} pages)",
            name, summary.volumes, summary.chapters, summary.pages
        ),
    );
    Ok(IngestStats {
        books: 1,
        volumes: summary.volumes,
        chapters: summary.chapters,
        pages: summary.pages,
        duration: started.elapsed(),
    })
}

/// Reads and normalises everything the loader needs from one open file.
pub(crate) fn extract_book(
    reader: &mut BokReader,
    schema: &BookSchema,
    sink: &dyn ProgressSink,
) -> Result<BookData> {
    let mut info = match &schema.info_table {
        Some(table) => match reader.scan(table)?.next().transpose()? {
            Some(row) => BookInfo::from_row(&row),
            None => BookInfo::placeholder(),
        },
        None => BookInfo::placeholder(),
    };
    info.title = clean_text(&info.title);
    info.author = clean_text(&info.author);
    info.publisher = clean_text(&info.publisher);
    info.description = clean_text(&info.description);
    if let Some(year) = info.year {
        info!("source reports publication year {}", year);
    }

    let description = reader.describe(&schema.content_table)?;
    let columns = resolve_content_columns(&description.columns);
    if columns.text.is_none() {
        // A body table without body text is no content table at all.
        return Err(ShamelaError::no_content_table(
            reader.path().display().to_string(),
        ));
    }
    let id_column = columns.id.clone().unwrap_or_else(|| "id".to_string());

    let mut content = Vec::with_capacity(description.row_count as usize);
    let mut skipped = 0usize;
    for row in reader.scan_sorted(&schema.content_table, &id_column)? {
        match ContentRow::from_row(&row, &columns) {
            Some(mut page) => {
                page.text = clean_text(&page.text);
                page.html = render_html(&page.text);
                content.push(page);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        sink.emit(
            ProgressLevel::Warning,
            &format!("{} content rows had no usable id and were skipped", skipped),
        );
    }

    let mut index = Vec::new();
    if let Some(table) = &schema.index_table {
        let index_description = reader.describe(table)?;
        let index_columns = resolve_index_columns(&index_description.columns);
        let index_id_column = index_columns.id.clone().unwrap_or_else(|| "id".to_string());
        for row in reader.scan_sorted(table, &index_id_column)? {
            if let Some(mut heading) = IndexRow::from_row(&row, &index_columns) {
                heading.title = clean_text(&heading.title);
                index.push(heading);
            }
        }
    }

    Ok(BookData { info, content, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use crate::readers::testing::MemoryDriver;
    use serde_json::{json, Value};

    fn e1_driver() -> MemoryDriver {
        let mut driver = MemoryDriver::new();
        driver.add_table(
            "Main",
            vec![vec![
                ("Bk".to_string(), json!("كتاب الاختبار")),
                ("Auth".to_string(), json!("مؤلف أ")),
                ("Publisher".to_string(), json!("دار ب")),
                ("BkId".to_string(), json!(77)),
            ]],
        );
        let body: Vec<Vec<(String, Value)>> = vec![
            vec![
                ("id".to_string(), json!(1)),
                ("nass".to_string(), json!("الفصل الأول بداية")),
                ("page".to_string(), json!(1)),
                ("part".to_string(), json!(1)),
            ],
            vec![
                ("id".to_string(), json!(2)),
                ("nass".to_string(), json!("تتمة")),
                ("page".to_string(), json!(2)),
                ("part".to_string(), json!(1)),
            ],
            vec![
                ("id".to_string(), json!(3)),
                ("nass".to_string(), json!("الفصل الثاني")),
                ("page".to_string(), json!(3)),
                ("part".to_string(), json!(2)),
            ],
        ];
        driver.add_table("b12345", body);
        driver.add_table(
            "t12345",
            vec![
                vec![
                    ("id".to_string(), json!(1)),
                    ("tit".to_string(), json!("المقدمة")),
                    ("lvl".to_string(), json!(1)),
                ],
                vec![
                    ("id".to_string(), json!(3)),
                    ("tit".to_string(), json!("الباب الأول")),
                    ("lvl".to_string(), json!(1)),
                ],
            ],
        );
        driver
    }

    fn extract(driver: MemoryDriver) -> BookData {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut reader = BokReader::from_driver(Path::new("book.bok"), Box::new(driver));
        let schema = discover(&mut reader, &NullSink).unwrap();
        extract_book(&mut reader, &schema, &NullSink).unwrap()
    }

    #[test]
    fn test_traditional_file_extraction() {
        // E1 up to the destination boundary
        let book = extract(e1_driver());
        assert_eq!(book.info.title, "كتاب الاختبار");
        assert_eq!(book.info.author, "مؤلف أ");
        assert_eq!(book.info.publisher, "دار ب");
        assert_eq!(book.info.shamela_id, "77");

        assert_eq!(book.content.len(), 3);
        let ids: Vec<i64> = book.content.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(book.content[0].text, "الفصل الأول بداية");
        assert_eq!(book.content[0].html, "<p>الفصل الأول بداية</p>");
        assert_eq!(book.content[2].part, Some(2));

        assert_eq!(book.index.len(), 2);
        assert_eq!(book.index[0].id, 1);
        assert_eq!(book.index[0].title, "المقدمة");
        assert_eq!(book.index[1].id, 3);
    }

    #[test]
    fn test_missing_index_extracts_no_headings() {
        // E2: no t12345 table
        let mut driver = MemoryDriver::new();
        driver.add_table(
            "Main",
            vec![vec![("Bk".to_string(), json!("كتاب الاختبار"))]],
        );
        driver.add_table(
            "b12345",
            vec![vec![
                ("id".to_string(), json!(1)),
                ("nass".to_string(), json!("نص")),
            ]],
        );
        let book = extract(driver);
        assert!(book.index.is_empty());
        assert_eq!(book.content.len(), 1);
    }

    #[test]
    fn test_placeholder_info_when_main_is_missing() {
        let mut driver = MemoryDriver::new();
        let rows: Vec<Vec<(String, Value)>> = (1..=12)
            .map(|i| {
                vec![
                    ("id".to_string(), json!(i)),
                    ("nass".to_string(), json!("محتوى ".repeat(30))),
                ]
            })
            .collect();
        driver.add_table("b9", rows);
        let book = extract(driver);
        assert_eq!(book.info.title, crate::model::UNTITLED_BOOK);
        assert_eq!(book.content.len(), 12);
    }

    #[test]
    fn test_separator_page_renders_to_blocks() {
        // E4: the separator page, through extraction
        let mut driver = MemoryDriver::new();
        driver.add_table(
            "b1",
            vec![vec![
                ("id".to_string(), json!(1)),
                (
                    "nass".to_string(),
                    json!("مقدمة\n===\nفصل\n¬__________\nخاتمة"),
                ),
            ]],
        );
        let book = extract(driver);
        assert_eq!(
            book.content[0].html,
            "<p>مقدمة</p>\n\
             <p style=\"text-align: center; margin: 10px 0;\">===</p>\n\
             <p>فصل</p>\n\
             <p style=\"text-align: center; margin: 10px 0;\">¬__________</p>\n\
             <p>خاتمة</p>"
        );
    }

    #[test]
    fn test_content_table_without_text_column_fails() {
        let mut driver = MemoryDriver::new();
        let rows: Vec<Vec<(String, Value)>> =
            (1..=15).map(|i| vec![("id".to_string(), json!(i))]).collect();
        driver.add_table("b5", rows);
        let mut reader = BokReader::from_driver(Path::new("book.bok"), Box::new(driver));
        let schema = discover(&mut reader, &NullSink).unwrap();
        let err = extract_book(&mut reader, &schema, &NullSink).unwrap_err();
        assert!(err.is_no_content_table());
    }

    #[test]
    fn test_rows_without_ids_are_dropped() {
        let mut driver = MemoryDriver::new();
        driver.add_table(
            "b2",
            vec![
                vec![
                    ("id".to_string(), json!(1)),
                    ("nass".to_string(), json!("أول")),
                ],
                vec![
                    ("id".to_string(), json!(null)),
                    ("nass".to_string(), json!("بدون معرف")),
                ],
            ],
        );
        let book = extract(driver);
        assert_eq!(book.content.len(), 1);
        assert_eq!(book.content[0].id, 1);
    }
}
