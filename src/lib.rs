//! # Shamela - Book Database Reader and Library Importer
//!
//! This crate ingests per-book databases produced by the Shamela desktop
//! library (`.bok` and `.accdb` files, both Access-style Jet/ACE databases)
//! and loads them into a central MySQL library schema: one book per file,
//! with its volumes, chapters, and pages wired together.
//!
//! ## Features
//!
//! - **Read `.bok`/`.accdb` files**: signature validation and table access
//!   through an opaque Jet/ACE driver seam
//! - **Heuristic table discovery**: books that abandon the `Main` /
//!   `b<digits>` / `t<digits>` naming convention are classified by a
//!   data-driven scoring pass
//! - **Arabic-safe text cleaning**: diacritics survive; typographic
//!   separators become paragraph-level HTML
//! - **Transactional loading**: one transaction per book with author and
//!   publisher deduplication, interval-based chapter linkage, dense page
//!   numbering, and rollback on any failure
//! - **Schema drift repair**: obsolete destination constraints are dropped
//!   and missing columns added once per process, before the first write
//!
//! ## Quick Start
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
//! println!(
//!     "imported {} pages in {} chapters",
//!     stats.pages, stats.chapters
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into several key modules:
//!
//! - **Source access**: [`readers`] for signature checks and row-oriented
//!   table scans over one open book file
//! - **Classification**: [`discovery`] assigns the book-info, content, and
//!   index roles and resolves the essential columns
//! - **Normalisation**: [`text`] produces the plain and HTML renderings of
//!   every page
//! - **Loading**: [`loader`] owns the destination connection, the runtime
//!   schema guard, and the per-book transaction
//! - **Orchestration**: [`ingest`] runs the pipeline per file and per
//!   batch; [`progress`] carries advisory messages and cancellation
//!
//! ## Error Handling
//!
//! All fallible operations return a [`Result<T>`] type, where errors are
//! represented by [`ShamelaError`]. The crate uses the `snafu` library for
//! ergonomic error handling with context and backtraces. Per-file failures
//! roll back that file's writes and leave the rest of a batch untouched.

pub mod discovery;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod progress;
pub mod readers;
pub mod text;

// Re-export commonly used types for convenience
pub use ingest::{ingest, ingest_batch, FileReport, FileStatus, IngestStats};
pub use loader::{DestinationConfig, MySqlLoader};
pub use model::{BookData, BookInfo, ContentRow, IndexRow};
pub use progress::{CancelToken, LogSink, NullSink, ProgressLevel, ProgressSink};
pub use readers::BokReader;

// Re-export error types for convenience
pub use error::{Result, ShamelaError, snafu};
