//! Progress reporting and cooperative cancellation for long-running ingests.
//!
//! The ingestion pipeline emits advisory `(message, level)` pairs to a
//! caller-supplied sink and polls a shared cancellation flag between files.
//! Messages are for display only; callers must never parse them for control
//! flow.
//!
//! # Examples
//!
//! ```
//! use shamela::progress::{ProgressLevel, ProgressSink};
//!
//! struct PrintSink;
//!
//! impl ProgressSink for PrintSink {
//!     fn emit(&self, level: ProgressLevel, message: &str) {
//!         println!("[{:?}] {}", level, message);
//!     }
//! }
//!
//! let sink = PrintSink;
//! sink.emit(ProgressLevel::Info, "starting");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

/// Severity of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    /// Informational message
    Info,
    /// Something recoverable went wrong (e.g. a skipped row)
    Warning,
    /// A file or batch failed
    Error,
    /// A file committed successfully
    Success,
    /// A pipeline stage transition
    Progress,
}

/// Receiver for progress messages emitted by the pipeline.
///
/// Implementations must be cheap: the pipeline calls `emit` inline from the
/// worker, once per stage and once per noteworthy row event.
pub trait ProgressSink {
    /// Delivers one advisory message at the given level.
    fn emit(&self, level: ProgressLevel, message: &str);
}

/// Sink that discards every message.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _level: ProgressLevel, _message: &str) {}
}

/// Sink that forwards messages to the `log` macros at matching levels.
///
/// `Success` maps to `info!`, `Progress` to `debug!`.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, level: ProgressLevel, message: &str) {
        match level {
            ProgressLevel::Info | ProgressLevel::Success => info!("{}", message),
            ProgressLevel::Warning => warn!("{}", message),
            ProgressLevel::Error => error!("{}", message),
            ProgressLevel::Progress => debug!("{}", message),
        }
    }
}

/// Shared cooperative cancellation flag.
///
/// The flag is coarse-grained: the batch runner checks it between files
/// only, so a file that has started always runs to completion or error.
/// Clones share the same underlying flag and may be handed to another
/// thread (typically the UI thread that owns the cancel button).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect at the next between-file check.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
