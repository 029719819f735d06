//! Single-entry extraction with per-entry fault isolation

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::Error;
use crate::package::PackageHandle;

/// Result of extracting one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Zero-based entry index
    pub entry_index: u32,
    /// Whether the entry was extracted
    pub succeeded: bool,
    /// Reason for a failure
    pub error_message: Option<String>,
}

impl ExtractionOutcome {
    #[must_use]
    pub fn success(entry_index: u32) -> Self {
        Self {
            entry_index,
            succeeded: true,
            error_message: None,
        }
    }

    #[must_use]
    pub fn failure(entry_index: u32, message: impl Into<String>) -> Self {
        Self {
            entry_index,
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// Extract entry `index` through `handle`, never propagating its failure.
///
/// Errors and panics raised by the backend become a failed outcome, so one
/// corrupt entry cannot stop the entries after it. Output already written
/// for a failed entry is left in place; callers may find a truncated file.
pub fn extract_entry(handle: &dyn PackageHandle, index: u32) -> ExtractionOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| handle.extract_entry(index)))
        .unwrap_or_else(|payload| Err(Error::EntryPanicked(panic_message(payload.as_ref()))));

    match result {
        Ok(()) => {
            tracing::debug!("Entry {index} of {} extracted", handle.title_id());
            ExtractionOutcome::success(index)
        }
        Err(e) => {
            tracing::warn!("Entry {index} of {} failed: {e}", handle.title_id());
            ExtractionOutcome::failure(index, e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
