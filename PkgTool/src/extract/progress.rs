//! Progress reporting for package extraction

/// Progress callback for extraction.
///
/// Receives an [`ExtractProgress`] with phase, current/total counts, and an
/// optional item name. Must be `Sync + Send` so parallel extraction can share it.
pub type ProgressCallback<'a> = &'a (dyn Fn(&ExtractProgress) + Sync + Send);

/// Progress information during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractProgress {
    /// Current operation phase
    pub phase: ExtractPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current package or entry (if applicable)
    pub current_file: Option<String>,
}

impl ExtractProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: ExtractPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file/item name
    #[must_use]
    pub fn with_file(
        phase: ExtractPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPhase {
    /// Opening a package and reading its metadata
    Opening,
    /// Bulk header/metadata extraction
    ExtractingHeader,
    /// Per-entry extraction
    ExtractingEntries,
    /// Package finished
    Complete,
}

impl ExtractPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "Opening package",
            Self::ExtractingHeader => "Extracting header",
            Self::ExtractingEntries => "Extracting entries",
            Self::Complete => "Complete",
        }
    }
}

/// Whether entry `completed` of `total` falls on the reporting cadence.
///
/// Reports every `interval`-th entry and always the final one, so 25 entries
/// at interval 10 report at 10, 20 and 25.
#[must_use]
pub fn is_report_point(completed: u32, total: u32, interval: u32) -> bool {
    completed > 0 && (completed == total || completed % interval.max(1) == 0)
}
