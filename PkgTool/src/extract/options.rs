//! Extraction options
//!
//! Configuration for the package processor and batch driver.

use super::executor::Executor;

/// Default progress cadence: report every 10th entry (and the last one).
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 10;

/// Options for package extraction.
///
/// # Example
///
/// ```
/// use pkgtool::extract::{Executor, ExtractOptions};
///
/// // Sequential extraction with the default progress cadence
/// let options = ExtractOptions::new();
///
/// // Parallel extraction on four worker threads
/// let options = ExtractOptions::new()
///     .with_executor(Executor::Parallel { threads: Some(4) })
///     .with_progress_interval(25);
/// assert_eq!(options.progress_interval(), 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// How entry extraction is scheduled within one package
    pub executor: Executor,

    /// Report progress every `progress_interval` entries
    /// Default: 10
    pub progress_interval: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with sequential extraction and the default cadence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executor: Executor::Sequential,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Set the entry executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Set the progress cadence.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u32) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Effective cadence; zero is treated as one.
    #[must_use]
    pub fn progress_interval(&self) -> u32 {
        self.progress_interval.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.executor, Executor::Sequential);
        assert_eq!(opts.progress_interval(), 10);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let opts = ExtractOptions::new().with_progress_interval(0);
        assert_eq!(opts.progress_interval(), 1);
    }
}
