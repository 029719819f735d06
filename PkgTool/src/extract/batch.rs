//! Batch package extraction
//!
//! This module turns an invocation into a work set of [`PackageTask`]s and
//! runs the package processor over every member, aggregating the results
//! into a [`RunSummary`]. One package failing never stops the others.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::options::ExtractOptions;
use super::processor::{PackageSummary, PackageTask, process_package};
use super::progress::ExtractProgress;
use crate::error::PackageError;
use crate::package::PackageBackend;

/// Exit status of a run with any package or entry failure
pub const EXIT_EXTRACTION_FAILED: u8 = 2;

/// Receives batch events as packages are processed
///
/// All methods default to doing nothing. Implementations must be `Sync`
/// because progress may be reported while entries run on worker threads.
pub trait BatchReporter: Sync {
    /// A package is about to be processed (`position` is 1-indexed).
    fn package_started(&self, _task: &PackageTask, _position: usize, _total: usize) {}

    /// Progress within the current package.
    fn progress(&self, _progress: &ExtractProgress) {}

    /// A package finished, successfully or not.
    fn package_finished(&self, _task: &PackageTask, _result: &Result<PackageSummary, PackageError>) {}
}

/// Reporter that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl BatchReporter for SilentReporter {}

/// Result of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of packages processed
    pub packages_attempted: usize,
    /// Packages extracted with zero entry failures
    pub packages_succeeded: usize,
    /// Packages that failed or had any entry failure
    pub packages_failed: usize,
    /// Paths of the failed packages, in processing order
    pub failed_paths: Vec<PathBuf>,
}

impl RunSummary {
    /// Every attempted package succeeded. An empty work set counts as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.packages_failed == 0
    }

    /// Process exit status for this run: 0 on success, otherwise
    /// [`EXIT_EXTRACTION_FAILED`].
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { EXIT_EXTRACTION_FAILED }
    }

    fn record(&mut self, path: &Path, succeeded: bool) {
        self.packages_attempted += 1;
        if succeeded {
            self.packages_succeeded += 1;
        } else {
            self.packages_failed += 1;
            self.failed_paths.push(path.to_path_buf());
        }
    }
}

/// Find all files with `extension` in a directory recursively
///
/// # Arguments
/// * `dir` - Directory to search
/// * `extension` - Extension without the dot, compared case-insensitively
///
/// # Returns
/// A sorted list of matching regular files. Unreadable directory entries are
/// logged and skipped.
pub fn find_package_files<P: AsRef<Path>>(dir: P, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {e}");
                None
            }
        })
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Work set for single-file mode
///
/// Without an explicit output base the package's parent directory is used.
#[must_use]
pub fn single_task(pkg_path: &Path, output_base: Option<&Path>) -> PackageTask {
    let base = match output_base {
        Some(base) => base.to_path_buf(),
        None => match pkg_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    PackageTask::new(pkg_path, base)
}

/// Work set for directory mode
///
/// Discovery happens once, before anything is processed; files that appear
/// later are not part of this run. Without an explicit output base the
/// source directory itself is used.
#[must_use]
pub fn directory_tasks(
    source_dir: &Path,
    output_base: Option<&Path>,
    backend: &dyn PackageBackend,
) -> Vec<PackageTask> {
    let base = output_base.unwrap_or(source_dir);
    let files = find_package_files(source_dir, backend.extension());
    tracing::info!(
        "Found {} {} package(s) under {}",
        files.len(),
        backend.name(),
        source_dir.display()
    );

    files
        .into_iter()
        .map(|path| PackageTask::new(path, base))
        .collect()
}

/// Process every task in order and aggregate the outcome
///
/// Never aborts early: each task is attempted regardless of earlier failures.
pub fn run_batch(
    tasks: &[PackageTask],
    backend: &dyn PackageBackend,
    options: &ExtractOptions,
    reporter: &dyn BatchReporter,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let total = tasks.len();
    let progress = |p: &ExtractProgress| reporter.progress(p);

    for (i, task) in tasks.iter().enumerate() {
        tracing::debug!("Package {}/{}: {}", i + 1, total, task.source_path.display());
        reporter.package_started(task, i + 1, total);

        let result = process_package(task, backend, options, &progress);
        let succeeded = result.as_ref().is_ok_and(PackageSummary::is_success);
        reporter.package_finished(task, &result);
        summary.record(&task.source_path, succeeded);
    }

    tracing::info!(
        "Batch complete: {} attempted, {} succeeded, {} failed",
        summary.packages_attempted,
        summary.packages_succeeded,
        summary.packages_failed
    );
    summary
}
