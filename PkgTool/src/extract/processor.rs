//! Package processing
//!
//! Drives one package from open to done: read metadata, resolve the output
//! directory once, run the bulk header step, then extract every entry and
//! fold the outcomes into a [`PackageSummary`].

use std::path::PathBuf;

use super::entry::{ExtractionOutcome, extract_entry};
use super::options::ExtractOptions;
use super::output::resolve_output_dir;
use super::progress::{ExtractPhase, ExtractProgress, ProgressCallback, is_report_point};
use crate::error::{Error, PackageError, PackageStage};
use crate::package::PackageBackend;

/// One unit of batch work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTask {
    /// Package file to process
    pub source_path: PathBuf,
    /// Base directory the package's output directory is resolved against
    pub output_base: PathBuf,
}

impl PackageTask {
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, output_base: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            output_base: output_base.into(),
        }
    }
}

/// Aggregated result of one processed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    /// Title identifier from the package metadata
    pub title_id: String,
    /// Number of entries attempted
    pub total_entries: u32,
    /// Entries extracted
    pub succeeded_count: u32,
    /// Entries that failed
    pub failed_count: u32,
    /// Directory the package was extracted into
    pub output_directory: PathBuf,
    /// Failed entries with their reasons
    pub failures: Vec<ExtractionOutcome>,
}

impl PackageSummary {
    /// Fold per-entry outcomes into a summary.
    #[must_use]
    pub fn from_outcomes(
        title_id: impl Into<String>,
        output_directory: impl Into<PathBuf>,
        outcomes: Vec<ExtractionOutcome>,
    ) -> Self {
        let total_entries = outcomes.len() as u32;
        let failures: Vec<_> = outcomes.into_iter().filter(|o| !o.succeeded).collect();
        let failed_count = failures.len() as u32;

        Self {
            title_id: title_id.into(),
            total_entries,
            succeeded_count: total_entries - failed_count,
            failed_count,
            output_directory: output_directory.into(),
            failures,
        }
    }

    /// A package succeeds only if no entry failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }
}

/// Process one package end to end.
///
/// Open, metadata, output-directory and header failures abort this package
/// and are returned as a [`PackageError`]. Entry failures never abort it;
/// they are counted in the summary.
///
/// Progress is reported once when the package is opened, once before the
/// header step, and during entry extraction at every
/// [`ExtractOptions::progress_interval`]-th entry plus the final one.
pub fn process_package(
    task: &PackageTask,
    backend: &dyn PackageBackend,
    options: &ExtractOptions,
    progress: ProgressCallback,
) -> Result<PackageSummary, PackageError> {
    let path = task.source_path.as_path();
    let fail = |stage: PackageStage| move |source: Error| {
        tracing::error!("{stage} failed for {}: {source}", path.display());
        PackageError::new(path, stage, source)
    };

    progress(&ExtractProgress::with_file(
        ExtractPhase::Opening,
        1,
        1,
        path.display().to_string(),
    ));

    // Unopened -> Opened
    let mut handle = backend.open(path).map_err(fail(PackageStage::Open))?;

    // Opened -> MetadataRead
    let metadata = handle.metadata();
    if metadata.title_id.is_empty() {
        return Err(fail(PackageStage::ReadMetadata)(Error::InvalidMetadata(
            "empty title id".to_string(),
        )));
    }
    tracing::info!(
        "Opened {} ({}): {} entries, {} bytes, flags {:#010X}",
        path.display(),
        metadata.title_id,
        metadata.entry_count,
        metadata.size,
        metadata.flags
    );

    // Resolved exactly once; every later step writes below this directory
    let output_dir = resolve_output_dir(&task.output_base, &metadata.title_id)
        .map_err(fail(PackageStage::ResolveOutput))?;
    tracing::info!("Output directory: {}", output_dir.display());

    progress(&ExtractProgress::with_file(
        ExtractPhase::ExtractingHeader,
        1,
        1,
        metadata.title_id.clone(),
    ));
    handle
        .extract_header(&output_dir)
        .map_err(fail(PackageStage::ExtractHeader))?;

    // MetadataRead -> Extracting
    let total = metadata.entry_count;
    tracing::debug!("{}: header extracted, extracting {total} entries", metadata.title_id);
    let interval = options.progress_interval();
    let handle = &*handle;
    let entry_fn = |index: u32| extract_entry(handle, index);

    let mut completed = 0u32;
    let outcomes = options.executor.run(0..total, &entry_fn, &mut |outcome| {
        completed += 1;
        if is_report_point(completed, total, interval) {
            progress(&ExtractProgress::with_file(
                ExtractPhase::ExtractingEntries,
                completed as usize,
                total as usize,
                format!("entry {}", outcome.entry_index),
            ));
        }
    });

    // Extracting -> Done
    let summary = PackageSummary::from_outcomes(metadata.title_id, output_dir, outcomes);
    tracing::info!(
        "{}: {}/{} entries extracted, {} failed",
        summary.title_id,
        summary.succeeded_count,
        summary.total_entries,
        summary.failed_count
    );

    progress(&ExtractProgress::with_file(
        ExtractPhase::Complete,
        1,
        1,
        summary.title_id.clone(),
    ));

    Ok(summary)
}
