//! Package extraction orchestrator
//!
//! Backend-agnostic: everything here works through
//! [`PackageBackend`](crate::package::PackageBackend) and
//! [`PackageHandle`](crate::package::PackageHandle).

mod batch;
mod entry;
mod executor;
mod options;
mod output;
mod processor;
mod progress;

// Primary public API
pub use batch::{
    BatchReporter, EXIT_EXTRACTION_FAILED, RunSummary, SilentReporter, directory_tasks,
    find_package_files, run_batch, single_task,
};
pub use processor::{PackageSummary, PackageTask, process_package};

// Building blocks
pub use entry::{ExtractionOutcome, extract_entry};
pub use executor::{EntryFn, Executor};
pub use options::{DEFAULT_PROGRESS_INTERVAL, ExtractOptions};
pub use output::{output_dir_for, resolve_output_dir};
pub use progress::{ExtractPhase, ExtractProgress, ProgressCallback, is_report_point};
