//! # pkgtool
//!
//! Batch extraction of PS4 `.pkg` containers.
//!
//! The [`extract`] module drives extraction: it opens each package through a
//! [`package::PackageBackend`], derives the output directory from the title
//! identifier, runs the header step and then extracts every entry, isolating
//! failures to the entry (or package) that caused them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use pkgtool::prelude::*;
//!
//! let backend = OrbisBackend;
//! let tasks = directory_tasks(Path::new("packages/"), None, &backend);
//! let summary = run_batch(&tasks, &backend, &ExtractOptions::default(), &SilentReporter);
//! println!("{} of {} packages extracted", summary.packages_succeeded, summary.packages_attempted);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `ps4-pkg-tool` command-line binary

pub mod error;
pub mod extract;
pub mod package;

// Re-exports for convenience
pub use error::{Error, PackageError, PackageStage, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, PackageError, PackageStage, Result};
    pub use crate::extract::{
        BatchReporter, Executor, ExtractOptions, ExtractionOutcome, PackageSummary, PackageTask,
        RunSummary, SilentReporter, directory_tasks, process_package, run_batch, single_task,
    };
    pub use crate::package::{OrbisBackend, PackageBackend, PackageHandle, PackageMetadata};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
