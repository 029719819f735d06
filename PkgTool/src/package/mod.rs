//! Package Handle collaborator
//!
//! The orchestrator in [`crate::extract`] never touches a container format
//! directly. It talks to a [`PackageBackend`] that opens files into
//! [`PackageHandle`]s, and each handle exposes metadata plus two extraction
//! operations: a bulk header step and a per-entry step.

pub mod orbis;

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

pub use orbis::OrbisBackend;

/// Read-only metadata view of an opened package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Title identifier, used to name the output directory
    pub title_id: String,
    /// Package size as recorded by the container
    pub size: u64,
    /// Container flags
    pub flags: u32,
    /// Number of entries addressable by index
    pub entry_count: u32,
}

/// An opened package.
///
/// Handles must be shareable across threads: the parallel executor calls
/// [`extract_entry`](PackageHandle::extract_entry) concurrently through `&self`.
/// Each entry must be written to a destination no other entry writes to.
pub trait PackageHandle: Send + Sync {
    /// Title identifier from the package metadata.
    fn title_id(&self) -> &str;

    /// Package size in bytes.
    fn pkg_size(&self) -> u64;

    /// Container flags.
    fn pkg_flags(&self) -> u32;

    /// Number of entries; valid indices are `0..number_of_files()`.
    fn number_of_files(&self) -> u32;

    /// Bulk header/metadata extraction into `output_dir`.
    ///
    /// Must succeed before any [`extract_entry`](PackageHandle::extract_entry) call.
    fn extract_header(&mut self, output_dir: &Path) -> Result<()>;

    /// Extract one entry into the directory given to the header step.
    ///
    /// A failure may leave a partially written file behind.
    fn extract_entry(&self, index: u32) -> Result<()>;

    /// Snapshot of all metadata accessors.
    fn metadata(&self) -> PackageMetadata {
        PackageMetadata {
            title_id: self.title_id().to_string(),
            size: self.pkg_size(),
            flags: self.pkg_flags(),
            entry_count: self.number_of_files(),
        }
    }
}

/// Opens package files of one container format.
pub trait PackageBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// File extension (without dot, compared case-insensitively) used for discovery.
    fn extension(&self) -> &'static str;

    /// Open the package at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn PackageHandle>>;
}
