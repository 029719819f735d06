//! Error types for `pkgtool`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The error type for `pkgtool` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== PKG Container Errors ====================
    /// The file is not a PS4 package (missing `\x7FCNT` magic).
    #[error("invalid PKG magic: expected 0x7F434E54, found {found:#010X}")]
    InvalidPkgMagic {
        /// The magic value read from the file.
        found: u32,
    },

    /// The file ends before the fixed-size package header does.
    #[error("PKG header truncated: file is {len} bytes, header needs {needed}")]
    TruncatedHeader {
        /// Actual file length.
        len: u64,
        /// Bytes required for the header.
        needed: u64,
    },

    /// The content id does not carry a usable title identifier.
    #[error("invalid title id in content id {content_id:?}")]
    InvalidTitleId {
        /// The raw content id string.
        content_id: String,
    },

    /// The entry table does not fit inside the package file.
    #[error("entry table ({count} entries at {offset:#X}) exceeds file length {file_len}")]
    EntryTableOutOfBounds {
        /// Number of entries declared by the header.
        count: u32,
        /// Offset of the table.
        offset: u32,
        /// Package file length.
        file_len: u64,
    },

    // ==================== Entry Errors ====================
    /// An entry index outside `[0, entry_count)` was requested.
    #[error("entry index {index} out of range (package has {count} entries)")]
    EntryIndexOutOfRange {
        /// The requested index.
        index: u32,
        /// Number of entries in the package.
        count: u32,
    },

    /// An entry's data range lies outside the package file.
    #[error("entry {index} data ({size} bytes at {offset:#X}) exceeds file length {file_len}")]
    EntryDataOutOfBounds {
        /// The entry index.
        index: u32,
        /// Data offset.
        offset: u32,
        /// Data size.
        size: u32,
        /// Package file length.
        file_len: u64,
    },

    /// Entries were requested before the header step assigned an output directory.
    #[error("entry extraction requested before header extraction")]
    HeaderNotExtracted,

    /// The backend panicked while extracting one entry.
    #[error("entry extraction panicked: {0}")]
    EntryPanicked(String),

    // ==================== Output Errors ====================
    /// The resolved output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDirectory {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Moving a finished temporary file into place failed.
    #[error("cannot persist {path}: {source}")]
    Persist {
        /// The final destination.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    // ==================== Parsing Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== Backend Errors ====================
    /// Invalid package metadata reported by a backend.
    #[error("invalid package metadata: {0}")]
    InvalidMetadata(String),
}

/// A specialized Result type for `pkgtool` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The processing step at which a package failed.
///
/// Mirrors the processor's `Unopened -> Opened -> MetadataRead -> Extracting`
/// progression: each variant names the step that was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStage {
    /// Opening the container.
    Open,
    /// Reading and validating metadata.
    ReadMetadata,
    /// Creating the output directory.
    ResolveOutput,
    /// The bulk header/metadata extraction step.
    ExtractHeader,
}

impl PackageStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::ReadMetadata => "read metadata",
            Self::ResolveOutput => "resolve output directory",
            Self::ExtractHeader => "extract header",
        }
    }
}

impl fmt::Display for PackageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that aborts one package but never the run.
#[derive(Error, Debug)]
#[error("{stage} failed for {}: {source}", .path.display())]
pub struct PackageError {
    /// The package being processed.
    pub path: PathBuf,
    /// The step that failed.
    pub stage: PackageStage,
    /// The underlying cause.
    #[source]
    pub source: Error,
}

impl PackageError {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, stage: PackageStage, source: Error) -> Self {
        Self {
            path: path.into(),
            stage,
            source,
        }
    }
}
