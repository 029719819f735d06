//! PS4 PKG container adapter
//!
//! Reads the unencrypted outer structure of a PS4 package: the fixed header
//! and the entry table. Entry data is copied out verbatim; encrypted entries
//! keep their ciphertext and get an `.enc` suffix.

mod reader;
mod types;
mod writer;

use std::path::Path;

use crate::error::Result;
use super::{PackageBackend, PackageHandle};

pub use reader::OrbisPackage;
pub use types::{PkgEntry, entry_name};
pub use writer::PkgWriter;

/// PKG magic (`\x7FCNT`, big-endian)
pub const MAGIC: u32 = 0x7F434E54;

/// Bytes of the fixed header that are parsed (through the package size field)
pub const HEADER_LEN: u64 = 0x438;

/// Size of one entry-table record
pub const ENTRY_SIZE: u64 = 32;

/// Bit in `flags1` marking encrypted entry data
pub const ENTRY_FLAG_ENCRYPTED: u32 = 0x80000000;

/// Length of the content id field
pub const CONTENT_ID_LEN: usize = 0x24;

/// Subdirectory of the output directory receiving entry files
pub const SCE_SYS_DIR: &str = "sce_sys";

/// Package-level metadata file written by the header step
pub const PKG_INFO_FILE: &str = "pkg_info.json";

pub(crate) const OFFSET_ENTRY_COUNT: usize = 0x10;
pub(crate) const OFFSET_TABLE: usize = 0x18;
pub(crate) const OFFSET_CONTENT_ID: usize = 0x40;
pub(crate) const OFFSET_CONTENT_FLAGS: usize = 0x78;
pub(crate) const OFFSET_PKG_SIZE: usize = 0x430;

/// Backend opening `.pkg` files as [`OrbisPackage`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbisBackend;

impl PackageBackend for OrbisBackend {
    fn name(&self) -> &'static str {
        "ps4-pkg"
    }

    fn extension(&self) -> &'static str {
        "pkg"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PackageHandle>> {
        Ok(Box::new(OrbisPackage::open(path)?))
    }
}
