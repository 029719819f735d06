//! Types for PS4 PKG container handling

use serde::Serialize;

/// Parsed fixed-size header of a PS4 package
#[derive(Debug, Clone)]
pub(crate) struct PkgHeader {
    /// Number of records in the entry table
    pub entry_count: u32,
    /// Offset of the entry table from the start of the file
    pub table_offset: u32,
    /// Content id, e.g. `UP0000-CUSA00001_00-0000000000000000`
    pub content_id: String,
    /// Content flags
    pub content_flags: u32,
    /// Package size recorded in the header
    pub pkg_size: u64,
}

/// One record of the entry table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PkgEntry {
    /// Entry id; well-known ids map to `sce_sys` file names
    pub id: u32,
    /// Offset into the entry-names blob (unused for extraction)
    pub filename_offset: u32,
    /// Primary flags; bit 31 marks encrypted data
    pub flags1: u32,
    /// Secondary flags
    pub flags2: u32,
    /// Data offset from the start of the file
    pub offset: u32,
    /// Data size in bytes
    pub size: u32,
}

impl PkgEntry {
    /// Whether the entry's data is stored encrypted
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.flags1 & super::ENTRY_FLAG_ENCRYPTED != 0
    }
}

/// Name of a well-known entry id, if any
#[must_use]
pub fn entry_name(id: u32) -> Option<&'static str> {
    let name = match id {
        0x0400 => "license.dat",
        0x0401 => "license.info",
        0x0402 => "nptitle.dat",
        0x0403 => "npbind.dat",
        0x0404 => "selfinfo.dat",
        0x0406 => "imageinfo.dat",
        0x0407 => "target-deltainfo.dat",
        0x0408 => "origin-deltainfo.dat",
        0x0409 => "psreserved.dat",
        0x1000 => "param.sfo",
        0x1001 => "playgo-chunk.dat",
        0x1002 => "playgo-chunk.sha",
        0x1003 => "playgo-manifest.xml",
        0x1004 => "pronunciation.xml",
        0x1005 => "pronunciation.sig",
        0x1006 => "pic1.png",
        0x1007 => "pubtoolinfo.dat",
        0x100D => "save_data.png",
        0x100E => "shareparam.json",
        0x1200 => "icon0.png",
        0x1220 => "pic0.png",
        0x1240 => "snd0.at9",
        0x1280 => "icon0.dds",
        0x12A0 => "pic0.dds",
        0x12C0 => "pic1.dds",
        _ => return None,
    };
    Some(name)
}

/// Per-entry record written to `pkg_info.json`
#[derive(Debug, Serialize)]
pub(crate) struct EntryInfo<'a> {
    pub index: u32,
    pub id: u32,
    pub name: &'a str,
    pub offset: u32,
    pub size: u32,
    pub encrypted: bool,
}

/// Package-level record written to `pkg_info.json`
#[derive(Debug, Serialize)]
pub(crate) struct PkgInfo<'a> {
    pub title_id: &'a str,
    pub content_id: &'a str,
    pub size: u64,
    pub flags: u32,
    pub entry_count: u32,
    pub entries: Vec<EntryInfo<'a>>,
}
