//! PS4 PKG reader implementing [`PackageHandle`]

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};
use tempfile::NamedTempFile;

use super::types::{EntryInfo, PkgHeader, PkgInfo};
use super::{
    CONTENT_ID_LEN, ENTRY_SIZE, HEADER_LEN, MAGIC, OFFSET_CONTENT_FLAGS, OFFSET_CONTENT_ID,
    OFFSET_ENTRY_COUNT, OFFSET_PKG_SIZE, OFFSET_TABLE, PKG_INFO_FILE, PkgEntry, SCE_SYS_DIR,
    entry_name,
};
use crate::error::{Error, Result};
use crate::package::PackageHandle;

/// An opened PS4 package
#[derive(Debug)]
pub struct OrbisPackage {
    path: PathBuf,
    file_len: u64,
    header: PkgHeader,
    title_id: String,
    entries: Vec<PkgEntry>,
    /// Destination file name per entry, unique within the package
    names: Vec<String>,
    /// Set by the header step
    output_dir: Option<PathBuf>,
}

impl OrbisPackage {
    /// Open a package and parse its header and entry table.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the magic is wrong, the
    /// content id carries no valid title id, or the entry table lies outside
    /// the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader, file_len)?;
        let title_id = title_id_from_content_id(&header.content_id)?;
        let entries = read_entry_table(&mut reader, &header, file_len)?;
        let names = destination_names(&entries);

        tracing::debug!(
            "Opened PKG {}: content id {}, {} entries",
            path.display(),
            header.content_id,
            entries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file_len,
            header,
            title_id,
            entries,
            names,
            output_dir: None,
        })
    }

    /// Content id from the header
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.header.content_id
    }

    /// Entry table records
    #[must_use]
    pub fn entries(&self) -> &[PkgEntry] {
        &self.entries
    }

    /// Destination file name of an entry, relative to `sce_sys/`
    #[must_use]
    pub fn entry_file_name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    fn write_pkg_info(&self, output_dir: &Path) -> Result<()> {
        let entries = self
            .entries
            .iter()
            .zip(&self.names)
            .enumerate()
            .map(|(index, (entry, name))| EntryInfo {
                index: index as u32,
                id: entry.id,
                name,
                offset: entry.offset,
                size: entry.size,
                encrypted: entry.is_encrypted(),
            })
            .collect();

        let info = PkgInfo {
            title_id: &self.title_id,
            content_id: &self.header.content_id,
            size: self.header.pkg_size,
            flags: self.header.content_flags,
            entry_count: self.header.entry_count,
            entries,
        };

        let json = serde_json::to_vec_pretty(&info)?;
        fs::write(output_dir.join(PKG_INFO_FILE), json)?;
        Ok(())
    }
}

impl PackageHandle for OrbisPackage {
    fn title_id(&self) -> &str {
        &self.title_id
    }

    fn pkg_size(&self) -> u64 {
        self.header.pkg_size
    }

    fn pkg_flags(&self) -> u32 {
        self.header.content_flags
    }

    fn number_of_files(&self) -> u32 {
        self.header.entry_count
    }

    fn extract_header(&mut self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir.join(SCE_SYS_DIR))?;
        self.write_pkg_info(output_dir)?;
        self.output_dir = Some(output_dir.to_path_buf());
        Ok(())
    }

    fn extract_entry(&self, index: u32) -> Result<()> {
        let output_dir = self.output_dir.as_ref().ok_or(Error::HeaderNotExtracted)?;
        let entry = self
            .entries
            .get(index as usize)
            .ok_or(Error::EntryIndexOutOfRange {
                index,
                count: self.header.entry_count,
            })?;

        let end = u64::from(entry.offset) + u64::from(entry.size);
        if end > self.file_len {
            return Err(Error::EntryDataOutOfBounds {
                index,
                offset: entry.offset,
                size: entry.size,
                file_len: self.file_len,
            });
        }

        let dest_dir = output_dir.join(SCE_SYS_DIR);
        let dest = dest_dir.join(&self.names[index as usize]);

        // Own handle per call so entries can be extracted concurrently
        let mut src = File::open(&self.path)?;
        src.seek(SeekFrom::Start(u64::from(entry.offset)))?;

        let mut tmp = NamedTempFile::new_in(&dest_dir)?;
        let copied = io::copy(&mut src.take(u64::from(entry.size)), &mut tmp)?;
        if copied != u64::from(entry.size) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry {index}: read {copied} of {} bytes", entry.size),
            )));
        }

        tmp.persist(&dest).map_err(|e| Error::Persist {
            path: dest.clone(),
            source: e.error,
        })?;

        tracing::debug!("Entry {index} ({:#06X}) -> {}", entry.id, dest.display());
        Ok(())
    }
}

fn read_header<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<PkgHeader> {
    if file_len < HEADER_LEN {
        return Err(Error::TruncatedHeader {
            len: file_len,
            needed: HEADER_LEN,
        });
    }

    reader.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; HEADER_LEN as usize];
    reader.read_exact(&mut buf)?;

    let magic = BigEndian::read_u32(&buf[0..4]);
    if magic != MAGIC {
        return Err(Error::InvalidPkgMagic { found: magic });
    }

    let raw_id = &buf[OFFSET_CONTENT_ID..OFFSET_CONTENT_ID + CONTENT_ID_LEN];
    let content_id = String::from_utf8_lossy(raw_id)
        .trim_end_matches('\0')
        .to_string();

    Ok(PkgHeader {
        entry_count: BigEndian::read_u32(&buf[OFFSET_ENTRY_COUNT..]),
        table_offset: BigEndian::read_u32(&buf[OFFSET_TABLE..]),
        content_id,
        content_flags: BigEndian::read_u32(&buf[OFFSET_CONTENT_FLAGS..]),
        pkg_size: BigEndian::read_u64(&buf[OFFSET_PKG_SIZE..]),
    })
}

/// Title id is the 9 characters after the `XX0000-` service prefix
fn title_id_from_content_id(content_id: &str) -> Result<String> {
    let invalid = || Error::InvalidTitleId {
        content_id: content_id.to_string(),
    };

    let title = content_id.get(7..16).ok_or_else(invalid)?;
    if !title.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    Ok(title.to_string())
}

fn read_entry_table<R: Read + Seek>(
    reader: &mut R,
    header: &PkgHeader,
    file_len: u64,
) -> Result<Vec<PkgEntry>> {
    let table_end = u64::from(header.table_offset) + u64::from(header.entry_count) * ENTRY_SIZE;
    if table_end > file_len {
        return Err(Error::EntryTableOutOfBounds {
            count: header.entry_count,
            offset: header.table_offset,
            file_len,
        });
    }

    reader.seek(SeekFrom::Start(u64::from(header.table_offset)))?;
    let mut record = [0u8; ENTRY_SIZE as usize];
    let mut entries = Vec::with_capacity(header.entry_count as usize);

    for _ in 0..header.entry_count {
        reader.read_exact(&mut record)?;
        entries.push(PkgEntry {
            id: BigEndian::read_u32(&record[0..]),
            filename_offset: BigEndian::read_u32(&record[4..]),
            flags1: BigEndian::read_u32(&record[8..]),
            flags2: BigEndian::read_u32(&record[12..]),
            offset: BigEndian::read_u32(&record[16..]),
            size: BigEndian::read_u32(&record[20..]),
        });
    }

    Ok(entries)
}

/// Assign each entry a destination name no other entry shares
fn destination_names(entries: &[PkgEntry]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let suffix = if entry.is_encrypted() { ".enc" } else { "" };
            let candidate = entry_name(entry.id).map(|known| format!("{known}{suffix}"));
            let name = match candidate {
                Some(known) if !seen.contains(&known) => known,
                _ => format!("entry_{index:04}_{:08x}.bin{suffix}", entry.id),
            };
            seen.insert(name.clone());
            name
        })
        .collect()
}
