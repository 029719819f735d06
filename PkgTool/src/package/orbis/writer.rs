//! Minimal PS4 PKG writer
//!
//! Produces packages with the same outer layout the reader parses: a zeroed
//! 4 KiB header region, the entry table, then entry data. Nothing is signed
//! or encrypted, so the output is only useful as a fixture or for
//! round-tripping metadata.

use std::fs;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use super::{
    CONTENT_ID_LEN, ENTRY_SIZE, MAGIC, OFFSET_CONTENT_FLAGS, OFFSET_CONTENT_ID,
    OFFSET_ENTRY_COUNT, OFFSET_PKG_SIZE, OFFSET_TABLE,
};
use crate::error::{Error, Result};

/// Size of the header region preceding the entry table
const HEADER_REGION: usize = 0x1000;

/// Entry data start alignment
const DATA_ALIGN: usize = 0x10;

struct WriterEntry {
    id: u32,
    flags1: u32,
    data: Vec<u8>,
}

/// Builder for PS4 package files
pub struct PkgWriter {
    content_id: String,
    flags: u32,
    entries: Vec<WriterEntry>,
}

impl PkgWriter {
    /// Create a writer for the given content id (at most 36 bytes).
    #[must_use]
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            flags: 0,
            entries: Vec::new(),
        }
    }

    /// Set the header content flags.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Append an entry.
    #[must_use]
    pub fn with_entry(mut self, id: u32, flags1: u32, data: Vec<u8>) -> Self {
        self.entries.push(WriterEntry { id, flags1, data });
        self
    }

    /// Serialize the package.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMetadata`] if the content id is too long or the
    /// package would exceed the 32-bit offsets of the entry table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.content_id.len() > CONTENT_ID_LEN {
            return Err(Error::InvalidMetadata(format!(
                "content id longer than {CONTENT_ID_LEN} bytes: {}",
                self.content_id
            )));
        }

        let table_len = self.entries.len() * ENTRY_SIZE as usize;
        let mut out = vec![0u8; HEADER_REGION + table_len];

        // Data layout first so the table can reference final offsets
        let mut placements = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let aligned = out.len().next_multiple_of(DATA_ALIGN);
            out.resize(aligned, 0);
            placements.push((to_u32(aligned)?, to_u32(entry.data.len())?));
            out.extend_from_slice(&entry.data);
        }

        BigEndian::write_u32(&mut out[0..], MAGIC);
        BigEndian::write_u32(&mut out[OFFSET_ENTRY_COUNT..], to_u32(self.entries.len())?);
        BigEndian::write_u32(&mut out[OFFSET_TABLE..], to_u32(HEADER_REGION)?);
        out[OFFSET_CONTENT_ID..OFFSET_CONTENT_ID + self.content_id.len()]
            .copy_from_slice(self.content_id.as_bytes());
        BigEndian::write_u32(&mut out[OFFSET_CONTENT_FLAGS..], self.flags);
        let total = out.len() as u64;
        BigEndian::write_u64(&mut out[OFFSET_PKG_SIZE..], total);

        for (i, (entry, (offset, size))) in self.entries.iter().zip(placements).enumerate() {
            let record = &mut out[HEADER_REGION + i * ENTRY_SIZE as usize..];
            BigEndian::write_u32(&mut record[0..], entry.id);
            BigEndian::write_u32(&mut record[8..], entry.flags1);
            BigEndian::write_u32(&mut record[16..], offset);
            BigEndian::write_u32(&mut record[20..], size);
        }

        Ok(out)
    }

    /// Serialize the package to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::InvalidMetadata(format!("offset {value} exceeds 32 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let bytes = PkgWriter::new("EP0001-CUSA99999_00-X")
            .with_entry(0x1000, 0, vec![1, 2, 3])
            .with_entry(0x1200, 0, vec![4])
            .to_bytes()
            .unwrap();

        assert_eq!(BigEndian::read_u32(&bytes[0..]), MAGIC);
        assert_eq!(BigEndian::read_u32(&bytes[OFFSET_ENTRY_COUNT..]), 2);
        assert_eq!(BigEndian::read_u64(&bytes[OFFSET_PKG_SIZE..]), bytes.len() as u64);

        let second = &bytes[HEADER_REGION + ENTRY_SIZE as usize..];
        let offset = BigEndian::read_u32(&second[16..]) as usize;
        assert_eq!(offset % DATA_ALIGN, 0);
        assert_eq!(&bytes[offset..], &[4]);
    }

    #[test]
    fn test_rejects_long_content_id() {
        let result = PkgWriter::new("X".repeat(CONTENT_ID_LEN + 1)).to_bytes();
        assert!(matches!(result, Err(Error::InvalidMetadata(_))));
    }
}
