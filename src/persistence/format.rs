//! Binary layout of a serialized graph.
//!
//! ```text
//! [MAGIC 8B "HNSWGRPH"][VERSION u32][FLAGS u32][CHECKSUM u32]
//! ```
//!
//! All integers are little-endian. The checksum is the CRC32 of everything
//! after the header.

use crate::error::{HnswError, Result};

/// Magic bytes identifying a serialized graph: "HNSWGRPH"
pub const MAGIC: [u8; 8] = *b"HNSWGRPH";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Entry point marker for an empty graph.
pub const NO_ENTRY_POINT: u32 = u32::MAX;

/// Header preceding the data section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphHeader {
    pub magic: [u8; 8],
    pub version: u32,
    /// Reserved, always zero in version 1.
    pub flags: u32,
    /// CRC32 of the data section.
    pub checksum: u32,
}

impl GraphHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 20;

    pub fn new(checksum: u32) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            checksum,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.flags.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(HnswError::invalid_format("truncated header"));
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        Ok(Self {
            magic,
            version: word(8),
            flags: word(12),
            checksum: word(16),
        })
    }

    /// Checks magic, version and flags.
    pub fn verify(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(HnswError::invalid_format("invalid magic bytes"));
        }
        if self.version == 0 || self.version > FORMAT_VERSION {
            return Err(HnswError::UnsupportedVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }
        if self.flags != 0 {
            return Err(HnswError::invalid_format(format!(
                "unknown flags {:#x}",
                self.flags
            )));
        }
        Ok(())
    }
}

/// Little-endian reader over the data section.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        let raw = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                HnswError::invalid_format(format!("truncated data while reading {what}"))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Appends `value` as little-endian.
#[inline]
pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
