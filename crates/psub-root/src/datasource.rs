//! Bytes backing an open ROOT file.

use std::fs::File;
use std::ops::Deref;

/// File bytes, either memory-mapped from disk or held in memory.
pub enum DataSource {
    /// In-memory copy (`RootFile::from_bytes`, tests).
    Owned(Vec<u8>),
    /// Read-only memory map of a file on disk.
    Mmap(memmap2::Mmap),
}

impl DataSource {
    /// Memory-map `file` read-only.
    pub fn map(file: &File) -> std::io::Result<Self> {
        // SAFETY: the mapping is only read. Another process truncating the
        // file while it is mapped is outside what this tool guards against.
        let mmap = unsafe { memmap2::Mmap::map(file)? };
        Ok(DataSource::Mmap(mmap))
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(bytes: Vec<u8>) -> Self {
        DataSource::Owned(bytes)
    }
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}
