//! TDirectory key lists.

use crate::error::Result;
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// TDirectory versions above this use 64-bit seek pointers.
const LARGE_DIRECTORY_VERSION: u16 = 1000;

/// Seek/size information from a TDirectory streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryHeader {
    /// Offset of the key list.
    pub seek_keys: u64,
    /// Size of the key list record.
    pub nbytes_keys: u32,
}

impl DirectoryHeader {
    /// Parse a TDirectory streamer at the cursor.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let _datime_c = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;

        let seek_keys = if version > LARGE_DIRECTORY_VERSION {
            let _seek_dir = r.read_u64()?;
            let _seek_parent = r.read_u64()?;
            r.read_u64()?
        } else {
            let _seek_dir = r.read_u32()?;
            let _seek_parent = r.read_u32()?;
            r.read_u32()? as u64
        };

        Ok(Self { seek_keys, nbytes_keys })
    }
}

/// Keys of one directory, in storage order.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list stored at `header.seek_keys`.
    ///
    /// The list is itself a key: a TKey header, a u32 key count, then one
    /// TKey header per object. A zero offset means the directory is empty.
    pub fn read(file_data: &[u8], header: DirectoryHeader, is_large: bool) -> Result<Self> {
        if header.seek_keys == 0 {
            return Ok(Self::default());
        }

        let mut r = RBuffer::new(file_data);
        r.seek(header.seek_keys as usize)?;
        let _list_key = Key::read(&mut r, is_large)?;

        let n_keys = r.read_u32()? as usize;
        // Key headers are at least 26 bytes; a corrupt count fails on a short read.
        let mut keys = Vec::with_capacity(n_keys.min(r.remaining() / 26));
        for _ in 0..n_keys {
            keys.push(Key::read(&mut r, is_large)?);
        }
        Ok(Self { keys })
    }

    /// All keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Key with this name and the highest cycle.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }
}
