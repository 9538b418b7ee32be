//! TKey records: the header ROOT stores in front of every object.

use crate::error::Result;
use crate::rbuffer::RBuffer;

/// Key versions above this use 64-bit seek pointers.
const LARGE_KEY_VERSION: u16 = 1000;

/// A parsed TKey header.
#[derive(Debug, Clone)]
pub struct Key {
    /// Key header plus stored (possibly compressed) object bytes.
    pub n_bytes: u32,
    /// Key class version.
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header.
    pub key_len: u16,
    /// Cycle number; higher cycles supersede lower ones.
    pub cycle: u16,
    /// Absolute file offset of this key.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public view of a key, returned by `RootFile::list_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class name (e.g. "TH1D", "TDirectoryFile").
    pub class_name: String,
    /// Object title.
    pub title: String,
    /// Cycle number.
    pub cycle: u16,
}

impl From<&Key> for KeyInfo {
    fn from(key: &Key) -> Self {
        Self {
            name: key.name.clone(),
            class_name: key.class_name.clone(),
            title: key.title.clone(),
            cycle: key.cycle,
        }
    }
}

impl Key {
    /// Read a TKey header at the cursor.
    ///
    /// `file_is_large` comes from the file header; large keys also switch to
    /// 64-bit seeks on their own.
    pub fn read(r: &mut RBuffer, file_is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let seek_key = if version > LARGE_KEY_VERSION || file_is_large {
            let seek_key = r.read_u64()?;
            let _seek_pdir = r.read_u64()?;
            seek_key
        } else {
            let seek_key = r.read_u32()? as u64;
            let _seek_pdir = r.read_u32()?;
            seek_key
        };

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key { n_bytes, version, obj_len, key_len, cycle, seek_key, class_name, name, title })
    }

    /// Whether the key holds a subdirectory.
    pub fn is_directory(&self) -> bool {
        matches!(self.class_name.as_str(), "TDirectoryFile" | "TDirectory")
    }

    /// Whether the stored object bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != self.stored_len()
    }

    /// Number of object bytes stored after the key header.
    pub fn stored_len(&self) -> usize {
        (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }
}
