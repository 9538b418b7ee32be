//! TFile header parsing and the top-level reader interface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::datasource::DataSource;
use crate::decompress::decompress;
use crate::directory::{Directory, DirectoryHeader};
use crate::error::{Result, RootError};
use crate::histogram::Histogram;
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;

/// First four bytes of every ROOT file.
pub const ROOT_MAGIC: &[u8; 4] = b"root";

/// Shortest byte image that can hold a file header.
const MIN_FILE_LEN: usize = 64;

/// File versions at or above this use 64-bit seek pointers.
const LARGE_FILE_VERSION: u32 = 1_000_000;

/// Fields of the file header needed to find the top-level directory.
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    version: u32,
    is_large: bool,
    top_dir: DirectoryHeader,
}

/// A ROOT file opened for reading histograms.
pub struct RootFile {
    data: DataSource,
    header: FileHeader,
    path: PathBuf,
}

impl RootFile {
    /// Memory-map and parse a ROOT file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        let data = DataSource::map(&file)?;
        Self::from_datasource(data, path)
    }

    /// Parse a ROOT file image held in memory. `path` is used in diagnostics only.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::from(data), path)
    }

    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < MIN_FILE_LEN || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = parse_header(&data)?;
        Ok(Self { data, header, path })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ROOT format version from the file header.
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Keys in the top-level directory, in storage order.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        let dir = self.top_directory()?;
        Ok(dir.keys().iter().map(KeyInfo::from).collect())
    }

    /// Read a histogram by path, e.g. `"signal"` or `"SR/signal"`.
    ///
    /// Each path component but the last names a subdirectory. When a name is
    /// stored under several cycles the highest one is read.
    pub fn get_histogram(&self, path: &str) -> Result<Histogram> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((name, dirs)) = parts.split_last() else {
            return Err(RootError::KeyNotFound(path.to_string()));
        };

        let mut dir = self.top_directory()?;
        for &part in dirs {
            let key = dir
                .find_key(part)
                .ok_or_else(|| RootError::KeyNotFound(format!("{} (in path {})", part, path)))?;
            if !key.is_directory() {
                return Err(RootError::Deserialization(format!(
                    "'{}' is not a directory (class: {})",
                    part, key.class_name
                )));
            }
            dir = self.subdirectory(key)?;
        }

        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram(&payload, &key.class_name)
    }

    fn top_directory(&self) -> Result<Directory> {
        Directory::read(&self.data, self.header.top_dir, self.header.is_large)
    }

    fn subdirectory(&self, key: &Key) -> Result<Directory> {
        let payload = self.read_key_payload(key)?;
        let header = DirectoryHeader::read(&mut RBuffer::new(&payload))?;
        Directory::read(&self.data, header, self.header.is_large)
    }

    /// Object bytes stored behind `key`, decompressed when needed.
    fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        let start = usize::try_from(key.seek_key)
            .ok()
            .and_then(|s| s.checked_add(key.key_len as usize))
            .ok_or_else(|| {
                RootError::Deserialization(format!("key '{}' seek out of range", key.name))
            })?;
        let stored_len = key.stored_len();
        let stored = start
            .checked_add(stored_len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| RootError::BufferUnderflow {
                offset: start,
                need: stored_len,
                have: self.data.len().saturating_sub(start),
            })?;

        if key.is_compressed() {
            decompress(stored, key.obj_len as usize)
        } else {
            Ok(stored.to_vec())
        }
    }
}

/// Parse the file header and the TDirectory streamer at `fBEGIN + fNbytesName`.
///
/// Small-file layout (64-bit files widen `fEND`, `fSeekFree`, `fSeekInfo`):
/// ```text
///  0  magic "root"     4  fVersion     8  fBEGIN     12  fEND
/// 16  fSeekFree       20  fNbytesFree 24  nfree      28  fNbytesName
/// 32  fUnits (u8)     33  fCompress   37  fSeekInfo  41  fNbytesInfo
/// 45  fUUID (18 bytes)
/// ```
fn parse_header(data: &[u8]) -> Result<FileHeader> {
    let mut r = RBuffer::new(data);
    r.skip(ROOT_MAGIC.len())?;

    let version = r.read_u32()?;
    let is_large = version >= LARGE_FILE_VERSION;
    let begin = r.read_u32()? as usize;
    if is_large {
        r.skip(16)?; // fEND, fSeekFree
    } else {
        r.skip(8)?;
    }
    let _nbytes_free = r.read_u32()?;
    let _nfree = r.read_u32()?;
    let nbytes_name = r.read_u32()? as usize;

    let dir_offset = begin.checked_add(nbytes_name).filter(|&o| o < data.len()).ok_or_else(|| {
        RootError::Deserialization("top-level directory offset past end of file".into())
    })?;
    r.seek(dir_offset)?;
    let top_dir = DirectoryHeader::read(&mut r)?;

    Ok(FileHeader { version, is_large, top_dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureHistogram, RootFileBuilder};
    use approx::assert_relative_eq;

    fn sig() -> FixtureHistogram {
        FixtureHistogram::uniform("sig", 3, 0.0, 3.0)
            .title("signal")
            .cells(&[1.0, 10.0, 20.0, 30.0, 2.0])
    }

    fn open(builder: RootFileBuilder) -> RootFile {
        RootFile::from_bytes(builder.build(), PathBuf::from("test.root")).unwrap()
    }

    #[test]
    fn lists_top_level_keys() {
        let f = open(
            RootFileBuilder::new()
                .histogram(sig())
                .histogram(FixtureHistogram::uniform("bkg", 3, 0.0, 3.0).class("TH1F")),
        );
        let keys = f.list_keys().unwrap();
        let names: Vec<_> = keys.iter().map(|k| (k.name.as_str(), k.class_name.as_str())).collect();
        assert_eq!(names, vec![("sig", "TH1D"), ("bkg", "TH1F")]);
        assert_eq!(keys[0].title, "signal");
        assert_eq!(f.version(), 62_206);
        assert_eq!(f.path(), Path::new("test.root"));
    }

    #[test]
    fn reads_uncompressed_histogram() {
        let f = open(RootFileBuilder::new().histogram(sig()));
        let h = f.get_histogram("sig").unwrap();
        assert_eq!(h.n_bins, 3);
        assert_eq!(h.bin_content(), &[10.0, 20.0, 30.0]);
        assert_eq!(h.underflow(), 1.0);
        assert_eq!(h.overflow(), 2.0);
        assert_relative_eq!(h.entries, 60.0);
    }

    #[test]
    fn reads_zlib_compressed_histogram() {
        let wide = FixtureHistogram::uniform("wide", 200, -1.0, 1.0).bins(&vec![4.0; 200]);
        let f = open(RootFileBuilder::new().histogram(wide).zlib());
        let h = f.get_histogram("wide").unwrap();
        assert_eq!(h.n_bins, 200);
        assert!(h.bin_content().iter().all(|&c| c == 4.0));
        assert_relative_eq!(h.bin_edges[100], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn navigates_subdirectories() {
        let f = open(
            RootFileBuilder::new()
                .histogram(sig())
                .directory(
                    "SR",
                    vec![FixtureHistogram::uniform("sig", 2, 0.0, 1.0).bins(&[5.0, 6.0])],
                ),
        );
        let inner = f.get_histogram("SR/sig").unwrap();
        assert_eq!(inner.bin_content(), &[5.0, 6.0]);
        let outer = f.get_histogram("/sig").unwrap();
        assert_eq!(outer.n_bins, 3);

        assert!(matches!(f.get_histogram("sig/x"), Err(RootError::Deserialization(_))));
        assert!(matches!(f.get_histogram("CR/sig"), Err(RootError::KeyNotFound(_))));
    }

    #[test]
    fn highest_cycle_wins() {
        let f = open(
            RootFileBuilder::new()
                .histogram(FixtureHistogram::uniform("h", 1, 0.0, 1.0).bins(&[1.0]))
                .histogram(FixtureHistogram::uniform("h", 1, 0.0, 1.0).bins(&[2.0])),
        );
        let cycles: Vec<u16> = f.list_keys().unwrap().iter().map(|k| k.cycle).collect();
        assert_eq!(cycles, vec![1, 2]);
        assert_eq!(f.get_histogram("h").unwrap().bin_content(), &[2.0]);
    }

    #[test]
    fn missing_key_and_empty_path() {
        let f = open(RootFileBuilder::new().histogram(sig()));
        assert!(matches!(f.get_histogram("nope"), Err(RootError::KeyNotFound(_))));
        assert!(matches!(f.get_histogram(""), Err(RootError::KeyNotFound(_))));
    }

    #[test]
    fn empty_file_has_no_keys() {
        let f = open(RootFileBuilder::new());
        assert!(f.list_keys().unwrap().is_empty());
    }

    #[test]
    fn rejects_non_root_bytes() {
        let err = RootFile::from_bytes(b"{\"format\": \"psub-histograms\"}".to_vec(), "x".into());
        assert!(matches!(err, Err(RootError::BadMagic)));
        let mut bytes = RootFileBuilder::new().histogram(sig()).build();
        bytes[0] = b'R';
        assert!(matches!(RootFile::from_bytes(bytes, "x".into()), Err(RootError::BadMagic)));
    }

    #[test]
    fn truncated_file_fails_cleanly() {
        let bytes = RootFileBuilder::new().histogram(sig()).build();
        let cut = bytes[..bytes.len() - 10].to_vec();
        let f = RootFile::from_bytes(cut, "cut.root".into()).unwrap();
        assert!(f.list_keys().is_err());
    }

    #[test]
    fn opens_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hists.root");
        RootFileBuilder::new().histogram(sig()).zlib().write(&path).unwrap();
        let f = RootFile::open(&path).unwrap();
        assert_eq!(f.get_histogram("sig").unwrap().bin_content(), &[10.0, 20.0, 30.0]);
    }
}
