//! Synthetic ROOT files for tests.
//!
//! Produces the subset of the on-disk format the reader understands: small
//! (32-bit seek) file header, top-level key list, `TDirectoryFile`
//! subdirectories, and TH1 objects stored plain or zlib-compressed. Not meant
//! to be opened by ROOT itself.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;

use crate::decompress;
use crate::rbuffer::BYTE_COUNT_MASK;

/// Offset of the first record.
const BEGIN: usize = 100;
/// Size reserved for the (unread) file name record.
const NBYTES_NAME: usize = 40;
/// Space reserved for the top-level TDirectory streamer.
const DIRECTORY_SLOT: usize = 64;

/// Description of one TH1 object.
#[derive(Debug, Clone)]
pub struct FixtureHistogram {
    name: String,
    title: String,
    class_name: String,
    n_bins: usize,
    x_min: f64,
    x_max: f64,
    variable_edges: Vec<f64>,
    cells: Vec<f64>,
    sumw2: Vec<f64>,
    entries: Option<f64>,
}

impl FixtureHistogram {
    /// Empty TH1D with uniform binning.
    pub fn uniform(name: &str, n_bins: usize, x_min: f64, x_max: f64) -> Self {
        Self {
            name: name.to_string(),
            title: String::new(),
            class_name: "TH1D".to_string(),
            n_bins,
            x_min,
            x_max,
            variable_edges: Vec::new(),
            cells: vec![0.0; n_bins + 2],
            sumw2: Vec::new(),
            entries: None,
        }
    }

    /// Empty TH1D with explicit bin edges.
    pub fn variable(name: &str, edges: &[f64]) -> Self {
        let n_bins = edges.len() - 1;
        Self {
            variable_edges: edges.to_vec(),
            ..Self::uniform(name, n_bins, edges[0], edges[n_bins])
        }
    }

    /// Set the title.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Store as another TH1 class (`TH1F`, `TH1I`, `TH1S`).
    pub fn class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    /// All cells, underflow first (`n_bins + 2` values).
    pub fn cells(mut self, cells: &[f64]) -> Self {
        assert_eq!(cells.len(), self.n_bins + 2, "cells must include both flow cells");
        self.cells = cells.to_vec();
        self
    }

    /// Regular bins only; flow cells stay zero.
    pub fn bins(mut self, bins: &[f64]) -> Self {
        assert_eq!(bins.len(), self.n_bins, "one value per bin");
        self.cells[1..=self.n_bins].copy_from_slice(bins);
        self
    }

    /// Per-cell sum of squared weights (`n_bins + 2` values).
    pub fn sumw2(mut self, sumw2: &[f64]) -> Self {
        assert_eq!(sumw2.len(), self.n_bins + 2, "sumw2 must include both flow cells");
        self.sumw2 = sumw2.to_vec();
        self
    }

    /// Override `fEntries` (defaults to the sum of regular bins).
    pub fn entries(mut self, entries: f64) -> Self {
        self.entries = Some(entries);
        self
    }

    /// Object name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

enum Entry {
    Histogram(FixtureHistogram),
    Directory(String, Vec<FixtureHistogram>),
}

/// Assembles a complete ROOT file image.
#[derive(Default)]
pub struct RootFileBuilder {
    entries: Vec<Entry>,
    zlib: bool,
}

impl RootFileBuilder {
    /// Empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level histogram. Repeating a name adds a higher cycle.
    pub fn histogram(mut self, h: FixtureHistogram) -> Self {
        self.entries.push(Entry::Histogram(h));
        self
    }

    /// Add a subdirectory holding `histograms`.
    pub fn directory(mut self, name: &str, histograms: Vec<FixtureHistogram>) -> Self {
        self.entries.push(Entry::Directory(name.to_string(), histograms));
        self
    }

    /// Store histogram payloads zlib-compressed.
    pub fn zlib(mut self) -> Self {
        self.zlib = true;
        self
    }

    /// Write the file image to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }

    /// Serialize the whole file.
    pub fn build(&self) -> Vec<u8> {
        let mut w = Out::default();
        w.buf.resize(BEGIN + NBYTES_NAME + DIRECTORY_SLOT, 0);

        let mut cycles: HashMap<String, u16> = HashMap::new();
        let mut next_cycle = |name: &str| {
            let c = cycles.entry(name.to_string()).or_insert(0);
            *c += 1;
            *c
        };

        let mut top_keys = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Histogram(h) => {
                    let cycle = next_cycle(h.name.as_str());
                    top_keys.push(self.write_histogram(&mut w, h, cycle));
                }
                Entry::Directory(name, histograms) => {
                    let sub_keys: Vec<Vec<u8>> =
                        histograms.iter().map(|h| self.write_histogram(&mut w, h, 1)).collect();
                    let (seek_keys, nbytes_keys) = write_key_list(&mut w, &sub_keys);
                    let payload = directory_record(seek_keys, nbytes_keys);
                    let cycle = next_cycle(name.as_str());
                    top_keys.push(write_object(
                        &mut w,
                        ObjectKey {
                            class_name: "TDirectoryFile",
                            name: name.as_str(),
                            title: name.as_str(),
                            cycle,
                        },
                        &payload,
                        false,
                    ));
                }
            }
        }

        let (seek_keys, nbytes_keys) = write_key_list(&mut w, &top_keys);
        let dir = directory_record(seek_keys, nbytes_keys);
        let dir_pos = BEGIN + NBYTES_NAME;
        w.buf[dir_pos..dir_pos + dir.len()].copy_from_slice(&dir);

        let end = w.buf.len() as u32;
        let mut header = Out::default();
        header.buf.extend_from_slice(b"root");
        header.u32(62_206); // fVersion (small file)
        header.u32(BEGIN as u32);
        header.u32(end);
        header.u32(0); // fSeekFree
        header.u32(0); // fNbytesFree
        header.u32(0); // nfree
        header.u32(NBYTES_NAME as u32);
        header.u8(4); // fUnits
        header.u32(if self.zlib { 101 } else { 0 });
        header.u32(0); // fSeekInfo
        header.u32(0); // fNbytesInfo
        header.buf.extend_from_slice(&[0u8; 18]); // fUUID
        w.buf[..header.buf.len()].copy_from_slice(&header.buf);

        w.buf
    }

    fn write_histogram(&self, w: &mut Out, h: &FixtureHistogram, cycle: u16) -> Vec<u8> {
        let key = ObjectKey { class_name: &h.class_name, name: &h.name, title: &h.title, cycle };
        write_object(w, key, &th1_payload(h), self.zlib)
    }
}

/// Streamed bytes of a TH1 object, as stored after its key header.
pub fn th1_payload(h: &FixtureHistogram) -> Vec<u8> {
    let n_cells = h.n_bins + 2;
    let entries = h.entries.unwrap_or_else(|| h.cells[1..=h.n_bins].iter().sum());

    let mut w = Out::default();
    w.object(3, |w| {
        w.object(8, |w| {
            w.tnamed(&h.name, &h.title);
            w.object(2, |w| {
                w.i16(602);
                w.i16(1);
                w.i16(1);
            });
            w.object(2, |w| {
                w.i16(0);
                w.i16(1001);
            });
            w.object(2, |w| {
                w.i16(1);
                w.i16(1);
                w.f32(1.0);
            });
            w.i32(n_cells as i32);
            w.taxis("xaxis", h.n_bins, h.x_min, h.x_max, &h.variable_edges);
            w.taxis("yaxis", 1, 0.0, 1.0, &[]);
            w.taxis("zaxis", 1, 0.0, 1.0, &[]);
            w.i16(0); // fBarOffset
            w.i16(1000); // fBarWidth
            w.f64(entries);
            for _ in 0..4 {
                w.f64(0.0); // fTsumw, fTsumw2, fTsumwx, fTsumwx2
            }
            w.f64(-1111.0); // fMaximum
            w.f64(-1111.0); // fMinimum
            w.f64(0.0); // fNormFactor
            w.u32(0); // fContour
            w.u32(h.sumw2.len() as u32);
            h.sumw2.iter().for_each(|&v| w.f64(v));
            w.string(""); // fOption
            w.object(5, |w| {
                w.tobject();
                w.string("");
                w.i32(0);
            });
            w.i32(0); // fBufferSize
            w.i32(0); // fBinStatErrOpt
            w.i32(2); // fStatOverflows
        });
        w.u32(n_cells as u32);
        for &v in &h.cells {
            match h.class_name.as_str() {
                "TH1F" => w.f32(v as f32),
                "TH1I" => w.i32(v as i32),
                "TH1S" => w.i16(v as i16),
                _ => w.f64(v),
            }
        }
    });
    w.buf
}

struct ObjectKey<'a> {
    class_name: &'a str,
    name: &'a str,
    title: &'a str,
    cycle: u16,
}

/// Append a key and its object; returns the key header for the key list.
fn write_object(w: &mut Out, key: ObjectKey<'_>, payload: &[u8], zlib: bool) -> Vec<u8> {
    let stored = if zlib { zlib_block(payload) } else { payload.to_vec() };
    let header = key_header(&key, w.buf.len(), stored.len(), payload.len());
    w.buf.extend_from_slice(&header);
    w.buf.extend_from_slice(&stored);
    header
}

/// Append a key list record; returns `(seek_keys, nbytes_keys)`.
fn write_key_list(w: &mut Out, headers: &[Vec<u8>]) -> (usize, usize) {
    let mut body = Out::default();
    body.u32(headers.len() as u32);
    for h in headers {
        body.buf.extend_from_slice(h);
    }

    let seek = w.buf.len();
    let list_key = ObjectKey { class_name: "TDirectory", name: "", title: "", cycle: 1 };
    let header = key_header(&list_key, seek, body.buf.len(), body.buf.len());
    w.buf.extend_from_slice(&header);
    w.buf.extend_from_slice(&body.buf);
    (seek, w.buf.len() - seek)
}

fn key_header(key: &ObjectKey<'_>, seek_key: usize, stored_len: usize, obj_len: usize) -> Vec<u8> {
    let mut h = Out::default();
    h.u32(0); // fNbytes, patched below
    h.u16(4); // small key
    h.u32(obj_len as u32);
    h.u32(0); // fDatime
    h.u16(0); // fKeylen, patched below
    h.u16(key.cycle);
    h.u32(seek_key as u32);
    h.u32(BEGIN as u32); // fSeekPdir
    h.string(key.class_name);
    h.string(key.name);
    h.string(key.title);

    let key_len = h.buf.len();
    h.buf[0..4].copy_from_slice(&((key_len + stored_len) as u32).to_be_bytes());
    h.buf[14..16].copy_from_slice(&(key_len as u16).to_be_bytes());
    h.buf
}

fn directory_record(seek_keys: usize, nbytes_keys: usize) -> Vec<u8> {
    let mut d = Out::default();
    d.u16(5);
    d.u32(0); // fDatimeC
    d.u32(0); // fDatimeM
    d.u32(nbytes_keys as u32);
    d.u32(NBYTES_NAME as u32);
    d.u32(BEGIN as u32); // fSeekDir
    d.u32(0); // fSeekParent
    d.u32(seek_keys as u32);
    d.buf
}

fn zlib_block(payload: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    enc.write_all(payload).expect("writing to a Vec cannot fail");
    let compressed = enc.finish().expect("writing to a Vec cannot fail");
    decompress::block(b"ZL", 8, &compressed, payload.len())
}

#[derive(Default)]
struct Out {
    buf: Vec<u8>,
}

impl Out {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }
    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn string(&mut self, s: &str) {
        if s.len() < 255 {
            self.u8(s.len() as u8);
        } else {
            self.u8(255);
            self.u32(s.len() as u32);
        }
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Versioned object with a byte count.
    fn object(&mut self, version: u16, body: impl FnOnce(&mut Self)) {
        let start = self.buf.len();
        self.u32(0);
        self.u16(version);
        body(self);
        let byte_count = (self.buf.len() - start - 4) as u32;
        self.buf[start..start + 4].copy_from_slice(&(BYTE_COUNT_MASK | byte_count).to_be_bytes());
    }

    fn tobject(&mut self) {
        self.u16(1);
        self.u32(0); // fUniqueID
        self.u32(0x0300_0000); // kNotDeleted | kIsOnHeap
    }

    fn tnamed(&mut self, name: &str, title: &str) {
        self.object(1, |w| {
            w.tobject();
            w.string(name);
            w.string(title);
        });
    }

    fn taxis(&mut self, name: &str, n_bins: usize, x_min: f64, x_max: f64, edges: &[f64]) {
        self.object(10, |w| {
            w.tnamed(name, "");
            w.object(4, |w| {
                w.i32(510); // fNdivisions
                w.i16(1); // fAxisColor
                w.i16(1); // fLabelColor
                w.i16(42); // fLabelFont
                w.f32(0.005); // fLabelOffset
                w.f32(0.035); // fLabelSize
                w.f32(0.03); // fTickLength
                w.f32(1.0); // fTitleOffset
                w.f32(0.035); // fTitleSize
                w.i16(1); // fTitleColor
                w.i16(42); // fTitleFont
            });
            w.i32(n_bins as i32);
            w.f64(x_min);
            w.f64(x_max);
            w.u32(edges.len() as u32);
            edges.iter().for_each(|&e| w.f64(e));
            w.i32(0); // fFirst
            w.i32(0); // fLast
            w.u16(0); // fBits2
            w.u8(0); // fTimeDisplay
            w.string(""); // fTimeFormat
        });
    }
}
