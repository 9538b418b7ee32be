//! Named-histogram containers.
//!
//! [`HistogramSource`] is the lookup seam the driver reads inputs through.
//! [`HistogramContainer`] is the native JSON container used for output (and
//! accepted as input):
//!
//! ```json
//! {
//!   "format": "psub-histograms",
//!   "version": 1,
//!   "histograms": [
//!     { "name": "h", "title": "", "axis": { "edges": [0.0, 1.0] },
//!       "contents": [0.0, 5.0, 0.0], "errors": [0.0, 2.2, 0.0], "entries": 5.0 }
//!   ]
//! }
//! ```
//!
//! `contents` and `errors` carry all cells, underflow first. Non-finite values
//! are written as the strings `"nan"`, `"inf"` and `"-inf"`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::histogram::{Axis, Histogram};

/// Format tag written to every container document.
pub const CONTAINER_FORMAT: &str = "psub-histograms";
/// Container document version.
pub const CONTAINER_VERSION: u32 = 1;

/// Anything histograms can be looked up in by name.
pub trait HistogramSource {
    /// Names of all histograms available, in storage order.
    fn histogram_names(&self) -> Result<Vec<String>>;

    /// Load a histogram by name.
    ///
    /// Returns [`Error::HistogramNotFound`] when no histogram has that name.
    fn histogram(&self, name: &str) -> Result<Histogram>;
}

/// What to do when the output path already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Fail with [`Error::OutputExists`].
    #[default]
    CreateNew,
    /// Truncate and replace.
    Overwrite,
}

/// In-memory set of uniquely named histograms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramContainer {
    histograms: Vec<Histogram>,
}

impl HistogramContainer {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a histogram, replacing any earlier one with the same name.
    pub fn insert(&mut self, histogram: Histogram) {
        match self.histograms.iter_mut().find(|h| h.name() == histogram.name()) {
            Some(slot) => *slot = histogram,
            None => self.histograms.push(histogram),
        }
    }

    /// Histogram by name.
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.name() == name)
    }

    /// Number of histograms.
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether the container holds no histograms.
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Iterate histograms in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.iter()
    }

    /// Parse a container document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: ContainerDoc = serde_json::from_str(text)?;
        if doc.format != CONTAINER_FORMAT {
            return Err(Error::Format(format!(
                "expected format '{}', found '{}'",
                CONTAINER_FORMAT, doc.format
            )));
        }
        if doc.version != CONTAINER_VERSION {
            return Err(Error::Format(format!(
                "unsupported version {} (expected {})",
                doc.version, CONTAINER_VERSION
            )));
        }

        let mut container = Self::new();
        for record in doc.histograms {
            container.insert(record.into_histogram()?);
        }
        Ok(container)
    }

    /// Serialize to a pretty-printed container document.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_doc())?)
    }

    /// Read a container file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let container = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), histograms = container.len(), "loaded container");
        Ok(container)
    }

    /// Write a container file, flushed and synced to disk before returning.
    pub fn save(&self, path: impl AsRef<Path>, policy: OutputPolicy) -> Result<()> {
        let path = path.as_ref();
        let file = open_output(path, policy)?;

        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &self.to_doc())?;
        w.write_all(b"\n")?;
        let file = w.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        tracing::debug!(path = %path.display(), histograms = self.len(), "wrote container");
        Ok(())
    }

    fn to_doc(&self) -> ContainerDoc {
        ContainerDoc {
            format: CONTAINER_FORMAT.to_string(),
            version: CONTAINER_VERSION,
            histograms: self.histograms.iter().map(HistogramRecord::from_histogram).collect(),
        }
    }
}

impl FromIterator<Histogram> for HistogramContainer {
    fn from_iter<I: IntoIterator<Item = Histogram>>(iter: I) -> Self {
        let mut container = Self::new();
        for h in iter {
            container.insert(h);
        }
        container
    }
}

impl HistogramSource for HistogramContainer {
    fn histogram_names(&self) -> Result<Vec<String>> {
        Ok(self.histograms.iter().map(|h| h.name().to_string()).collect())
    }

    fn histogram(&self, name: &str) -> Result<Histogram> {
        self.get(name).cloned().ok_or_else(|| Error::HistogramNotFound(name.to_string()))
    }
}

fn open_output(path: &Path, policy: OutputPolicy) -> Result<File> {
    let opened = match policy {
        OutputPolicy::CreateNew => OpenOptions::new().write(true).create_new(true).open(path),
        OutputPolicy::Overwrite => File::create(path),
    };
    opened.map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => Error::OutputExists(path.to_path_buf()),
        _ => Error::Io(e),
    })
}

// ── on-disk representation ──────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct ContainerDoc {
    format: String,
    version: u32,
    #[serde(default)]
    histograms: Vec<HistogramRecord>,
}

#[derive(Serialize, Deserialize)]
struct HistogramRecord {
    name: String,
    #[serde(default)]
    title: String,
    axis: AxisRecord,
    #[serde(with = "cells")]
    contents: Vec<f64>,
    #[serde(with = "cells")]
    errors: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entries: Option<f64>,
}

/// Axes are always written as explicit edges; uniform binning is also read.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AxisRecord {
    Edges { edges: Vec<f64> },
    Uniform { n_bins: usize, x_min: f64, x_max: f64 },
}

impl HistogramRecord {
    fn from_histogram(h: &Histogram) -> Self {
        Self {
            name: h.name().to_string(),
            title: h.title().to_string(),
            axis: AxisRecord::Edges { edges: h.axis().edges().to_vec() },
            contents: h.contents().to_vec(),
            errors: h.errors().to_vec(),
            entries: Some(h.entries()),
        }
    }

    fn into_histogram(self) -> Result<Histogram> {
        let axis = match self.axis {
            AxisRecord::Edges { edges } => Axis::from_edges(edges),
            AxisRecord::Uniform { n_bins, x_min, x_max } => Axis::uniform(n_bins, x_min, x_max),
        }
        .map_err(|e| Error::Validation(format!("histogram '{}': {}", self.name, e)))?;

        let mut h = Histogram::from_cells(self.name, self.title, axis, self.contents, self.errors)?;
        if let Some(entries) = self.entries {
            h.set_entries(entries);
        }
        Ok(h)
    }
}

/// Cell arrays that survive NaN and ±inf.
mod cells {
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    struct Cell(f64);

    impl Serialize for Cell {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            let v = self.0;
            if v.is_finite() {
                s.serialize_f64(v)
            } else if v.is_nan() {
                s.serialize_str("nan")
            } else if v > 0.0 {
                s.serialize_str("inf")
            } else {
                s.serialize_str("-inf")
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CellRepr {
        // `null` is what serde_json writes for NaN elsewhere.
        Number(Option<f64>),
        Tagged(String),
    }

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for &v in values {
            seq.serialize_element(&Cell(v))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let raw = Vec::<CellRepr>::deserialize(d)?;
        raw.into_iter()
            .map(|c| match c {
                CellRepr::Number(Some(v)) => Ok(v),
                CellRepr::Number(None) => Ok(f64::NAN),
                CellRepr::Tagged(t) => match t.to_ascii_lowercase().as_str() {
                    "nan" => Ok(f64::NAN),
                    "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                    "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                    _ => Err(D::Error::custom(format!("invalid cell value '{}'", t))),
                },
            })
            .collect()
    }
}
