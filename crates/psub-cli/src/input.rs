//! Input containers: native ROOT files or JSON histogram containers.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use psub_core::{Axis, Error, Histogram, HistogramContainer, HistogramSource, Result};
use psub_root::objects::HISTOGRAM_CLASSES;
use psub_root::{ROOT_MAGIC, RootError, RootFile};

/// An opened input file.
pub enum InputFile {
    /// ROOT file, read natively.
    Root(RootFile),
    /// `psub-histograms` JSON document.
    Json(HistogramContainer),
}

impl InputFile {
    /// Open `path`, choosing the reader from the leading magic bytes.
    pub fn open(path: &Path) -> Result<Self> {
        let mut head = Vec::with_capacity(ROOT_MAGIC.len());
        File::open(path)?.take(ROOT_MAGIC.len() as u64).read_to_end(&mut head)?;

        if head == ROOT_MAGIC {
            let f = RootFile::open(path).map_err(from_root)?;
            tracing::debug!(path = %path.display(), version = f.version(), "opened ROOT file");
            Ok(Self::Root(f))
        } else {
            Ok(Self::Json(HistogramContainer::load(path)?))
        }
    }

    /// Short name of the input format, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Json(_) => "json",
        }
    }

    /// Log every key of the input at debug level.
    pub fn log_contents(&self) -> Result<()> {
        match self {
            Self::Root(f) => {
                for key in f.list_keys().map_err(from_root)? {
                    tracing::debug!(
                        name = %key.name,
                        class = %key.class_name,
                        cycle = key.cycle,
                        title = %key.title,
                        "key"
                    );
                }
            }
            Self::Json(c) => {
                for h in c.iter() {
                    tracing::debug!(
                        name = h.name(),
                        bins = h.n_bins(),
                        title = h.title(),
                        "histogram"
                    );
                }
            }
        }
        Ok(())
    }
}

impl HistogramSource for InputFile {
    fn histogram_names(&self) -> Result<Vec<String>> {
        match self {
            Self::Root(f) => Ok(f
                .list_keys()
                .map_err(from_root)?
                .into_iter()
                .filter(|k| HISTOGRAM_CLASSES.contains(&k.class_name.as_str()))
                .map(|k| k.name)
                .collect()),
            Self::Json(c) => c.histogram_names(),
        }
    }

    fn histogram(&self, name: &str) -> Result<Histogram> {
        match self {
            Self::Root(f) => match f.get_histogram(name) {
                Ok(h) => convert(h),
                // Same as a missing key: the name does not hold a 1D histogram.
                Err(RootError::UnsupportedClass(class)) => Err(Error::HistogramNotFound(format!(
                    "{} (stored as {}, not a 1D histogram)",
                    name, class
                ))),
                Err(e) => Err(from_root(e)),
            },
            Self::Json(c) => c.histogram(name),
        }
    }
}

/// ROOT histogram to the core model; errors follow `TH1::GetBinError`.
fn convert(h: psub_root::Histogram) -> Result<Histogram> {
    let errors = h.cell_errors();
    let axis = Axis::from_edges(h.bin_edges)?;
    let mut out = Histogram::from_cells(h.name, h.title, axis, h.cells, errors)?;
    out.set_entries(h.entries);
    Ok(out)
}

fn from_root(e: RootError) -> Error {
    match e {
        RootError::Io(e) => Error::Io(e),
        RootError::KeyNotFound(name) => Error::HistogramNotFound(name),
        other => Error::Decode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use psub_root::fixture::{FixtureHistogram, RootFileBuilder};

    #[test]
    fn root_input_is_detected_and_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.root");
        RootFileBuilder::new()
            .histogram(
                FixtureHistogram::variable("sig", &[0.0, 1.0, 4.0])
                    .cells(&[1.0, 9.0, 16.0, 0.0])
                    .entries(7.0),
            )
            .histogram(
                FixtureHistogram::uniform("w", 2, 0.0, 2.0)
                    .cells(&[0.0, 2.0, 2.0, 0.0])
                    .sumw2(&[0.0, 0.25, 1.0, 0.0]),
            )
            .write(&path)
            .unwrap();

        let input = InputFile::open(&path).unwrap();
        assert_eq!(input.kind(), "root");
        assert_eq!(input.histogram_names().unwrap(), vec!["sig", "w"]);
        input.log_contents().unwrap();

        let sig = input.histogram("sig").unwrap();
        assert_eq!(sig.axis().edges(), &[0.0, 1.0, 4.0]);
        assert_eq!(sig.contents(), &[1.0, 9.0, 16.0, 0.0]);
        assert_eq!(sig.errors(), &[1.0, 3.0, 4.0, 0.0]);
        assert_relative_eq!(sig.entries(), 7.0);

        let w = input.histogram("w").unwrap();
        assert_eq!(w.bin_errors(), &[0.5, 1.0]);
    }

    #[test]
    fn json_input_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.json");
        let axis = Axis::uniform(1, 0.0, 1.0).unwrap();
        let h = Histogram::from_bins("h", "", axis, &[3.0], &[1.0]).unwrap();
        let container: HistogramContainer = std::iter::once(h).collect();
        container.save(&path, psub_core::OutputPolicy::CreateNew).unwrap();

        let input = InputFile::open(&path).unwrap();
        assert_eq!(input.kind(), "json");
        assert_eq!(input.histogram("h").unwrap().bin_contents(), &[3.0]);
    }

    #[test]
    fn lookup_and_open_failures_keep_their_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.root");
        RootFileBuilder::new()
            .histogram(FixtureHistogram::uniform("sig", 1, 0.0, 1.0))
            .write(&path)
            .unwrap();
        let input = InputFile::open(&path).unwrap();
        assert!(matches!(input.histogram("bkg"), Err(Error::HistogramNotFound(_))));

        let missing = dir.path().join("missing.root");
        assert!(matches!(InputFile::open(&missing), Err(Error::Io(_))));

        let junk = dir.path().join("junk.txt");
        std::fs::write(&junk, "not a container").unwrap();
        assert!(matches!(InputFile::open(&junk), Err(Error::Json(_))));
    }

    #[test]
    fn names_that_are_not_1d_histograms_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.root");
        RootFileBuilder::new()
            .histogram(FixtureHistogram::uniform("h2", 2, 0.0, 2.0).class("TH2D"))
            .directory("SR", vec![FixtureHistogram::uniform("sig", 1, 0.0, 1.0)])
            .write(&path)
            .unwrap();
        let input = InputFile::open(&path).unwrap();

        match input.histogram("h2") {
            Err(Error::HistogramNotFound(msg)) => assert!(msg.contains("TH2D"), "{}", msg),
            other => panic!("expected HistogramNotFound, got {:?}", other.map(|h| h.n_bins())),
        }
        assert!(matches!(input.histogram("SR"), Err(Error::HistogramNotFound(_))));
        assert!(input.histogram("SR/sig").is_ok());
        assert!(input.histogram_names().unwrap().is_empty());
    }
}
