//! # psub-root
//!
//! Native ROOT file reader for 1D histograms.
//!
//! Reads TH1D/TH1F/TH1I/TH1S objects, including under/overflow cells and
//! `fSumw2`, from `.root` files without external ROOT libraries. Supports
//! zlib, LZ4, ZSTD, and XZ compressed keys and `TDirectoryFile`
//! subdirectories.
//!
//! ## Example
//!
//! ```no_run
//! use psub_root::RootFile;
//!
//! let f = RootFile::open("data.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{} ({})", key.name, key.class_name);
//! }
//! let h = f.get_histogram("SR/signal").unwrap();
//! println!("bins: {}, entries: {}", h.n_bins, h.entries);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;

pub use error::{Result, RootError};
pub use file::{ROOT_MAGIC, RootFile};
pub use histogram::Histogram;
pub use key::KeyInfo;
