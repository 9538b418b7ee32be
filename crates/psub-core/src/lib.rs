//! # psub-core
//!
//! Histogram model and the purity-corrected background subtraction
//! `(signal - (1 - p) * background) / p` with per-bin error propagation.
//!
//! ## Example
//!
//! ```
//! use psub_core::{Axis, CorrectionOptions, Histogram, Purity, correct};
//!
//! let axis = Axis::uniform(2, 0.0, 2.0).unwrap();
//! let sig = Histogram::from_bins("sig", "", axis.clone(), &[10.0, 20.0], &[1.0, 1.0]).unwrap();
//! let bkg = Histogram::from_bins("bkg", "", axis, &[2.0, 4.0], &[0.5, 0.5]).unwrap();
//!
//! let purity = Purity::new(0.5).unwrap();
//! let out = correct(&sig, &bkg, purity, &CorrectionOptions::default()).unwrap();
//! assert_eq!(out.bin_contents(), &[18.0, 36.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod container;
pub mod correction;
pub mod error;
pub mod histogram;
pub mod purity;

pub use container::{
    CONTAINER_FORMAT, CONTAINER_VERSION, HistogramContainer, HistogramSource, OutputPolicy,
};
pub use correction::{
    AxisCheck, CorrectionOptions, CorrectionSummary, ErrorModel, correct, correct_bin,
    processed_bins,
};
pub use error::{Error, Result};
pub use histogram::{Axis, Histogram};
pub use purity::Purity;
