//! ROOT object deserialization dispatch.

mod th1;

use crate::error::{Result, RootError};
use crate::histogram::Histogram;

pub use th1::CellType;

/// Classes [`read_histogram`] can decode.
pub const HISTOGRAM_CLASSES: &[&str] = &["TH1D", "TH1F", "TH1I", "TH1S"];

/// Decode a histogram from a decompressed object payload, given its class name.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<Histogram> {
    let cell_type = match class_name {
        "TH1D" => CellType::F64,
        "TH1F" => CellType::F32,
        "TH1I" => CellType::I32,
        "TH1S" => CellType::I16,
        _ => return Err(RootError::UnsupportedClass(class_name.to_string())),
    };
    th1::read_th1(payload, class_name, cell_type)
}
