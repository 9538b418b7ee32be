//! TH1D/TH1F/TH1I/TH1S deserialization.
//!
//! Streamer layout (every nested object carries a byte count):
//! ```text
//! TH1x
//!   ├─ TH1
//!   │    ├─ TNamed (name, title)
//!   │    ├─ TAttLine, TAttFill, TAttMarker   skipped
//!   │    ├─ fNcells (i32)
//!   │    ├─ fXaxis (TAxis: TNamed, TAttAxis, fNbins, fXmin, fXmax, fXbins, ...)
//!   │    ├─ fYaxis, fZaxis                   skipped
//!   │    ├─ fBarOffset, fBarWidth (i16)
//!   │    ├─ fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2 (f64)
//!   │    ├─ fMaximum, fMinimum (v >= 2), fNormFactor (v >= 3)
//!   │    ├─ fContour (TArrayD), fSumw2 (TArrayD)
//!   │    ├─ fOption (TString), fFunctions (TList)
//!   │    └─ ...                              skipped via byte count
//!   └─ TArrayD / TArrayF / TArrayI / TArrayS  cells, flows included
//! ```

use crate::error::{Result, RootError};
use crate::histogram::Histogram;
use crate::rbuffer::RBuffer;

/// Storage type of the cell array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    /// `TArrayD`
    F64,
    /// `TArrayF`
    F32,
    /// `TArrayI`
    I32,
    /// `TArrayS`
    I16,
}

struct AxisInfo {
    n_bins: usize,
    x_min: f64,
    x_max: f64,
    /// Variable-width edges; empty for uniform binning.
    edges: Vec<f64>,
}

struct Th1Base {
    name: String,
    title: String,
    n_cells: usize,
    axis: AxisInfo,
    entries: f64,
    sumw2: Vec<f64>,
}

/// Decode a TH1 subclass whose cells are stored as `cell_type`.
pub(super) fn read_th1(data: &[u8], class_name: &str, cell_type: CellType) -> Result<Histogram> {
    let mut r = RBuffer::new(data);

    let (version, _end) = r.read_version()?;
    if version < 1 {
        return Err(RootError::Deserialization(format!(
            "unsupported {} version: {}",
            class_name, version
        )));
    }

    let base = read_th1_base(&mut r)?;

    let n = r.read_u32()? as usize;
    if n != base.n_cells {
        return Err(RootError::Deserialization(format!(
            "{} '{}': cell array holds {} values, fNcells is {}",
            class_name, base.name, n, base.n_cells
        )));
    }
    let cells = match cell_type {
        CellType::F64 => r.read_array_f64(n)?,
        CellType::F32 => r.read_array_f32(n)?,
        CellType::I32 => r.read_array_i32(n)?,
        CellType::I16 => r.read_array_i16(n)?,
    };

    build_histogram(base, class_name, cells)
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (version, end) = r.read_version()?;

    let (name, title) = r.read_tnamed()?;
    r.skip_object("TAttLine")?;
    r.skip_object("TAttFill")?;
    r.skip_object("TAttMarker")?;

    let n_cells = r.read_i32()?;
    if n_cells < 3 {
        return Err(RootError::Deserialization(format!(
            "TH1 '{}': fNcells = {} (need at least 3)",
            name, n_cells
        )));
    }

    let axis = read_taxis(r)?;
    r.skip_object("TAxis fYaxis")?;
    r.skip_object("TAxis fZaxis")?;

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    let entries = r.read_f64()?;
    // fTsumw, fTsumw2, fTsumwx, fTsumwx2
    r.skip(4 * 8)?;
    if version >= 2 {
        // fMaximum, fMinimum
        r.skip(2 * 8)?;
    }
    if version >= 3 {
        let _norm_factor = r.read_f64()?;
    }

    let _contour = r.read_tarray_f64()?;
    let sumw2 = r.read_tarray_f64()?;
    let _option = r.read_string()?;
    r.skip_object("TList fFunctions")?;

    // fBufferSize/fBuffer and the stat flags follow; nothing here needs them.
    match end {
        Some(end) => r.seek(end)?,
        None => {
            return Err(RootError::Deserialization(format!(
                "TH1 '{}' (version {}) written without byte count",
                name, version
            )));
        }
    }

    Ok(Th1Base { name, title, n_cells: n_cells as usize, axis, entries, sumw2 })
}

fn read_taxis(r: &mut RBuffer) -> Result<AxisInfo> {
    let (_version, end) = r.read_version()?;

    let (_name, _title) = r.read_tnamed()?;
    r.skip_object("TAttAxis")?;

    let n_bins = r.read_i32()?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let edges = r.read_tarray_f64()?;

    // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs
    if let Some(end) = end {
        r.seek(end)?;
    }

    if n_bins < 1 {
        return Err(RootError::Deserialization(format!("TAxis with {} bins", n_bins)));
    }
    Ok(AxisInfo { n_bins: n_bins as usize, x_min, x_max, edges })
}

fn build_histogram(base: Th1Base, class_name: &str, cells: Vec<f64>) -> Result<Histogram> {
    let Th1Base { name, title, n_cells, axis, entries, sumw2 } = base;
    let n_bins = axis.n_bins;

    if n_cells != n_bins + 2 {
        return Err(RootError::Deserialization(format!(
            "'{}': fNcells {} does not match {} x-bins (1D histograms only)",
            name, n_cells, n_bins
        )));
    }

    let bin_edges = if axis.edges.is_empty() {
        let width = (axis.x_max - axis.x_min) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| axis.x_min + i as f64 * width).collect();
        edges.push(axis.x_max);
        edges
    } else if axis.edges.len() == n_bins + 1 {
        axis.edges
    } else {
        return Err(RootError::Deserialization(format!(
            "'{}': {} variable bin edges for {} bins",
            name,
            axis.edges.len(),
            n_bins
        )));
    };

    let sumw2 = match sumw2.len() {
        0 => None,
        n if n == n_cells => Some(sumw2),
        n => {
            return Err(RootError::Deserialization(format!(
                "'{}': fSumw2 holds {} values for {} cells",
                name, n, n_cells
            )));
        }
    };

    Ok(Histogram {
        name,
        title,
        class_name: class_name.to_string(),
        n_bins,
        x_min: axis.x_min,
        x_max: axis.x_max,
        bin_edges,
        cells,
        sumw2,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureHistogram, th1_payload};
    use crate::objects::read_histogram;

    #[test]
    fn uniform_th1d_with_sumw2() {
        let fh = FixtureHistogram::uniform("sig", 3, 0.0, 3.0)
            .title("signal region")
            .cells(&[1.0, 10.0, 20.0, 30.0, 2.0])
            .sumw2(&[1.0, 4.0, 9.0, 16.0, 1.0]);
        let h = read_histogram(&th1_payload(&fh), "TH1D").unwrap();

        assert_eq!(h.name, "sig");
        assert_eq!(h.title, "signal region");
        assert_eq!(h.class_name, "TH1D");
        assert_eq!(h.n_bins, 3);
        assert_eq!(h.bin_edges, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(h.bin_content(), &[10.0, 20.0, 30.0]);
        assert_eq!(h.underflow(), 1.0);
        assert_eq!(h.overflow(), 2.0);
        assert_eq!(h.cell_errors(), vec![1.0, 2.0, 3.0, 4.0, 1.0]);
        assert_eq!(h.entries, 60.0);
    }

    #[test]
    fn variable_th1f_without_sumw2_uses_poisson_errors() {
        let fh = FixtureHistogram::variable("bkg", &[0.0, 1.0, 5.0])
            .class("TH1F")
            .cells(&[0.0, 4.0, 9.0, 0.0]);
        let h = read_histogram(&th1_payload(&fh), "TH1F").unwrap();

        assert_eq!(h.bin_edges, vec![0.0, 1.0, 5.0]);
        assert_eq!(h.bin_content(), &[4.0, 9.0]);
        assert!(h.sumw2.is_none());
        assert_eq!(h.cell_errors(), vec![0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn integer_cells() {
        for class in ["TH1I", "TH1S"] {
            let fh = FixtureHistogram::uniform("counts", 2, 0.0, 1.0)
                .class(class)
                .cells(&[0.0, 7.0, -3.0, 0.0]);
            let h = read_histogram(&th1_payload(&fh), class).unwrap();
            assert_eq!(h.bin_content(), &[7.0, -3.0], "{}", class);
        }
    }

    #[test]
    fn unsupported_class() {
        let fh = FixtureHistogram::uniform("h", 1, 0.0, 1.0);
        assert!(matches!(
            read_histogram(&th1_payload(&fh), "TH2D"),
            Err(RootError::UnsupportedClass(c)) if c == "TH2D"
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let fh = FixtureHistogram::uniform("h", 4, 0.0, 1.0);
        let payload = th1_payload(&fh);
        for cut in [0, 10, payload.len() / 2, payload.len() - 1] {
            assert!(read_histogram(&payload[..cut], "TH1D").is_err(), "cut at {}", cut);
        }
    }
}
