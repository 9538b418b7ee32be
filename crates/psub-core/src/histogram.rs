//! 1D histogram with fixed binning and per-cell errors.
//!
//! Cells are indexed the way ROOT indexes them:
//! ```text
//! 0        underflow
//! 1..=N    regular bins
//! N + 1    overflow
//! ```

use crate::error::{Error, Result};

/// Relative tolerance used when comparing bin edges of two axes.
const EDGE_RTOL: f64 = 1e-12;

/// Fixed binning along x: `n_bins` ordered bins described by `n_bins + 1` edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// Uniform binning of `[x_min, x_max)` into `n_bins` equal-width bins.
    pub fn uniform(n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("axis needs at least one bin".into()));
        }
        if !x_min.is_finite() || !x_max.is_finite() || x_min >= x_max {
            return Err(Error::Validation(format!(
                "invalid axis range [{}, {}]",
                x_min, x_max
            )));
        }
        let width = (x_max - x_min) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| x_min + i as f64 * width).collect();
        // Pin the last edge so x_max() is exact.
        edges.push(x_max);
        Ok(Self { edges })
    }

    /// Variable binning from explicit, strictly increasing edges.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis needs at least two edges, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Validation(format!("non-finite bin edge {}", bad)));
        }
        if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::Validation(format!(
                "bin edges must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }
        Ok(Self { edges })
    }

    /// Number of regular bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Lower edge of the first bin.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// All bin edges (length `n_bins + 1`).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Cell index containing `x`.
    ///
    /// Bins are half-open `[lo, hi)`. Values below `x_min` land in the
    /// underflow cell 0; values at or above `x_max` (and NaN) land in the
    /// overflow cell `n_bins + 1`.
    pub fn find_bin(&self, x: f64) -> usize {
        if x < self.x_min() {
            return 0;
        }
        if !(x < self.x_max()) {
            return self.n_bins() + 1;
        }
        // Number of edges <= x; in [1, n_bins] here.
        self.edges.partition_point(|&e| e <= x)
    }

    /// Describe the first difference between two axes, or `None` if they match.
    pub fn mismatch(&self, other: &Axis) -> Option<String> {
        if self.n_bins() != other.n_bins() {
            return Some(format!("bin count {} != {}", self.n_bins(), other.n_bins()));
        }
        self.edges.iter().zip(&other.edges).enumerate().find_map(|(i, (&a, &b))| {
            let scale = a.abs().max(b.abs()).max(1.0);
            if (a - b).abs() > EDGE_RTOL * scale {
                Some(format!("edge {} differs ({} != {})", i, a, b))
            } else {
                None
            }
        })
    }

    /// Whether both axes have the same bin count and edges.
    pub fn is_compatible(&self, other: &Axis) -> bool {
        self.mismatch(other).is_none()
    }
}

/// A 1D histogram: an axis plus `(content, error)` for every cell, flows included.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    name: String,
    title: String,
    axis: Axis,
    /// `n_bins + 2` values, underflow first.
    contents: Vec<f64>,
    /// `n_bins + 2` values, underflow first.
    errors: Vec<f64>,
    entries: f64,
}

impl Histogram {
    /// Empty histogram (all cells zero).
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        let n_cells = axis.n_bins() + 2;
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            contents: vec![0.0; n_cells],
            errors: vec![0.0; n_cells],
            entries: 0.0,
        }
    }

    /// Build from full cell arrays (`n_bins + 2` values each, underflow first).
    pub fn from_cells(
        name: impl Into<String>,
        title: impl Into<String>,
        axis: Axis,
        contents: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let n_cells = axis.n_bins() + 2;
        if contents.len() != n_cells || errors.len() != n_cells {
            return Err(Error::Validation(format!(
                "histogram '{}': expected {} cells, got {} contents and {} errors",
                name,
                n_cells,
                contents.len(),
                errors.len()
            )));
        }
        let entries = contents[1..n_cells - 1].iter().sum();
        Ok(Self { name, title: title.into(), axis, contents, errors, entries })
    }

    /// Build from regular-bin arrays (`n_bins` values each); flow cells are zero.
    pub fn from_bins(
        name: impl Into<String>,
        title: impl Into<String>,
        axis: Axis,
        contents: &[f64],
        errors: &[f64],
    ) -> Result<Self> {
        let name = name.into();
        let n = axis.n_bins();
        if contents.len() != n || errors.len() != n {
            return Err(Error::Validation(format!(
                "histogram '{}': expected {} bins, got {} contents and {} errors",
                name,
                n,
                contents.len(),
                errors.len()
            )));
        }
        let mut h = Self::new(name, title, axis);
        h.contents[1..=n].copy_from_slice(contents);
        h.errors[1..=n].copy_from_slice(errors);
        h.entries = contents.iter().sum();
        Ok(h)
    }

    /// Histogram name (the key it is stored under).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the histogram.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Histogram title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Binning.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Number of regular bins.
    pub fn n_bins(&self) -> usize {
        self.axis.n_bins()
    }

    /// Number of cells including under/overflow.
    pub fn n_cells(&self) -> usize {
        self.contents.len()
    }

    /// Content of cell `bin`.
    ///
    /// # Panics
    ///
    /// Panics if `bin > n_bins + 1`.
    #[inline]
    pub fn content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    /// Error of cell `bin`.
    ///
    /// # Panics
    ///
    /// Panics if `bin > n_bins + 1`.
    #[inline]
    pub fn error(&self, bin: usize) -> f64 {
        self.errors[bin]
    }

    /// Content of cell `bin`, or `None` when out of range.
    pub fn get_content(&self, bin: usize) -> Option<f64> {
        self.contents.get(bin).copied()
    }

    /// Error of cell `bin`, or `None` when out of range.
    pub fn get_error(&self, bin: usize) -> Option<f64> {
        self.errors.get(bin).copied()
    }

    /// Overwrite the content of cell `bin`.
    ///
    /// # Panics
    ///
    /// Panics if `bin > n_bins + 1`.
    #[inline]
    pub fn set_content(&mut self, bin: usize, value: f64) {
        self.contents[bin] = value;
    }

    /// Overwrite the error of cell `bin`.
    ///
    /// # Panics
    ///
    /// Panics if `bin > n_bins + 1`.
    #[inline]
    pub fn set_error(&mut self, bin: usize, value: f64) {
        self.errors[bin] = value;
    }

    /// All cell contents, underflow first.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// All cell errors, underflow first.
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Contents of the regular bins only.
    pub fn bin_contents(&self) -> &[f64] {
        &self.contents[1..=self.n_bins()]
    }

    /// Errors of the regular bins only.
    pub fn bin_errors(&self) -> &[f64] {
        &self.errors[1..=self.n_bins()]
    }

    /// Underflow cell content.
    pub fn underflow(&self) -> f64 {
        self.contents[0]
    }

    /// Overflow cell content.
    pub fn overflow(&self) -> f64 {
        self.contents[self.n_bins() + 1]
    }

    /// Number of entries as stored with the histogram.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Override the stored number of entries.
    pub fn set_entries(&mut self, entries: f64) {
        self.entries = entries;
    }

    /// Sum of regular-bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_contents().iter().sum()
    }
}
