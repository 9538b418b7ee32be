//! Histogram type returned by `RootFile::get_histogram`.

/// A 1D histogram read from a ROOT file, flow cells included.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// ROOT class the object was stored as (e.g. "TH1D").
    pub class_name: String,
    /// Number of regular bins.
    pub n_bins: usize,
    /// Lower edge of the first bin.
    pub x_min: f64,
    /// Upper edge of the last bin.
    pub x_max: f64,
    /// Bin edges (length `n_bins + 1`).
    pub bin_edges: Vec<f64>,
    /// Cell contents (length `n_bins + 2`: underflow, bins, overflow).
    pub cells: Vec<f64>,
    /// Per-cell sum of squared weights (length `n_bins + 2`), if stored.
    pub sumw2: Option<Vec<f64>>,
    /// `fEntries` as stored.
    pub entries: f64,
}

impl Histogram {
    /// Contents of the regular bins.
    pub fn bin_content(&self) -> &[f64] {
        &self.cells[1..=self.n_bins]
    }

    /// Underflow cell content.
    pub fn underflow(&self) -> f64 {
        self.cells[0]
    }

    /// Overflow cell content.
    pub fn overflow(&self) -> f64 {
        self.cells[self.n_bins + 1]
    }

    /// Per-cell errors the way `TH1::GetBinError` computes them:
    /// `sqrt(sumw2)` when weights were stored, otherwise `sqrt(|content|)`.
    pub fn cell_errors(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(sumw2) => sumw2.iter().map(|w| w.sqrt()).collect(),
            None => self.cells.iter().map(|c| c.abs().sqrt()).collect(),
        }
    }
}
