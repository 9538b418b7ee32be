//! Purity-corrected background subtraction.
//!
//! For every processed cell `i`:
//! ```text
//! result[i] = (sig[i] - (1 - p) * bkg[i]) / p
//!
//! δresult[i]² = (δsig² + bkg²·δp² + p²·δbkg²) / p²
//!             + (sig - (1 - p)·bkg)² · δp² / p⁴
//! ```
//!
//! The processed range runs from `find_bin(x_min)` to `find_bin(x_max)`
//! inclusive, which is bins `1..=N` plus the overflow cell. The underflow cell
//! keeps the signal's values.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::histogram::{Axis, Histogram};
use crate::purity::Purity;

/// Where the background uncertainty `δbkg` comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorModel {
    /// `δbkg` is the signal's own bin error, the same value as `δsig`.
    /// The background histogram's errors are never read.
    #[default]
    ReuseSignalError,
    /// `δbkg` is the background histogram's bin error.
    Independent,
}

/// Whether signal and background binning must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisCheck {
    /// Reject histograms whose axes differ.
    #[default]
    Strict,
    /// Process the signal's bin range regardless; background cells past its
    /// last cell read as zero.
    Unchecked,
}

/// Knobs for [`correct`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionOptions {
    /// Source of the background uncertainty.
    pub error_model: ErrorModel,
    /// Binning compatibility policy.
    pub axis_check: AxisCheck,
}

impl CorrectionOptions {
    /// Set the source of the background uncertainty.
    pub fn with_error_model(mut self, error_model: ErrorModel) -> Self {
        self.error_model = error_model;
        self
    }

    /// Set the axis compatibility policy.
    pub fn with_axis_check(mut self, axis_check: AxisCheck) -> Self {
        self.axis_check = axis_check;
        self
    }
}

/// Corrected content and error for a single bin.
///
/// Returns `(content, error)`. No domain checks: `p == 0` yields ±inf/NaN.
#[inline]
pub fn correct_bin(sig: f64, bkg: f64, d_sig: f64, d_bkg: f64, p: f64, d_p: f64) -> (f64, f64) {
    let numerator = sig - (1.0 - p) * bkg;
    let content = numerator / p;

    let p2 = p * p;
    let d_p2 = d_p * d_p;
    let variance = (d_sig * d_sig + bkg * bkg * d_p2 + p2 * d_bkg * d_bkg) / p2
        + (numerator * numerator * d_p2) / (p2 * p2);

    (content, variance.sqrt())
}

/// Cells visited by [`correct`] for a histogram with this axis.
pub fn processed_bins(axis: &Axis) -> RangeInclusive<usize> {
    axis.find_bin(axis.x_min())..=axis.find_bin(axis.x_max())
}

/// Subtract the purity-scaled background from `signal`.
///
/// The result is a copy of `signal` (name, title, axis, entries, underflow)
/// with every cell in [`processed_bins`] recomputed. Inputs are not modified.
pub fn correct(
    signal: &Histogram,
    background: &Histogram,
    purity: Purity,
    options: &CorrectionOptions,
) -> Result<Histogram> {
    if options.axis_check == AxisCheck::Strict {
        if let Some(reason) = signal.axis().mismatch(background.axis()) {
            return Err(Error::IncompatibleHistograms {
                signal: signal.name().to_string(),
                background: background.name().to_string(),
                reason,
            });
        }
    }

    let p = purity.value();
    let d_p = purity.uncertainty();
    let range = processed_bins(signal.axis());

    tracing::debug!(
        signal = signal.name(),
        background = background.name(),
        purity = p,
        purity_uncertainty = d_p,
        first_bin = *range.start(),
        last_bin = *range.end(),
        "applying purity correction"
    );

    let mut result = signal.clone();
    for i in range {
        let sig = signal.content(i);
        let bkg = background.get_content(i).unwrap_or(0.0);
        let d_sig = signal.error(i);
        let d_bkg = match options.error_model {
            ErrorModel::ReuseSignalError => d_sig,
            ErrorModel::Independent => background.get_error(i).unwrap_or(0.0),
        };

        let (content, error) = correct_bin(sig, bkg, d_sig, d_bkg, p, d_p);
        result.set_content(i, content);
        result.set_error(i, error);
    }

    Ok(result)
}

/// Short description of a corrected histogram, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionSummary {
    /// First processed cell.
    pub first_bin: usize,
    /// Last processed cell.
    pub last_bin: usize,
    /// Sum of regular-bin contents.
    pub integral: f64,
    /// Quadrature sum of regular-bin errors.
    pub integral_error: f64,
    /// Processed cells whose content or error is not finite.
    pub non_finite: usize,
}

impl CorrectionSummary {
    /// Summarise the output of [`correct`].
    pub fn of(result: &Histogram) -> Self {
        let range = processed_bins(result.axis());
        let non_finite = range
            .clone()
            .filter(|&i| !result.content(i).is_finite() || !result.error(i).is_finite())
            .count();
        let integral_error = result.bin_errors().iter().map(|e| e * e).sum::<f64>().sqrt();
        Self {
            first_bin: *range.start(),
            last_bin: *range.end(),
            integral: result.integral(),
            integral_error,
            non_finite,
        }
    }
}
