//! Signal purity with its uncertainty.

use crate::error::{Error, Result};

/// Estimated signal fraction `p` of a sample and its uncertainty `δp`.
///
/// [`Purity::new`] and [`Purity::with_uncertainty`] only accept `0 < p <= 1`
/// and a finite `δp >= 0`. [`Purity::unchecked`] stores whatever it is given,
/// so a zero purity flows into the correction as ±inf/NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Purity {
    value: f64,
    uncertainty: f64,
}

impl Purity {
    /// Validated purity with zero uncertainty.
    pub fn new(value: f64) -> Result<Self> {
        Self::with_uncertainty(value, 0.0)
    }

    /// Validated purity with uncertainty.
    pub fn with_uncertainty(value: f64, uncertainty: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(Error::InvalidPurity(format!(
                "purity must be in (0, 1], got {}",
                value
            )));
        }
        if !uncertainty.is_finite() || uncertainty < 0.0 {
            return Err(Error::InvalidPurity(format!(
                "purity uncertainty must be finite and >= 0, got {}",
                uncertainty
            )));
        }
        Ok(Self { value, uncertainty })
    }

    /// Purity without any domain check.
    pub fn unchecked(value: f64, uncertainty: f64) -> Self {
        Self { value, uncertainty }
    }

    /// Purity `p`.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Uncertainty `δp`.
    #[inline]
    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_open_closed_unit_interval() {
        assert!(Purity::new(1.0).is_ok());
        assert!(Purity::new(1e-9).is_ok());
        let p = Purity::with_uncertainty(0.8, 0.05).unwrap();
        assert_eq!(p.value(), 0.8);
        assert_eq!(p.uncertainty(), 0.05);
    }

    #[test]
    fn rejects_zero_and_out_of_range() {
        for v in [0.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(Purity::new(v), Err(Error::InvalidPurity(_))),
                "purity {} should be rejected",
                v
            );
        }
    }

    #[test]
    fn rejects_bad_uncertainty() {
        assert!(Purity::with_uncertainty(0.5, -0.01).is_err());
        assert!(Purity::with_uncertainty(0.5, f64::NAN).is_err());
    }

    #[test]
    fn unchecked_keeps_zero() {
        let p = Purity::unchecked(0.0, 0.0);
        assert_eq!(p.value(), 0.0);
    }
}
