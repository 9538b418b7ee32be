//! One subtraction run: read inputs, correct, write the output container.

use std::path::PathBuf;

use anyhow::{Context, Result};
use psub_core::{
    AxisCheck, CorrectionOptions, CorrectionSummary, ErrorModel, HistogramContainer,
    HistogramSource, OutputPolicy, Purity, correct,
};

use crate::input::InputFile;

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub signal: String,
    pub background: String,
    pub output_name: String,
    pub purity: f64,
    pub purity_uncertainty: f64,
    pub output: PathBuf,
    pub policy: OutputPolicy,
    pub error_model: ErrorModel,
    /// Skip purity validation and the axis check.
    pub unchecked: bool,
}

pub fn run(cfg: &RunConfig) -> Result<CorrectionSummary> {
    let input = InputFile::open(&cfg.input)
        .with_context(|| format!("could not open file {}", cfg.input.display()))?;
    tracing::info!(path = %cfg.input.display(), format = input.kind(), "input opened");
    if tracing::enabled!(tracing::Level::DEBUG) {
        if let Err(e) = input.log_contents() {
            tracing::warn!(error = %e, "could not list input keys");
        }
        let names = histogram_names(&input);
        tracing::debug!(count = names.len(), names = ?names, "histograms in input");
    }

    let signal = input
        .histogram(&cfg.signal)
        .with_context(|| format!("could not open signal histogram '{}'", cfg.signal))?;
    let background = input
        .histogram(&cfg.background)
        .with_context(|| format!("could not open background histogram '{}'", cfg.background))?;

    let (purity, axis_check) = if cfg.unchecked {
        (Purity::unchecked(cfg.purity, cfg.purity_uncertainty), AxisCheck::Unchecked)
    } else {
        (Purity::with_uncertainty(cfg.purity, cfg.purity_uncertainty)?, AxisCheck::Strict)
    };
    let options =
        CorrectionOptions::default().with_error_model(cfg.error_model).with_axis_check(axis_check);

    let mut result = correct(&signal, &background, purity, &options)?;
    result.set_name(cfg.output_name.as_str());

    let summary = CorrectionSummary::of(&result);
    tracing::info!(
        name = result.name(),
        first_bin = summary.first_bin,
        last_bin = summary.last_bin,
        integral = summary.integral,
        integral_error = summary.integral_error,
        "subtraction done"
    );
    if summary.non_finite > 0 {
        tracing::warn!(cells = summary.non_finite, "result has non-finite cells");
    }

    let container: HistogramContainer = std::iter::once(result).collect();
    container
        .save(&cfg.output, cfg.policy)
        .with_context(|| format!("could not write {}", cfg.output.display()))?;
    tracing::info!(path = %cfg.output.display(), "output written");

    Ok(summary)
}

/// Names the input offers; a listing failure is logged and yields none.
fn histogram_names(input: &dyn HistogramSource) -> Vec<String> {
    input.histogram_names().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not list input histograms");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use psub_core::{Axis, Error, Histogram};

    /// Source whose listing is broken but whose lookups still work.
    struct UnlistableSource(Histogram);

    impl HistogramSource for UnlistableSource {
        fn histogram_names(&self) -> psub_core::Result<Vec<String>> {
            Err(Error::Decode("truncated key list".into()))
        }

        fn histogram(&self, name: &str) -> psub_core::Result<Histogram> {
            if name == self.0.name() {
                Ok(self.0.clone())
            } else {
                Err(Error::HistogramNotFound(name.to_string()))
            }
        }
    }

    #[test]
    fn listing_failures_do_not_stop_lookups() {
        let axis = Axis::uniform(1, 0.0, 1.0).unwrap();
        let sig = Histogram::from_bins("sig", "", axis, &[1.0], &[1.0]).unwrap();
        let source = UnlistableSource(sig);

        assert!(histogram_names(&source).is_empty());
        assert_eq!(source.histogram("sig").unwrap().bin_contents(), &[1.0]);
    }

    #[test]
    fn debug_run_lists_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let axis = Axis::uniform(1, 0.0, 1.0).unwrap();
        let container: HistogramContainer = [
            Histogram::from_bins("sig", "", axis.clone(), &[4.0], &[1.0]).unwrap(),
            Histogram::from_bins("bkg", "", axis, &[2.0], &[1.0]).unwrap(),
        ]
        .into_iter()
        .collect();
        container.save(&input, OutputPolicy::CreateNew).unwrap();

        let cfg = RunConfig {
            input,
            signal: "sig".into(),
            background: "bkg".into(),
            output_name: "res".into(),
            purity: 0.5,
            purity_uncertainty: 0.0,
            output: dir.path().join("out.json"),
            policy: OutputPolicy::CreateNew,
            error_model: ErrorModel::ReuseSignalError,
            unchecked: false,
        };
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        run(&cfg).unwrap();

        let out = HistogramContainer::load(&cfg.output).unwrap();
        assert_eq!(out.histogram("res").unwrap().bin_contents(), &[6.0]);
    }
}
