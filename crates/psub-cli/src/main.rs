//! purity-subtract: background subtraction corrected for signal purity.

mod exit;
mod input;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use psub_core::{ErrorModel, OutputPolicy};

use crate::run::RunConfig;

#[derive(Parser, Debug)]
#[command(name = "purity-subtract")]
#[command(about = "Purity-corrected background subtraction: (signal - (1 - p) * background) / p")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Input file with the histograms (ROOT, or psub-histograms JSON)
    input: PathBuf,

    /// Signal histogram name (`dir/name` inside ROOT subdirectories)
    signal: String,

    /// Background histogram name
    background: String,

    /// Name given to the result histogram
    output_name: String,

    /// Signal purity p, with 0 < p <= 1
    purity: f64,

    /// Absolute uncertainty on the purity
    #[arg(default_value = "0")]
    purity_uncertainty: f64,

    /// Output container path
    #[arg(short, long, default_value = "subtraction_FOUT.json")]
    output: PathBuf,

    /// Replace the output file if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Propagate the background histogram's own errors instead of reusing the signal's
    #[arg(long)]
    background_errors: bool,

    /// Legacy mode: accept any purity and skip the binning check
    #[arg(long)]
    unchecked: bool,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            input: self.input,
            signal: self.signal,
            background: self.background,
            output_name: self.output_name,
            purity: self.purity,
            purity_uncertainty: self.purity_uncertainty,
            output: self.output,
            policy: if self.overwrite { OutputPolicy::Overwrite } else { OutputPolicy::CreateNew },
            error_model: if self.background_errors {
                ErrorModel::Independent
            } else {
                ErrorModel::ReuseSignalError
            },
            unchecked: self.unchecked,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::from(exit::SUCCESS);
        }
        Err(e) => {
            println!("{}", e.render());
            return ExitCode::from(exit::USAGE_ERROR);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = cli.into_config();
    match run::run(&cfg) {
        Ok(_) => ExitCode::from(exit::SUCCESS),
        Err(err) => {
            println!(" fail; {:#}", err);
            ExitCode::from(exit::code_for(&err))
        }
    }
}
