//! Process exit statuses.

use psub_core::Error;
use psub_root::RootError;

pub const SUCCESS: u8 = 0;
/// Input unreadable, output exists or cannot be written.
pub const IO_ERROR: u8 = 1;
/// Missing or unparsable arguments.
pub const USAGE_ERROR: u8 = 2;
/// Signal or background histogram absent.
pub const LOOKUP_ERROR: u8 = 3;
/// Purity rejected or axes incompatible.
pub const INVALID_INPUT: u8 = 4;

/// Exit status for a failed run, from the first typed error in the chain.
pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<Error>() {
            return match e {
                Error::HistogramNotFound(_) => LOOKUP_ERROR,
                Error::InvalidPurity(_) | Error::IncompatibleHistograms { .. } => INVALID_INPUT,
                Error::Io(_)
                | Error::Json(_)
                | Error::Validation(_)
                | Error::OutputExists(_)
                | Error::Format(_)
                | Error::Decode(_) => IO_ERROR,
            };
        }
        if let Some(e) = cause.downcast_ref::<RootError>() {
            return match e {
                RootError::KeyNotFound(_) => LOOKUP_ERROR,
                _ => IO_ERROR,
            };
        }
    }
    IO_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn wrapped(e: Error) -> anyhow::Error {
        Err::<(), _>(e).context("outer").unwrap_err()
    }

    #[test]
    fn maps_core_errors() {
        assert_eq!(code_for(&wrapped(Error::HistogramNotFound("s".into()))), LOOKUP_ERROR);
        assert_eq!(code_for(&wrapped(Error::InvalidPurity("0".into()))), INVALID_INPUT);
        assert_eq!(
            code_for(&wrapped(Error::IncompatibleHistograms {
                signal: "s".into(),
                background: "b".into(),
                reason: "bins".into(),
            })),
            INVALID_INPUT
        );
        assert_eq!(code_for(&wrapped(Error::OutputExists("out.json".into()))), IO_ERROR);
    }

    #[test]
    fn maps_root_errors_and_unknown_causes() {
        let e = anyhow::Error::new(RootError::KeyNotFound("h".into()));
        assert_eq!(code_for(&e), LOOKUP_ERROR);
        assert_eq!(code_for(&anyhow::anyhow!("something else")), IO_ERROR);
    }
}
