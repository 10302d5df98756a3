//! Process exit codes. Part of the CLI contract.

use froc_core::{
    ConfigError, EvaluationError, KeyError, LoaderError, MatchError, ReportError, SignalError,
};

pub const SUCCESS: i32 = 0;
/// Study data could not be loaded, matched or reported.
pub const DATA_ERROR: i32 = 1;
/// Bad configuration, arguments or environment.
pub const CONFIG_ERROR: i32 = 2;

/// Classifies a failure by the first library error found in its chain.
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return CONFIG_ERROR;
        }
        if let Some(e) = cause.downcast_ref::<LoaderError>() {
            return match e {
                LoaderError::NoRaters => CONFIG_ERROR,
                _ => DATA_ERROR,
            };
        }
        if cause.is::<EvaluationError>()
            || cause.is::<ReportError>()
            || cause.is::<MatchError>()
            || cause.is::<KeyError>()
            || cause.is::<SignalError>()
            || cause.is::<serde_json::Error>()
        {
            return DATA_ERROR;
        }
    }
    CONFIG_ERROR
}
