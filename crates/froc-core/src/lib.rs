//! Lesion/response matching for free-response (FROC) reader studies.
//!
//! Reference lesions and rater responses are grouped per imaging series
//! ([`CaseKey`]); every rater's responses are split into true and false
//! positives by a stable matching against the lesions, and the outcome is
//! flattened into RJafroc-style report rows.

pub mod collection;
pub mod config;
pub mod coords;
pub mod errors;
pub mod evaluator;
pub mod keys;
pub mod loader;
pub mod matching;
pub mod report;
pub mod signals;

pub use collection::{
    CaseCollection, CaseCollectionBuilder, CaseInput, EvaluationInput, InMemoryCollection,
};
pub use coords::{Coordinates, ScannerCoordinates, SeriesCoordinates};
pub use errors::{
    CollectionError, ConfigError, EvaluationError, KeyError, LoaderError, MatchError,
    ReportError, SignalError,
};
pub use evaluator::{evaluate_case, evaluate_input, CaseEvaluation, EvaluationResult, Evaluator};
pub use keys::{CaseKey, RaterCaseKey};
pub use loader::{prepare_layout, DirectoryLoader, JsonSignalSource, SignalSource};
pub use matching::{match_responses, RaterOutcome, TruePositive};
pub use signals::{Lesion, Response, Signal, SignalRecord};
