use std::path::PathBuf;

use thiserror::Error;

use crate::keys::{CaseKey, RaterCaseKey};

/// Rejected signal construction. Values are never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("radius must be greater than 0, got {0}")]
    NonPositiveRadius(f64),

    #[error("radius must be finite, got {0}")]
    NonFiniteRadius(f64),

    #[error("coordinates must be finite, got ({x}, {y}, {z})")]
    NonFiniteCoordinates { x: f64, y: f64, z: f64 },

    #[error("confidence must be numeric, got {0}")]
    NonNumericConfidence(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("not a key path: '{0}'")]
    Malformed(String),
}

impl KeyError {
    pub(crate) fn invalid(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// Structural problems in a single matching input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("duplicate lesion '{name}' at input positions {first} and {second}")]
    DuplicateLesion {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("duplicate response '{name}' at input positions {first} and {second}")]
    DuplicateResponse {
        name: String,
        first: usize,
        second: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("case {0} is already registered")]
    DuplicateCase(CaseKey),

    #[error("responses for {0} have no reference case")]
    UnknownCase(RaterCaseKey),

    #[error("responses for {0} are already registered")]
    DuplicateRaterCase(RaterCaseKey),
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("case index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("matching failed for {rater} in case {case}: {source}")]
    Matching {
        case: CaseKey,
        rater: RaterCaseKey,
        #[source]
        source: MatchError,
    },
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("at least one rater is required")]
    NoRaters,

    #[error("directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse signals in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid signal #{index} in {}: {source}", .path.display())]
    InvalidSignal {
        path: PathBuf,
        index: usize,
        #[source]
        source: SignalError,
    },

    #[error("case {key} found in both {} and {}", .first.display(), .second.display())]
    DuplicateCaseDir {
        key: CaseKey,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid rater directory name '{name}': {source}")]
    InvalidRater {
        name: String,
        #[source]
        source: KeyError,
    },

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

impl LoaderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("config error: {0}")]
    Invalid(String),
}

/// An evaluation result that cannot be flattened into report rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("rater {rater} credited a lesion that is not part of case {case}")]
    UnknownLesion { case: CaseKey, rater: RaterCaseKey },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_stable_fields() {
        let e = EvaluationError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(e.to_string(), "case index 3 out of range (len=2)");

        let e = SignalError::NonPositiveRadius(-1.0);
        assert_eq!(e.to_string(), "radius must be greater than 0, got -1");

        let e = ConfigError::UnsupportedVersion {
            found: 2,
            supported: 1,
        };
        assert!(e.to_string().contains("unsupported config version 2"));
    }
}
