//! Case and rater identity.
//!
//! The canonical path encoding is the contract between the loader, the
//! evaluator and the report writer:
//!
//! - `CaseKey`: `{patient_id}/{study_date}_{modality}/SE{series_number}`
//! - `RaterCaseKey`: `{rater_name}/` + case path, plus `/MI{instance}` when
//!   a modality instance is set.
//!
//! `parse(encode(k)) == k` for every key that passes construction.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::KeyError;

const SEGMENT: &str = r"[^/]+";
const DATE: &str = r"[0-9]{8}";
const MODALITY: &str = r"[A-Z][A-Z0-9]{1,15}";
const SERIES: &str = r"[0-9]+";

static CASE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({SEGMENT})/({DATE})_({MODALITY})/SE({SERIES})$"
    ))
    .unwrap()
});

static RATER_CASE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({SEGMENT})/({SEGMENT})/({DATE})_({MODALITY})/SE({SERIES})(?:/MI([0-9]+))?$"
    ))
    .unwrap()
});

static MODALITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{MODALITY}$")).unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{DATE}$")).unwrap());
static SERIES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{SERIES}$")).unwrap());

fn check_segment(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::invalid(field, value, "must not be empty"));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(KeyError::invalid(field, value, "must not contain path separators"));
    }
    Ok(())
}

/// One imaging series of one patient study.
///
/// Serializes as its canonical path so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseKey {
    patient_id: String,
    study_date: String,
    modality: String,
    series_number: String,
}

impl CaseKey {
    /// Validates and normalizes the fields. The modality is upper-cased.
    pub fn new(
        patient_id: impl Into<String>,
        study_date: impl Into<String>,
        modality: impl AsRef<str>,
        series_number: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let patient_id = patient_id.into();
        let study_date = study_date.into();
        let modality = modality.as_ref().to_ascii_uppercase();
        let series_number = series_number.into();

        check_segment("patient_id", &patient_id)?;
        if !DATE_RE.is_match(&study_date) {
            return Err(KeyError::invalid("study_date", &study_date, "expected YYYYMMDD"));
        }
        if !MODALITY_RE.is_match(&modality) {
            return Err(KeyError::invalid(
                "modality",
                &modality,
                "expected 2-16 alphanumerics starting with a letter",
            ));
        }
        if !SERIES_RE.is_match(&series_number) {
            return Err(KeyError::invalid("series_number", &series_number, "expected digits"));
        }

        Ok(Self {
            patient_id,
            study_date,
            modality,
            series_number,
        })
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn study_date(&self) -> &str {
        &self.study_date
    }

    pub fn modality(&self) -> &str {
        &self.modality
    }

    pub fn series_number(&self) -> &str {
        &self.series_number
    }

    pub fn to_rater_key(&self, rater_name: impl Into<String>) -> Result<RaterCaseKey, KeyError> {
        RaterCaseKey::new(rater_name, self.clone(), None)
    }

    pub fn to_rater_key_with_instance(
        &self,
        rater_name: impl Into<String>,
        modality_instance_id: u32,
    ) -> Result<RaterCaseKey, KeyError> {
        RaterCaseKey::new(rater_name, self.clone(), Some(modality_instance_id))
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes a canonical case path. Anything else is `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let caps = CASE_PATH.captures(path)?;
        Self::new(&caps[1], &caps[2], &caps[3], &caps[4]).ok()
    }

    /// Finds the case key formed by the last three components of `path`,
    /// e.g. `/data/reference/P001/20240101_CT/SE3`.
    pub fn find_in_path(path: &Path) -> Option<Self> {
        let parts: Vec<&str> = path
            .components()
            .rev()
            .take(3)
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        if parts.len() != 3 {
            return None;
        }
        Self::parse(&format!("{}/{}/{}", parts[2], parts[1], parts[0]))
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}_{}/SE{}",
            self.patient_id, self.study_date, self.modality, self.series_number
        )
    }
}

impl FromStr for CaseKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| KeyError::Malformed(s.to_string()))
    }
}

impl TryFrom<String> for CaseKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CaseKey> for String {
    fn from(k: CaseKey) -> Self {
        k.to_string()
    }
}

/// A case as seen by one rater.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RaterCaseKey {
    rater_name: String,
    case: CaseKey,
    /// Distinguishes repeated acquisitions of one modality in multi-arm studies.
    modality_instance_id: Option<u32>,
}

impl RaterCaseKey {
    pub fn new(
        rater_name: impl Into<String>,
        case: CaseKey,
        modality_instance_id: Option<u32>,
    ) -> Result<Self, KeyError> {
        let rater_name = rater_name.into();
        check_segment("rater_name", &rater_name)?;
        Ok(Self {
            rater_name,
            case,
            modality_instance_id,
        })
    }

    pub fn rater_name(&self) -> &str {
        &self.rater_name
    }

    pub fn modality_instance_id(&self) -> Option<u32> {
        self.modality_instance_id
    }

    pub fn case_key(&self) -> &CaseKey {
        &self.case
    }

    /// Drops rater and modality-instance information.
    pub fn to_case_key(&self) -> CaseKey {
        self.case.clone()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn parse(path: &str) -> Option<Self> {
        let caps = RATER_CASE_PATH.captures(path)?;
        let case = CaseKey::new(&caps[2], &caps[3], &caps[4], &caps[5]).ok()?;
        let instance = match caps.get(6) {
            Some(m) => Some(m.as_str().parse::<u32>().ok()?),
            None => None,
        };
        let key = Self::new(&caps[1], case, instance).ok()?;
        // Leading zeros in the instance would not survive re-encoding.
        (key.encode() == path).then_some(key)
    }
}

impl fmt::Display for RaterCaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rater_name, self.case)?;
        if let Some(instance) = self.modality_instance_id {
            write!(f, "/MI{instance}")?;
        }
        Ok(())
    }
}

impl FromStr for RaterCaseKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| KeyError::Malformed(s.to_string()))
    }
}

impl TryFrom<String> for RaterCaseKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RaterCaseKey> for String {
    fn from(k: RaterCaseKey) -> Self {
        k.to_string()
    }
}
