//! Ground-truth lesions and rater responses, both modelled as spheres in
//! series space.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coords::SeriesCoordinates;
use crate::errors::SignalError;

/// Relative tolerance used when comparing radii.
pub const RADIUS_REL_TOL: f64 = 1e-9;

/// Confidence assigned when neither the record nor the name carries one.
pub const UNKNOWN_CONFIDENCE: f64 = -1.0;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)").unwrap());

/// Common geometry of lesions and responses.
pub trait Signal {
    fn coords(&self) -> SeriesCoordinates;
    fn radius(&self) -> f64;
    fn name(&self) -> &str;

    /// Distance between centers. Defined across signal kinds.
    fn distance<T: Signal + ?Sized>(&self, other: &T) -> f64
    where
        Self: Sized,
    {
        self.coords().distance(&other.coords())
    }

    /// Total order: z, y, x, then radius and name.
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        cmp_geometry(self, other)
    }
}

/// Shared prefix of every canonical order: z, y, x, radius, name.
fn cmp_geometry<T: Signal + ?Sized>(a: &T, b: &T) -> Ordering {
    let (ca, cb) = (a.coords(), b.coords());
    ca.z.total_cmp(&cb.z)
        .then_with(|| ca.y.total_cmp(&cb.y))
        .then_with(|| ca.x.total_cmp(&cb.x))
        .then_with(|| a.radius().total_cmp(&b.radius()))
        .then_with(|| a.name().cmp(b.name()))
}

/// Returns a copy of `signals` in canonical order (ascending z, y, x).
pub fn sort_signals<T: Signal + Clone>(signals: &[T]) -> Vec<T> {
    let mut sorted = signals.to_vec();
    sorted.sort_by(|a, b| a.canonical_cmp(b));
    sorted
}

fn is_close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= RADIUS_REL_TOL * a.abs().max(b.abs())
}

fn validate_geometry(coords: &SeriesCoordinates, radius: f64) -> Result<(), SignalError> {
    if !coords.is_finite() {
        return Err(SignalError::NonFiniteCoordinates {
            x: coords.x,
            y: coords.y,
            z: coords.z,
        });
    }
    if !radius.is_finite() {
        return Err(SignalError::NonFiniteRadius(radius));
    }
    if radius <= 0.0 {
        return Err(SignalError::NonPositiveRadius(radius));
    }
    Ok(())
}

/// Takes the first integer embedded in a segment name, e.g. `"lesion_3"` -> 3.
///
/// Digit runs too long for `u64` are read as the nearest `f64`.
pub fn confidence_from_name(name: &str) -> Option<f64> {
    let caps = FIRST_INTEGER.captures(name)?;
    let digits = &caps[1];
    match digits.parse::<u64>() {
        Ok(v) => Some(v as f64),
        Err(_) => digits.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// A ground-truth abnormality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord", into = "SignalRecord")]
pub struct Lesion {
    coords: SeriesCoordinates,
    radius: f64,
    name: String,
}

impl Lesion {
    pub fn new(
        coords: SeriesCoordinates,
        radius: f64,
        name: impl Into<String>,
    ) -> Result<Self, SignalError> {
        validate_geometry(&coords, radius)?;
        Ok(Self {
            coords,
            radius,
            name: name.into(),
        })
    }
}

impl Signal for Lesion {
    fn coords(&self) -> SeriesCoordinates {
        self.coords
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Lesion {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && is_close(self.radius, other.radius)
            && self.name == other.name
    }
}

/// A finding marked by a rater, with the rater's confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord", into = "SignalRecord")]
pub struct Response {
    coords: SeriesCoordinates,
    radius: f64,
    name: String,
    confidence: f64,
}

impl Response {
    pub fn new(
        coords: SeriesCoordinates,
        radius: f64,
        name: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, SignalError> {
        validate_geometry(&coords, radius)?;
        if !confidence.is_finite() {
            return Err(SignalError::NonNumericConfidence(confidence));
        }
        Ok(Self {
            coords,
            radius,
            name: name.into(),
            confidence,
        })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// True when this response's center lies within the lesion's sphere.
    ///
    /// Only the lesion radius counts; the response radius is ignored.
    pub fn is_true_positive(&self, lesion: &Lesion) -> bool {
        self.distance(lesion) <= lesion.radius
    }

    /// Reinterprets this response as ground truth with the same geometry.
    pub fn to_lesion(&self) -> Lesion {
        Lesion {
            coords: self.coords,
            radius: self.radius,
            name: self.name.clone(),
        }
    }
}

impl Signal for Response {
    fn coords(&self) -> SeriesCoordinates {
        self.coords
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        cmp_geometry(self, other).then_with(|| self.confidence.total_cmp(&other.confidence))
    }
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && is_close(self.radius, other.radius)
            && self.name == other.name
            && self.confidence == other.confidence
    }
}

/// On-disk form of a signal: `{x, y, z, r, name, confidence?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SignalRecord {
    fn coords(&self) -> SeriesCoordinates {
        SeriesCoordinates::new(self.x, self.y, self.z)
    }
}

impl TryFrom<SignalRecord> for Lesion {
    type Error = SignalError;

    fn try_from(rec: SignalRecord) -> Result<Self, Self::Error> {
        Lesion::new(rec.coords(), rec.r, rec.name)
    }
}

impl TryFrom<SignalRecord> for Response {
    type Error = SignalError;

    fn try_from(rec: SignalRecord) -> Result<Self, Self::Error> {
        let confidence = rec
            .confidence
            .or_else(|| confidence_from_name(&rec.name))
            .unwrap_or(UNKNOWN_CONFIDENCE);
        Response::new(rec.coords(), rec.r, rec.name, confidence)
    }
}

impl From<Lesion> for SignalRecord {
    fn from(l: Lesion) -> Self {
        Self {
            x: l.coords.x,
            y: l.coords.y,
            z: l.coords.z,
            r: l.radius,
            name: l.name,
            confidence: None,
        }
    }
}

impl From<Response> for SignalRecord {
    fn from(r: Response) -> Self {
        Self {
            x: r.coords.x,
            y: r.coords.y,
            z: r.coords.z,
            r: r.radius,
            name: r.name,
            confidence: Some(r.confidence),
        }
    }
}
