//! Points in scanner (device) space and series (voxel) space.
//!
//! Both spaces share one representation, [`Coordinates`], tagged with a
//! zero-sized marker type. Arithmetic and distance are only implemented
//! between points of the same space, so mixing them does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Sub};

/// Marker trait for a coordinate space.
pub trait Space: Copy + Clone + fmt::Debug + Default + PartialEq + Send + Sync + 'static {
    const NAME: &'static str;
}

/// Patient/device coordinates as reported by the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scanner;

/// Coordinates relative to one image series (voxel index times spacing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Series;

impl Space for Scanner {
    const NAME: &'static str = "scanner";
}

impl Space for Series {
    const NAME: &'static str = "series";
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Coordinates<S: Space> {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

pub type ScannerCoordinates = Coordinates<Scanner>;
pub type SeriesCoordinates = Coordinates<Series>;

impl<S: Space> Coordinates<S> {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            space: PhantomData,
        }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean distance to another point of the same space.
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl<S: Space> Default for Coordinates<S> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<S: Space> fmt::Debug for Coordinates<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", S::NAME, self.x, self.y, self.z)
    }
}

impl<S: Space> Add for Coordinates<S> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<S: Space> Sub for Coordinates<S> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Component-wise product (e.g. voxel index times spacing).
impl<S: Space> Mul for Coordinates<S> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

/// Component-wise quotient.
impl<S: Space> Div for Coordinates<S> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}
