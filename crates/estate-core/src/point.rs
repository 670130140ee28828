//! Metric 2-D point type and vector helpers.
//!
//! All coordinates in the engine are site-local metres (`f64`); there is no
//! CRS handling anywhere in the core.  `Pt` doubles as a point and a
//! displacement vector — the arithmetic impls below cover both readings.

use crate::COORD_EPS;

/// A 2-D point (or vector) in site-local metric coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

impl Pt {
    pub const ZERO: Pt = Pt { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance(self, other: Pt) -> f64 {
        (self - other).length()
    }

    /// Squared distance — cheaper rejection test for nearest-point scans.
    #[inline]
    pub fn distance_sq(self, other: Pt) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn dot(self, other: Pt) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2-D cross product (z component).  Positive when `other` is
    /// counter-clockwise of `self`.
    #[inline]
    pub fn cross(self, other: Pt) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn scale(self, s: f64) -> Pt {
        Pt::new(self.x * s, self.y * s)
    }

    /// Unit vector in the same direction, or `None` for (near-)zero input.
    pub fn unit(self) -> Option<Pt> {
        let len = self.length();
        if len < COORD_EPS {
            return None;
        }
        Some(self.scale(1.0 / len))
    }

    /// Perpendicular vector, rotated +90° (counter-clockwise).
    #[inline]
    pub fn perp(self) -> Pt {
        Pt::new(-self.y, self.x)
    }

    /// Rotate by `theta` radians around `origin`.
    pub fn rotate_about(self, theta: f64, origin: Pt) -> Pt {
        let (s, c) = theta.sin_cos();
        let d = self - origin;
        Pt::new(
            origin.x + d.x * c - d.y * s,
            origin.y + d.x * s + d.y * c,
        )
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point equality under the engine-wide coordinate tolerance.
    #[inline]
    pub fn approx_eq(self, other: Pt) -> bool {
        (self.x - other.x).abs() <= COORD_EPS && (self.y - other.y).abs() <= COORD_EPS
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    #[inline]
    fn add(self, rhs: Pt) -> Pt {
        Pt::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    #[inline]
    fn sub(self, rhs: Pt) -> Pt {
        Pt::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Pt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}
