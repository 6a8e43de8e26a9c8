//! Basic 2D types and tolerances.
//!
//! - `GeomCfg`: hull partition tolerance and point-query gradient epsilon.
//! - `SplittingPlane`: oriented line `n·p = d`, interior on the negative side.
//! - `Aabb`: axis-aligned box used by shapes and the spatial index.

use super::util::{normalize_or_zero, perp};
use crate::{cfg, Rot, Vec2};

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    /// Distance within which hull candidates count as collinear and are dropped.
    pub hull_tol: f64,
    /// Below this boundary distance, point queries report the edge normal as gradient.
    pub gradient_eps: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            hull_tol: cfg::HULL_TOL,
            gradient_eps: cfg::GRADIENT_EPS,
        }
    }
}

/// Oriented half-plane boundary `n · p = d` with unit `n`.
///
/// Invariants:
/// - `||n|| = 1`, except for planes built from a zero-length edge where `n = 0`.
/// - Built from a clockwise edge `(a, b)`, the polygon interior has `compare < 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplittingPlane {
    pub n: Vec2,
    pub d: f64,
}

impl SplittingPlane {
    #[inline]
    pub fn new(n: Vec2, d: f64) -> Self {
        Self { n, d }
    }

    /// Plane through the oriented edge `a → b` with outward normal `perp(b - a)`.
    #[inline]
    pub fn from_edge(a: Vec2, b: Vec2) -> Self {
        let n = normalize_or_zero(perp(b - a));
        Self { n, d: n.dot(&a) }
    }

    /// Signed distance of `p` to the plane; positive means outside.
    #[inline]
    pub fn compare(&self, p: Vec2) -> f64 {
        self.n.dot(&p) - self.d
    }

    /// Plane after rotating by `rot` and translating by `p`.
    #[inline]
    pub fn transform(&self, p: Vec2, rot: &Rot) -> Self {
        let n = rot * self.n;
        Self {
            n,
            d: p.dot(&n) + self.d,
        }
    }

    #[inline]
    pub(crate) fn is_degenerate(&self) -> bool {
        self.n.x == 0.0 && self.n.y == 0.0
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box from left/bottom/right/top extents.
    #[inline]
    pub fn from_extents(l: f64, b: f64, r: f64, t: f64) -> Self {
        Self {
            min: Vec2::new(l, b),
            max: Vec2::new(r, t),
        }
    }

    /// Box of half-extents `(hw, hh)` centered at `c`.
    #[inline]
    pub fn for_extents(c: Vec2, hw: f64, hh: f64) -> Self {
        let h = Vec2::new(hw, hh);
        Self {
            min: c - h,
            max: c + h,
        }
    }

    /// Tight box around a disc.
    #[inline]
    pub fn for_circle(p: Vec2, r: f64) -> Self {
        Self::for_extents(p, r, r)
    }

    /// Tight box around a point set; `None` for an empty set.
    pub fn for_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        Some(
            points
                .iter()
                .fold(Self::new(first, first), |bb, p| bb.expand(*p)),
        )
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
    }

    #[inline]
    pub fn contains_vect(&self, v: Vec2) -> bool {
        self.min.x <= v.x && self.max.x >= v.x && self.min.y <= v.y && self.max.y >= v.y
    }

    #[inline]
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Smallest box containing `self` and `v`.
    #[inline]
    pub fn expand(&self, v: Vec2) -> Aabb {
        Aabb {
            min: self.min.inf(&v),
            max: self.max.sup(&v),
        }
    }

    /// Box grown by `r` on every side.
    #[inline]
    pub fn inflate(&self, r: f64) -> Aabb {
        let h = Vec2::new(r, r);
        Aabb {
            min: self.min - h,
            max: self.max + h,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Fraction along `a → b` at which the segment enters the box.
    ///
    /// Returns `0.0` when `a` is inside and `f64::INFINITY` on a miss.
    pub fn segment_query(&self, a: Vec2, b: Vec2) -> f64 {
        let (txmin, txmax) = slab(self.min.x, self.max.x, a.x, b.x);
        let (tymin, tymax) = slab(self.min.y, self.max.y, a.y, b.y);
        if tymin <= txmax && txmin <= tymax {
            let min = txmin.max(tymin);
            let max = txmax.min(tymax);
            if 0.0 <= max && min <= 1.0 {
                return min.max(0.0);
            }
        }
        f64::INFINITY
    }

    /// Whether the segment `a → b` touches the box.
    #[inline]
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        self.segment_query(a, b).is_finite()
    }
}

/// Entry/exit parameters of the line `a + t (b - a)` through one slab `[lo, hi]`.
#[inline]
fn slab(lo: f64, hi: f64, a: f64, b: f64) -> (f64, f64) {
    let inv = 1.0 / (b - a);
    let t1 = if lo == a {
        f64::NEG_INFINITY
    } else {
        (lo - a) * inv
    };
    let t2 = if hi == a { f64::INFINITY } else { (hi - a) * inv };
    (t1.min(t2), t1.max(t2))
}
