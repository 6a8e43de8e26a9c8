//! 2D geometry primitives and convex hull reduction.
//!
//! Purpose
//! - Vector helpers, oriented splitting planes, axis-aligned boxes.
//! - QuickHull reduction of arbitrary point sets to clockwise convex polygons.
//! - Area / centroid / moment helpers for the shapes built on top.
//!
//! Conventions
//! - `SplittingPlane { n, d }` is the line `n·p = d`; `compare(p) > 0` is outside.
//! - Polygons are clockwise: for every consecutive triple `(a, b, c)`,
//!   `cross(b - a, c - a) <= 0`.
//!
//! Code cross-refs: `shape::PolyShape` (consumer), `space` (boxes for the index).

mod hull;
mod mass;
mod types;
mod util;

pub use hull::{convex_hull, poly_validate, validate_poly, ConvexHull, PolyError};
pub use mass::{
    area_for_circle, area_for_poly, area_for_segment, centroid_for_poly, moment_for_box,
    moment_for_circle, moment_for_poly, moment_for_segment, recenter_poly,
};
pub use types::{Aabb, GeomCfg, SplittingPlane};
pub use util::{closest_point_on_segment, cross, lerp, perp, rperp};
