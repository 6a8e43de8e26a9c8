//! Geometric core of a 2D rigid-body engine.
//!
//! Layers, leaves first:
//! - `geom`: vectors, splitting planes, boxes, QuickHull reduction, mass helpers.
//! - `shape`: circle / segment / convex polygon shapes with per-shape point and
//!   segment queries against a cached world transform.
//! - `space`: body and shape arenas, the broad-phase contract, and the query
//!   dispatcher (point, nearest point, segment, first segment hit, box).
//! - `sample`: deterministic point clouds for tests, benches, and the probe CLI.
//!
//! Conventions
//! - Polygons are convex and wound clockwise (`poly_validate`).
//! - A splitting plane's interior is on its negative side.
//! - The engine is single-threaded per `Space`; queries lock the space and defer
//!   structural mutations requested from callbacks until the query returns.

mod cfg;
pub mod geom;
pub mod sample;
pub mod shape;
pub mod space;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Double precision 2D vector used throughout the crate.
pub type Vec2 = nalgebra::Vector2<f64>;
/// Planar rotation stored as a unit complex number.
pub type Rot = nalgebra::UnitComplex<f64>;

pub use geom::{
    convex_hull, poly_validate, validate_poly, Aabb, ConvexHull, GeomCfg, PolyError, SplittingPlane,
};
pub use shape::{
    CircleShape, PointQueryInfo, PolyShape, QueryFilter, SegmentQueryInfo, SegmentShape, Shape,
    ShapeKind,
};
pub use space::{
    Body, BodyId, BodyKind, LinearIndex, Mutation, PointQueryHit, SegmentQueryHit, ShapeId, Space,
    SpatialIndex,
};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::geom::{convex_hull, Aabb, GeomCfg, SplittingPlane};
    pub use crate::shape::{PolyShape, QueryFilter, Shape};
    pub use crate::space::{Body, BodyId, ShapeId, Space};
    pub use crate::{Rot, Vec2};
}
