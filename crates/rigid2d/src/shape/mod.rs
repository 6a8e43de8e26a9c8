//! Collision shapes and their per-shape queries.
//!
//! Purpose
//! - One closed set of variants (`ShapeKind`: circle, segment, convex polygon)
//!   sharing a single contract: cache a world transform, answer point queries,
//!   answer segment (ray) queries.
//! - `Shape` adds the attributes the query dispatcher filters on: owning body,
//!   layer mask, group, sensor flag, cached world box.
//!
//! Lifecycle
//! - Local geometry is fixed at construction (or replaced wholesale through
//!   `Space::set_poly_vertices`). The world cache is refreshed once per step by
//!   the owning `Space` and read-only in between.
//!
//! Code cross-refs: `geom::{convex_hull, SplittingPlane, Aabb}`, `space::Space`.

mod circle;
mod poly;
mod segment;

pub use circle::CircleShape;
pub use poly::PolyShape;
pub use segment::SegmentShape;

pub(crate) use circle::circle_segment_query;

use crate::geom::{Aabb, GeomCfg};
use crate::space::BodyId;
use crate::{Rot, Vec2};

/// Layer mask matching every layer.
pub const ALL_LAYERS: u32 = u32::MAX;
/// Group id meaning "no group".
pub const NO_GROUP: u32 = 0;

/// Result of a point query against one shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointQueryInfo {
    /// Closest point on the (skin-inflated) surface.
    pub point: Vec2,
    /// Signed distance to the surface; negative inside.
    pub distance: f64,
    /// Unit direction of increasing distance (surface toward outside).
    pub gradient: Vec2,
}

/// Result of a segment query against one shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentQueryInfo {
    /// Surface point hit, pulled back by the query radius.
    pub point: Vec2,
    /// Surface normal at the hit.
    pub normal: Vec2,
    /// Fraction along the query segment in `[0, 1]`.
    pub alpha: f64,
}

/// Layer / group filter applied by every space query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFilter {
    pub layers: u32,
    pub group: u32,
}

impl QueryFilter {
    /// Matches every shape.
    pub const ALL: QueryFilter = QueryFilter {
        layers: ALL_LAYERS,
        group: NO_GROUP,
    };

    #[inline]
    pub fn new(layers: u32, group: u32) -> Self {
        Self { layers, group }
    }

    /// Shares a layer with `shape` and is not in the shape's (non-zero) group.
    #[inline]
    pub fn admits(&self, shape: &Shape) -> bool {
        (self.layers & shape.layers) != 0 && !(shape.group != NO_GROUP && shape.group == self.group)
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// The closed set of shape variants.
#[derive(Clone, Debug)]
pub enum ShapeKind {
    Circle(CircleShape),
    Segment(SegmentShape),
    Poly(PolyShape),
}

impl ShapeKind {
    fn update(&mut self, p: Vec2, rot: &Rot) -> Aabb {
        match self {
            ShapeKind::Circle(c) => c.update(p, rot),
            ShapeKind::Segment(s) => s.update(p, rot),
            ShapeKind::Poly(poly) => poly.update(p, rot),
        }
    }

    fn point_query(&self, p: Vec2, eps: f64) -> PointQueryInfo {
        match self {
            ShapeKind::Circle(c) => c.point_query(p, eps),
            ShapeKind::Segment(s) => s.point_query(p, eps),
            ShapeKind::Poly(poly) => poly.point_query(p, eps),
        }
    }

    fn segment_query(&self, a: Vec2, b: Vec2, radius: f64) -> Option<SegmentQueryInfo> {
        match self {
            ShapeKind::Circle(c) => c.segment_query(a, b, radius),
            ShapeKind::Segment(s) => s.segment_query(a, b, radius),
            ShapeKind::Poly(poly) => poly.segment_query(a, b, radius),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShapeKind::Circle(_) => "circle",
            ShapeKind::Segment(_) => "segment",
            ShapeKind::Poly(_) => "poly",
        }
    }
}

impl From<CircleShape> for ShapeKind {
    fn from(c: CircleShape) -> Self {
        ShapeKind::Circle(c)
    }
}

impl From<SegmentShape> for ShapeKind {
    fn from(s: SegmentShape) -> Self {
        ShapeKind::Segment(s)
    }
}

impl From<PolyShape> for ShapeKind {
    fn from(p: PolyShape) -> Self {
        ShapeKind::Poly(p)
    }
}

/// A shape attached to a body, with query filter attributes and a world cache.
#[derive(Clone, Debug)]
pub struct Shape {
    kind: ShapeKind,
    body: BodyId,
    /// Layer mask; queries see the shape only if their mask shares a bit.
    pub layers: u32,
    /// Shapes in the same non-zero group are invisible to queries with that group.
    pub group: u32,
    /// Sensors are skipped by nearest-point and first-hit queries.
    pub sensor: bool,
    bb: Aabb,
}

impl Shape {
    /// Wrap a variant for `body`; the world cache starts at the identity transform.
    pub fn new(body: BodyId, kind: impl Into<ShapeKind>) -> Self {
        let mut kind = kind.into();
        let bb = kind.update(Vec2::zeros(), &Rot::identity());
        Self {
            kind,
            body,
            layers: ALL_LAYERS,
            group: NO_GROUP,
            sensor: false,
            bb,
        }
    }

    pub fn new_circle(body: BodyId, radius: f64, offset: Vec2) -> Self {
        Self::new(body, CircleShape::new(radius, offset))
    }

    pub fn new_segment(body: BodyId, a: Vec2, b: Vec2, radius: f64) -> Self {
        Self::new(body, SegmentShape::new(a, b, radius))
    }

    /// Hull-reduced polygon from arbitrary points.
    pub fn new_poly(body: BodyId, verts: &[Vec2], offset: Vec2, radius: f64) -> Self {
        Self::new(body, PolyShape::new(verts, offset, radius))
    }

    /// Axis-aligned `width × height` box centered on the body.
    pub fn new_box(body: BodyId, width: f64, height: f64, radius: f64) -> Self {
        Self::new(body, PolyShape::box_shape(width, height, radius))
    }

    /// Builder: set layer mask and group.
    pub fn with_filter(mut self, layers: u32, group: u32) -> Self {
        self.layers = layers;
        self.group = group;
        self
    }

    /// Builder: mark as sensor.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    #[inline]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    #[inline]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// World bounding box from the last cache refresh.
    #[inline]
    pub fn bb(&self) -> Aabb {
        self.bb
    }

    /// Refresh the world cache for a body at `p` rotated by `rot`.
    pub fn update(&mut self, p: Vec2, rot: &Rot) -> Aabb {
        self.bb = self.kind.update(p, rot);
        self.bb
    }

    /// Point query with the default gradient epsilon.
    pub fn point_query(&self, p: Vec2) -> PointQueryInfo {
        self.kind.point_query(p, GeomCfg::default().gradient_eps)
    }

    pub fn point_query_eps(&self, p: Vec2, eps: f64) -> PointQueryInfo {
        self.kind.point_query(p, eps)
    }

    /// Earliest hit of the segment `a → b` swept by `radius`, if any.
    pub fn segment_query(&self, a: Vec2, b: Vec2, radius: f64) -> Option<SegmentQueryInfo> {
        self.kind.segment_query(a, b, radius)
    }

    pub fn as_poly(&self) -> Option<&PolyShape> {
        match &self.kind {
            ShapeKind::Poly(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_circle(&self) -> Option<&CircleShape> {
        match &self.kind {
            ShapeKind::Circle(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> Option<&SegmentShape> {
        match &self.kind {
            ShapeKind::Segment(s) => Some(s),
            _ => None,
        }
    }

    /// The polygon variant; panics on any other variant.
    #[track_caller]
    pub fn poly(&self) -> &PolyShape {
        match &self.kind {
            ShapeKind::Poly(p) => p,
            other => panic!("shape is not a poly shape (found {})", other.name()),
        }
    }

    /// The circle variant; panics on any other variant.
    #[track_caller]
    pub fn circle(&self) -> &CircleShape {
        match &self.kind {
            ShapeKind::Circle(c) => c,
            other => panic!("shape is not a circle shape (found {})", other.name()),
        }
    }

    /// The segment variant; panics on any other variant.
    #[track_caller]
    pub fn segment(&self) -> &SegmentShape {
        match &self.kind {
            ShapeKind::Segment(s) => s,
            other => panic!("shape is not a segment shape (found {})", other.name()),
        }
    }

    #[track_caller]
    pub(crate) fn poly_mut(&mut self) -> &mut PolyShape {
        match &mut self.kind {
            ShapeKind::Poly(p) => p,
            other => panic!("shape is not a poly shape (found {})", other.name()),
        }
    }

    #[track_caller]
    pub fn poly_vertex_count(&self) -> usize {
        self.poly().count()
    }

    #[track_caller]
    pub fn poly_vertex(&self, index: usize) -> Vec2 {
        self.poly().vertex(index)
    }

    #[track_caller]
    pub fn poly_radius(&self) -> f64 {
        self.poly().radius()
    }
}
