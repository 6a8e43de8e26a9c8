//! Handles, bodies, deferred mutations, and dispatcher result records.

use super::arena::Handle;
use crate::shape::{PointQueryInfo, SegmentQueryInfo, Shape};
use crate::{Rot, Vec2};

/// Stable handle to a body owned by a `Space`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) Handle);

/// Stable handle to a shape owned by a `Space`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) Handle);

/// Which shape collection a body's shapes live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Moves every step; shapes go to the active index.
    Dynamic,
    /// Immovable; shapes go to the static index and are only reindexed on request.
    Static,
}

/// Rigid body transform and velocities.
///
/// Velocities are carried for callers (solver, gameplay); nothing in this crate
/// integrates them.
#[derive(Clone, Debug)]
pub struct Body {
    pub p: Vec2,
    pub rot: Rot,
    pub v: Vec2,
    pub w: f64,
    kind: BodyKind,
}

impl Body {
    fn with_kind(kind: BodyKind) -> Self {
        Self {
            p: Vec2::zeros(),
            rot: Rot::identity(),
            v: Vec2::zeros(),
            w: 0.0,
            kind,
        }
    }

    pub fn new_dynamic() -> Self {
        Self::with_kind(BodyKind::Dynamic)
    }

    pub fn new_static() -> Self {
        Self::with_kind(BodyKind::Static)
    }

    pub fn with_position(mut self, p: Vec2) -> Self {
        self.p = p;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.rot = Rot::new(angle);
        self
    }

    #[inline]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.rot.angle()
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.rot = Rot::new(angle);
    }

    #[inline]
    pub fn local_to_world(&self, v: Vec2) -> Vec2 {
        self.p + self.rot * v
    }

    #[inline]
    pub fn world_to_local(&self, v: Vec2) -> Vec2 {
        self.rot.inverse() * (v - self.p)
    }
}

/// Structural change requested while a query holds the space lock.
///
/// Committed in request order when the query releases the lock.
#[derive(Clone, Debug)]
pub enum Mutation {
    AddShape(Shape),
    RemoveShape(ShapeId),
    /// Removes the body and every shape attached to it.
    RemoveBody(BodyId),
}

/// Point query hit reported by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointQueryHit {
    pub shape: ShapeId,
    pub info: PointQueryInfo,
}

/// Segment query hit reported by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentQueryHit {
    pub shape: ShapeId,
    pub info: SegmentQueryInfo,
}
