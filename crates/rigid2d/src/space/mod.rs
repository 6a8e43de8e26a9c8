//! Space: bodies, shapes, the two shape indices, and the query lock.
//!
//! Purpose
//! - Own every body and shape behind generation-checked handles (`BodyId`,
//!   `ShapeId`); a shape refers to its body by handle only.
//! - Keep two independent shape collections: "active" (dynamic bodies, moved
//!   every step) and "static" (immovable, reindexed on request), each behind a
//!   `SpatialIndex`.
//! - Dispatch point / segment / box queries (see `query.rs`).
//!
//! Locking
//! - Queries that run user callbacks hold a scoped lock for their duration. A
//!   callback receives `&Space`; structural changes are requested with
//!   `Space::defer` and committed in request order when the lock is released,
//!   on every exit path (normal return, callback error, unwinding).
//!
//! Code cross-refs: `shape::{Shape, QueryFilter}`, `index::{SpatialIndex, LinearIndex}`.

mod arena;
mod index;
mod query;
mod types;

pub use index::{LinearIndex, SpatialIndex};
pub use types::{Body, BodyId, BodyKind, Mutation, PointQueryHit, SegmentQueryHit, ShapeId};

use std::cell::RefCell;
use std::ops::Deref;

use arena::Arena;

use crate::geom::GeomCfg;
use crate::shape::Shape;
use crate::Vec2;

pub struct Space {
    cfg: GeomCfg,
    bodies: Arena<Body>,
    shapes: Arena<Shape>,
    static_body: BodyId,
    active: Box<dyn SpatialIndex>,
    statics: Box<dyn SpatialIndex>,
    locked: bool,
    pending: RefCell<Vec<Mutation>>,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Space {
    pub fn new() -> Self {
        Self::with_cfg(GeomCfg::default())
    }

    pub fn with_cfg(cfg: GeomCfg) -> Self {
        Self::with_indices(cfg, Box::new(LinearIndex::new()), Box::new(LinearIndex::new()))
    }

    /// Space backed by caller-provided broad-phase indices.
    pub fn with_indices(
        cfg: GeomCfg,
        active: Box<dyn SpatialIndex>,
        statics: Box<dyn SpatialIndex>,
    ) -> Self {
        let mut bodies = Arena::default();
        let static_body = BodyId(bodies.insert(Body::new_static()));
        Self {
            cfg,
            bodies,
            shapes: Arena::default(),
            static_body,
            active,
            statics,
            locked: false,
            pending: RefCell::new(Vec::new()),
        }
    }

    #[inline]
    pub fn cfg(&self) -> &GeomCfg {
        &self.cfg
    }

    /// The built-in static body (never removed).
    #[inline]
    pub fn static_body(&self) -> BodyId {
        self.static_body
    }

    /// True while a query holding the lock is running.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // Bodies

    pub fn add_body(&mut self, body: Body) -> BodyId {
        BodyId(self.bodies.insert(body))
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    /// Mutable body access. Transform changes reach the shapes at the next
    /// `refresh_world_caches` (dynamic) or `reindex_static` (static).
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)
    }

    /// Set position and angle; returns `false` for a stale handle.
    pub fn set_body_transform(&mut self, id: BodyId, p: Vec2, angle: f64) -> bool {
        match self.bodies.get_mut(id.0) {
            Some(body) => {
                body.p = p;
                body.set_angle(angle);
                true
            }
            None => false,
        }
    }

    /// Remove a body and every shape attached to it.
    #[track_caller]
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        assert!(id != self.static_body, "the space's static body cannot be removed");
        if !self.bodies.contains(id.0) {
            return None;
        }
        let attached: Vec<ShapeId> = self
            .shapes
            .iter()
            .filter(|(_, shape)| shape.body() == id)
            .map(|(h, _)| ShapeId(h))
            .collect();
        for shape in &attached {
            self.remove_shape(*shape);
        }
        tracing::debug!(body = ?id, shapes = attached.len(), "body removed");
        self.bodies.remove(id.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().map(|(h, b)| (BodyId(h), b))
    }

    // Shapes

    /// Insert a shape, cache it at its body's transform, and index it in the
    /// collection matching the body kind. Panics if the body is not in this space.
    #[track_caller]
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        let body = match self.bodies.get(shape.body().0) {
            Some(body) => body,
            None => panic!("shape body {:?} is not in this space", shape.body()),
        };
        let is_static = body.is_static();
        let bb = shape.update(body.p, &body.rot);
        let id = ShapeId(self.shapes.insert(shape));
        if is_static {
            self.statics.insert(id, bb);
        } else {
            self.active.insert(id, bb);
        }
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(id.0)?;
        if !self.active.remove(id) {
            self.statics.remove(id);
        }
        Some(shape)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter().map(|(h, s)| (ShapeId(h), s))
    }

    pub fn set_shape_filter(&mut self, id: ShapeId, layers: u32, group: u32) -> bool {
        match self.shapes.get_mut(id.0) {
            Some(shape) => {
                shape.layers = layers;
                shape.group = group;
                true
            }
            None => false,
        }
    }

    pub fn set_sensor(&mut self, id: ShapeId, sensor: bool) -> bool {
        match self.shapes.get_mut(id.0) {
            Some(shape) => {
                shape.sensor = sensor;
                true
            }
            None => false,
        }
    }

    /// Replace a polygon's vertices (hull-reduced) and reindex it.
    /// Panics if the shape is not a polygon.
    #[track_caller]
    pub fn set_poly_vertices(&mut self, id: ShapeId, verts: &[Vec2], offset: Vec2) -> bool {
        let cfg = self.cfg;
        match self.shapes.get_mut(id.0) {
            Some(shape) => shape.poly_mut().set_vertices(verts, offset, &cfg),
            None => return false,
        }
        self.reindex_shape(id)
    }

    /// Change a polygon's skin radius and reindex it.
    #[track_caller]
    pub fn set_poly_radius(&mut self, id: ShapeId, radius: f64) -> bool {
        match self.shapes.get_mut(id.0) {
            Some(shape) => shape.poly_mut().set_radius(radius),
            None => return false,
        }
        self.reindex_shape(id)
    }

    // World caches

    /// Recompute every active shape's world cache from its body and update the
    /// active index. Call once per step after bodies moved.
    pub fn refresh_world_caches(&mut self) {
        let mut count = 0usize;
        for (h, shape) in self.shapes.iter_mut() {
            let Some(body) = self.bodies.get(shape.body().0) else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            let bb = shape.update(body.p, &body.rot);
            self.active.update(ShapeId(h), bb);
            count += 1;
        }
        tracing::trace!(count, "active shapes recached");
    }

    /// Recompute and reindex every static shape.
    pub fn reindex_static(&mut self) {
        let mut count = 0usize;
        for (h, shape) in self.shapes.iter_mut() {
            let Some(body) = self.bodies.get(shape.body().0) else {
                continue;
            };
            if !body.is_static() {
                continue;
            }
            let bb = shape.update(body.p, &body.rot);
            self.statics.update(ShapeId(h), bb);
            count += 1;
        }
        tracing::trace!(count, "static shapes recached");
    }

    /// Recompute and reindex one shape; `false` for a stale handle.
    pub fn reindex_shape(&mut self, id: ShapeId) -> bool {
        let Some(shape) = self.shapes.get_mut(id.0) else {
            return false;
        };
        let Some(body) = self.bodies.get(shape.body().0) else {
            return false;
        };
        let bb = shape.update(body.p, &body.rot);
        if body.is_static() {
            self.statics.update(id, bb);
        } else {
            self.active.update(id, bb);
        }
        true
    }

    // Lock

    /// Queue a structural change from inside a query callback.
    ///
    /// Panics when the space is not locked: outside queries, mutate directly.
    #[track_caller]
    pub fn defer(&self, mutation: Mutation) {
        assert!(
            self.locked,
            "mutations can only be deferred while a query holds the space lock"
        );
        self.pending.borrow_mut().push(mutation);
    }

    fn run_deferred(&mut self) {
        let ops = std::mem::take(self.pending.get_mut());
        if ops.is_empty() {
            return;
        }
        tracing::debug!(count = ops.len(), "committing deferred mutations");
        for op in ops {
            match op {
                Mutation::AddShape(shape) => {
                    if self.bodies.contains(shape.body().0) {
                        self.add_shape(shape);
                    } else {
                        tracing::warn!(body = ?shape.body(), "deferred shape add for a removed body");
                    }
                }
                Mutation::RemoveShape(id) => {
                    if self.remove_shape(id).is_none() {
                        tracing::warn!(shape = ?id, "deferred removal of a stale shape");
                    }
                }
                Mutation::RemoveBody(id) => {
                    if id == self.static_body {
                        tracing::warn!("deferred removal of the static body ignored");
                    } else if self.remove_body(id).is_none() {
                        tracing::warn!(body = ?id, "deferred removal of a stale body");
                    }
                }
            }
        }
    }
}

/// Scoped space lock: set on creation, released (and deferred mutations
/// committed) on drop.
pub(crate) struct SpaceLock<'a> {
    space: &'a mut Space,
}

impl<'a> SpaceLock<'a> {
    pub(crate) fn new(space: &'a mut Space) -> Self {
        space.locked = true;
        Self { space }
    }
}

impl Deref for SpaceLock<'_> {
    type Target = Space;

    fn deref(&self) -> &Space {
        &*self.space
    }
}

impl Drop for SpaceLock<'_> {
    fn drop(&mut self) {
        self.space.locked = false;
        self.space.run_deferred();
    }
}

#[cfg(test)]
mod tests;
