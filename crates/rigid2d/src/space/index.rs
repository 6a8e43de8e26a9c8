//! Broad-phase contract consumed by the query dispatcher.
//!
//! The dispatcher never inspects an index's structure: it inserts / updates
//! boxes and asks for candidates. Visitors steer traversal through
//! `ControlFlow`: `Break` stops early, and segment visitors return the new upper
//! bound on the hit fraction so an index can prune everything behind it.

use std::collections::HashMap;
use std::ops::ControlFlow;

use super::types::ShapeId;
use crate::geom::Aabb;
use crate::Vec2;

/// Spatial acceleration structure over shape boxes.
pub trait SpatialIndex {
    fn insert(&mut self, id: ShapeId, bb: Aabb);
    /// Returns whether `id` was present.
    fn remove(&mut self, id: ShapeId) -> bool;
    /// Replace the stored box for `id` (inserting it when absent).
    fn update(&mut self, id: ShapeId, bb: Aabb);
    fn contains(&self, id: ShapeId) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Visit every entry whose box may overlap `bb`.
    fn query(&self, bb: Aabb, visit: &mut dyn FnMut(ShapeId) -> ControlFlow<()>);
    /// Visit entries whose box, grown by `radius`, the segment `a → b` enters at
    /// a fraction `<= t_exit`. `Continue(t)` lowers the bound to `t`.
    fn segment_query(
        &self,
        a: Vec2,
        b: Vec2,
        radius: f64,
        t_exit: f64,
        visit: &mut dyn FnMut(ShapeId) -> ControlFlow<(), f64>,
    );
}

/// Flat list of boxes, tested one by one.
///
/// Adequate for small scenes and as the reference the accelerated indices are
/// checked against.
#[derive(Clone, Debug, Default)]
pub struct LinearIndex {
    entries: Vec<(ShapeId, Aabb)>,
    slots: HashMap<ShapeId, usize>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for LinearIndex {
    fn insert(&mut self, id: ShapeId, bb: Aabb) {
        if let Some(&slot) = self.slots.get(&id) {
            self.entries[slot].1 = bb;
            return;
        }
        self.slots.insert(id, self.entries.len());
        self.entries.push((id, bb));
    }

    fn remove(&mut self, id: ShapeId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };
        self.entries.swap_remove(slot);
        if let Some(&(moved, _)) = self.entries.get(slot) {
            self.slots.insert(moved, slot);
        }
        true
    }

    fn update(&mut self, id: ShapeId, bb: Aabb) {
        self.insert(id, bb);
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.slots.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query(&self, bb: Aabb, visit: &mut dyn FnMut(ShapeId) -> ControlFlow<()>) {
        for (id, entry) in &self.entries {
            if entry.intersects(&bb) && visit(*id).is_break() {
                return;
            }
        }
    }

    fn segment_query(
        &self,
        a: Vec2,
        b: Vec2,
        radius: f64,
        t_exit: f64,
        visit: &mut dyn FnMut(ShapeId) -> ControlFlow<(), f64>,
    ) {
        let mut t_exit = t_exit;
        for (id, entry) in &self.entries {
            if entry.inflate(radius).segment_query(a, b) > t_exit {
                continue;
            }
            match visit(*id) {
                ControlFlow::Continue(t) => t_exit = t_exit.min(t),
                ControlFlow::Break(()) => return,
            }
        }
    }
}
