//! Query dispatcher: point, nearest point, segment, first segment hit, box.
//!
//! Every query filters shapes through `QueryFilter::admits` before running the
//! per-shape test. "All" queries lock the space and hand each hit to a callback
//! together with `&Space`; "nearest" / "first" queries run no callbacks, skip
//! sensors, and take `&self`.
//!
//! Ordering
//! - Point and box queries visit the active index, then the static one.
//! - Segment queries visit the static index first. For the first-hit query the
//!   best fraction found there bounds the active traversal, so one pass over
//!   each index yields the global minimum.

use std::convert::Infallible;
use std::ops::ControlFlow;

use super::{PointQueryHit, SegmentQueryHit, ShapeId, Space, SpaceLock};
use crate::geom::Aabb;
use crate::shape::QueryFilter;
use crate::Vec2;

impl Space {
    /// Report every shape whose surface lies closer than `max_distance` to `point`.
    ///
    /// Order is unspecified. The space is locked while `f` runs.
    pub fn point_query<F>(&mut self, point: Vec2, max_distance: f64, filter: QueryFilter, mut f: F)
    where
        F: FnMut(&Space, &PointQueryHit),
    {
        let res = self.try_point_query(point, max_distance, filter, |space, hit| {
            f(space, hit);
            Ok::<(), Infallible>(())
        });
        if let Err(never) = res {
            match never {}
        }
    }

    /// `point_query` with a fallible callback: the first `Err` stops traversal,
    /// releases the lock, and is returned.
    pub fn try_point_query<E, F>(
        &mut self,
        point: Vec2,
        max_distance: f64,
        filter: QueryFilter,
        mut f: F,
    ) -> Result<(), E>
    where
        F: FnMut(&Space, &PointQueryHit) -> Result<(), E>,
    {
        let bb = Aabb::for_circle(point, max_distance.max(0.0));
        let lock = SpaceLock::new(self);
        let space: &Space = &lock;
        let eps = space.cfg.gradient_eps;
        let mut result = Ok(());

        for index in [&space.active, &space.statics] {
            index.query(bb, &mut |id| {
                let Some(shape) = space.shapes.get(id.0) else {
                    return ControlFlow::Continue(());
                };
                if !filter.admits(shape) {
                    return ControlFlow::Continue(());
                }
                let info = shape.point_query_eps(point, eps);
                if info.distance < max_distance {
                    if let Err(e) = f(space, &PointQueryHit { shape: id, info }) {
                        result = Err(e);
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            });
            if result.is_err() {
                break;
            }
        }

        drop(lock);
        result
    }

    /// Closest non-sensor shape within `max_distance` of `point`.
    pub fn point_query_nearest(
        &self,
        point: Vec2,
        max_distance: f64,
        filter: QueryFilter,
    ) -> Option<PointQueryHit> {
        let bb = Aabb::for_circle(point, max_distance.max(0.0));
        let eps = self.cfg.gradient_eps;
        let mut best: Option<PointQueryHit> = None;

        for index in [&self.active, &self.statics] {
            index.query(bb, &mut |id| {
                if let Some(shape) = self.shapes.get(id.0) {
                    if filter.admits(shape) && !shape.sensor {
                        let info = shape.point_query_eps(point, eps);
                        let bound = best.map_or(max_distance, |b| b.info.distance);
                        if info.distance < bound {
                            best = Some(PointQueryHit { shape: id, info });
                        }
                    }
                }
                ControlFlow::Continue(())
            });
        }
        best
    }

    /// Report every shape hit by the segment `start → end` swept by `radius`.
    ///
    /// Order is unspecified. The space is locked while `f` runs.
    pub fn segment_query<F>(
        &mut self,
        start: Vec2,
        end: Vec2,
        radius: f64,
        filter: QueryFilter,
        mut f: F,
    ) where
        F: FnMut(&Space, &SegmentQueryHit),
    {
        let res = self.try_segment_query(start, end, radius, filter, |space, hit| {
            f(space, hit);
            Ok::<(), Infallible>(())
        });
        if let Err(never) = res {
            match never {}
        }
    }

    /// `segment_query` with a fallible callback.
    pub fn try_segment_query<E, F>(
        &mut self,
        start: Vec2,
        end: Vec2,
        radius: f64,
        filter: QueryFilter,
        mut f: F,
    ) -> Result<(), E>
    where
        F: FnMut(&Space, &SegmentQueryHit) -> Result<(), E>,
    {
        let lock = SpaceLock::new(self);
        let space: &Space = &lock;
        let mut result = Ok(());

        for index in [&space.statics, &space.active] {
            index.segment_query(start, end, radius, 1.0, &mut |id| {
                let Some(shape) = space.shapes.get(id.0) else {
                    return ControlFlow::Continue(1.0);
                };
                if !filter.admits(shape) {
                    return ControlFlow::Continue(1.0);
                }
                if let Some(info) = shape.segment_query(start, end, radius) {
                    if let Err(e) = f(space, &SegmentQueryHit { shape: id, info }) {
                        result = Err(e);
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(1.0)
            });
            if result.is_err() {
                break;
            }
        }

        drop(lock);
        result
    }

    /// Earliest non-sensor hit along `start → end` across both collections.
    pub fn segment_query_first(
        &self,
        start: Vec2,
        end: Vec2,
        radius: f64,
        filter: QueryFilter,
    ) -> Option<SegmentQueryHit> {
        let mut best: Option<SegmentQueryHit> = None;

        for index in [&self.statics, &self.active] {
            let t_exit = best.map_or(1.0, |b| b.info.alpha);
            index.segment_query(start, end, radius, t_exit, &mut |id| {
                if let Some(shape) = self.shapes.get(id.0) {
                    if filter.admits(shape) && !shape.sensor {
                        if let Some(info) = shape.segment_query(start, end, radius) {
                            if best.map_or(true, |b| info.alpha < b.info.alpha) {
                                best = Some(SegmentQueryHit { shape: id, info });
                            }
                        }
                    }
                }
                ControlFlow::Continue(best.map_or(1.0, |b| b.info.alpha))
            });
        }
        best
    }

    /// Report every shape whose world box intersects `bb`.
    ///
    /// Order is unspecified. The space is locked while `f` runs.
    pub fn bb_query<F>(&mut self, bb: Aabb, filter: QueryFilter, mut f: F)
    where
        F: FnMut(&Space, ShapeId),
    {
        let res = self.try_bb_query(bb, filter, |space, id| {
            f(space, id);
            Ok::<(), Infallible>(())
        });
        if let Err(never) = res {
            match never {}
        }
    }

    /// `bb_query` with a fallible callback.
    pub fn try_bb_query<E, F>(&mut self, bb: Aabb, filter: QueryFilter, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Space, ShapeId) -> Result<(), E>,
    {
        let lock = SpaceLock::new(self);
        let space: &Space = &lock;
        let mut result = Ok(());

        for index in [&space.active, &space.statics] {
            index.query(bb, &mut |id| {
                let Some(shape) = space.shapes.get(id.0) else {
                    return ControlFlow::Continue(());
                };
                if filter.admits(shape) && bb.intersects(&shape.bb()) {
                    if let Err(e) = f(space, id) {
                        result = Err(e);
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            });
            if result.is_err() {
                break;
            }
        }

        drop(lock);
        result
    }
}
