//! Convex polygon shape with a rounding skin radius.
//!
//! Layout
//! - `verts[i]` are clockwise local vertices; `planes[i]` is the splitting plane
//!   of the edge *ending* at `verts[i]`, i.e. `(verts[i - 1], verts[i])`.
//! - `t_verts` / `t_planes` are the same data in world space, refreshed by
//!   `update` once per step.

use super::{circle_segment_query, PointQueryInfo, SegmentQueryInfo};
use crate::geom::{
    closest_point_on_segment, convex_hull, cross, lerp, validate_poly, Aabb, GeomCfg, PolyError,
    SplittingPlane,
};
use crate::{Rot, Vec2};

#[derive(Clone, Debug)]
pub struct PolyShape {
    verts: Vec<Vec2>,
    planes: Vec<SplittingPlane>,
    t_verts: Vec<Vec2>,
    t_planes: Vec<SplittingPlane>,
    r: f64,
}

impl PolyShape {
    /// Hull-reduce `verts`, shift by `offset`, and build one plane per edge.
    ///
    /// Panics if `verts` is empty.
    #[track_caller]
    pub fn new(verts: &[Vec2], offset: Vec2, radius: f64) -> Self {
        Self::new_with_cfg(verts, offset, radius, &GeomCfg::default())
    }

    #[track_caller]
    pub fn new_with_cfg(verts: &[Vec2], offset: Vec2, radius: f64, cfg: &GeomCfg) -> Self {
        let mut poly = Self {
            verts: Vec::new(),
            planes: Vec::new(),
            t_verts: Vec::new(),
            t_planes: Vec::new(),
            r: radius,
        };
        poly.set_up_verts(verts, offset, cfg.hull_tol);
        poly
    }

    /// Axis-aligned `width × height` box centered on the origin.
    pub fn box_shape(width: f64, height: f64, radius: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::box_from_bb(&Aabb::from_extents(-hw, -hh, hw, hh), radius)
    }

    /// Box covering `bb` in body-local coordinates.
    pub fn box_from_bb(bb: &Aabb, radius: f64) -> Self {
        let verts = [
            Vec2::new(bb.min.x, bb.min.y),
            Vec2::new(bb.min.x, bb.max.y),
            Vec2::new(bb.max.x, bb.max.y),
            Vec2::new(bb.max.x, bb.min.y),
        ];
        Self::new(&verts, Vec2::zeros(), radius)
    }

    /// Trust `verts` as given (no hull reduction) after validating winding.
    pub fn try_from_raw(verts: &[Vec2], radius: f64) -> Result<Self, PolyError> {
        validate_poly(verts)?;
        let mut poly = Self {
            verts: verts.to_vec(),
            planes: Vec::new(),
            t_verts: Vec::new(),
            t_planes: Vec::new(),
            r: radius,
        };
        poly.rebuild_planes();
        Ok(poly)
    }

    /// Manual construction path; non-convex or counterclockwise input is a
    /// programmer error and panics.
    #[track_caller]
    pub fn from_raw_unchecked(verts: &[Vec2], radius: f64) -> Self {
        match Self::try_from_raw(verts, radius) {
            Ok(poly) => poly,
            Err(e) => panic!("invalid polygon vertices: {e}"),
        }
    }

    /// Replace the geometry wholesale (hull-reduced). The world cache is stale
    /// until the next `update`.
    #[track_caller]
    pub fn set_vertices(&mut self, verts: &[Vec2], offset: Vec2, cfg: &GeomCfg) {
        self.set_up_verts(verts, offset, cfg.hull_tol);
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.r = radius;
    }

    #[track_caller]
    fn set_up_verts(&mut self, verts: &[Vec2], offset: Vec2, tol: f64) {
        assert!(!verts.is_empty(), "polygon needs at least one vertex");
        let hull = convex_hull(verts, tol);
        self.verts = hull.verts.into_iter().map(|v| v + offset).collect();
        self.rebuild_planes();
        tracing::debug!(
            input = verts.len(),
            count = self.verts.len(),
            radius = self.r,
            "poly shape built"
        );
    }

    fn rebuild_planes(&mut self) {
        let count = self.verts.len();
        self.planes = (0..count)
            .map(|i| SplittingPlane::from_edge(self.verts[(i + count - 1) % count], self.verts[i]))
            .collect();
        self.t_verts = self.verts.clone();
        self.t_planes = self.planes.clone();
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.verts.len()
    }

    /// Local vertex `index`; panics when out of range.
    #[track_caller]
    pub fn vertex(&self, index: usize) -> Vec2 {
        assert!(
            index < self.verts.len(),
            "vertex index {index} out of range (count {})",
            self.verts.len()
        );
        self.verts[index]
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.r
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.verts
    }

    #[inline]
    pub fn planes(&self) -> &[SplittingPlane] {
        &self.planes
    }

    #[inline]
    pub fn world_vertices(&self) -> &[Vec2] {
        &self.t_verts
    }

    #[inline]
    pub fn world_planes(&self) -> &[SplittingPlane] {
        &self.t_planes
    }

    /// Transform vertices and planes into world space; returns the skin-inflated box.
    pub fn update(&mut self, p: Vec2, rot: &Rot) -> Aabb {
        for (dst, src) in self.t_planes.iter_mut().zip(&self.planes) {
            *dst = src.transform(p, rot);
        }
        let mut min = Vec2::repeat(f64::INFINITY);
        let mut max = Vec2::repeat(f64::NEG_INFINITY);
        for (dst, src) in self.t_verts.iter_mut().zip(&self.verts) {
            let v = p + rot * src;
            *dst = v;
            min = min.inf(&v);
            max = max.sup(&v);
        }
        Aabb::new(min, max).inflate(self.r)
    }

    /// Signed distance from `p` to the rounded polygon.
    ///
    /// Every edge is visited: one positive plane marks `p` as outside, and the
    /// closest boundary point is the minimum over all clamped edge projections.
    pub fn point_query(&self, p: Vec2, eps: f64) -> PointQueryInfo {
        let count = self.t_verts.len();
        let mut v0 = self.t_verts[count - 1];
        let mut min_dist = f64::INFINITY;
        let mut closest_point = Vec2::zeros();
        let mut closest_normal = Vec2::zeros();
        // A point or segment polygon has no interior.
        let mut outside = count < 3;

        for (&v1, plane) in self.t_verts.iter().zip(&self.t_planes) {
            if plane.compare(p) > 0.0 {
                outside = true;
            }
            let closest = closest_point_on_segment(p, v0, v1);
            let dist = (p - closest).norm();
            if dist < min_dist {
                min_dist = dist;
                closest_point = closest;
                closest_normal = plane.n;
            }
            v0 = v1;
        }

        let dist = if outside { min_dist } else { -min_dist };
        let gradient = if min_dist > eps {
            (p - closest_point) / dist
        } else if closest_normal.norm_squared() > 0.0 {
            closest_normal
        } else {
            Vec2::new(0.0, 1.0)
        };

        PointQueryInfo {
            point: closest_point + gradient * self.r,
            distance: dist - self.r,
            gradient,
        }
    }

    /// First crossing of `a → b` (swept by `radius`) with the rounded polygon.
    ///
    /// Edges are tested against their planes pushed out by `r + radius`, limited
    /// to the edge span; corners are tested as circles of the same radius.
    ///
    /// Corners are tested whenever `r + radius > 0`, not only when the polygon
    /// itself is rounded. A thick ray against a sharp polygon therefore hits a
    /// corner it grazes, reporting the corner as the hit point.
    pub fn segment_query(&self, a: Vec2, b: Vec2, radius: f64) -> Option<SegmentQueryInfo> {
        let count = self.t_verts.len();
        let rsum = self.r + radius;
        let mut best: Option<SegmentQueryInfo> = None;

        for (i, plane) in self.t_planes.iter().enumerate() {
            if plane.is_degenerate() {
                continue;
            }
            let n = plane.n;
            let an = a.dot(&n);
            let d = plane.d + rsum - an;
            if d > 0.0 {
                // `a` is already behind this face.
                continue;
            }
            let bn = b.dot(&n);
            let t = d / (bn - an);
            if !(0.0..=1.0).contains(&t) {
                continue;
            }

            let point = lerp(a, b, t);
            let dt = -cross(n, point);
            let dt_min = -cross(n, self.t_verts[(i + count - 1) % count]);
            let dt_max = -cross(n, self.t_verts[i]);
            if dt_min <= dt && dt <= dt_max && best.map_or(true, |h| t < h.alpha) {
                best = Some(SegmentQueryInfo {
                    point: point - n * radius,
                    normal: n,
                    alpha: t,
                });
            }
        }

        if rsum > 0.0 {
            for &v in &self.t_verts {
                if let Some(hit) = circle_segment_query(v, self.r, a, b, radius) {
                    if best.map_or(true, |h| hit.alpha < h.alpha) {
                        best = Some(hit);
                    }
                }
            }
        }
        best
    }
}
