use super::{PointQueryInfo, SegmentQueryInfo};
use crate::geom::{lerp, Aabb};
use crate::{Rot, Vec2};

/// Solid disc of radius `r` centered at a body-local offset.
#[derive(Clone, Debug)]
pub struct CircleShape {
    c: Vec2,
    r: f64,
    tc: Vec2,
}

impl CircleShape {
    pub fn new(radius: f64, offset: Vec2) -> Self {
        Self {
            c: offset,
            r: radius,
            tc: offset,
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.r
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.c
    }

    #[inline]
    pub fn world_center(&self) -> Vec2 {
        self.tc
    }

    pub fn update(&mut self, p: Vec2, rot: &Rot) -> Aabb {
        self.tc = p + rot * self.c;
        Aabb::for_circle(self.tc, self.r)
    }

    pub fn point_query(&self, p: Vec2, eps: f64) -> PointQueryInfo {
        let delta = p - self.tc;
        let d = delta.norm();
        // Pick "up" when the query point sits on the center.
        let gradient = if d > eps {
            delta / d
        } else {
            Vec2::new(0.0, 1.0)
        };
        PointQueryInfo {
            point: self.tc + gradient * self.r,
            distance: d - self.r,
            gradient,
        }
    }

    pub fn segment_query(&self, a: Vec2, b: Vec2, radius: f64) -> Option<SegmentQueryInfo> {
        circle_segment_query(self.tc, self.r, a, b, radius)
    }
}

/// Entry of the segment `a → b` swept by `r2` into the disc `(center, r1)`.
///
/// Segments starting inside the disc report no hit.
pub(crate) fn circle_segment_query(
    center: Vec2,
    r1: f64,
    a: Vec2,
    b: Vec2,
    r2: f64,
) -> Option<SegmentQueryInfo> {
    let rsum = r1 + r2;
    if rsum <= 0.0 {
        return None;
    }
    let da = a - center;
    let db = b - center;

    let qa = da.dot(&da) - 2.0 * da.dot(&db) + db.dot(&db);
    let qb = da.dot(&db) - da.dot(&da);
    let det = qb * qb - qa * (da.dot(&da) - rsum * rsum);
    if det < 0.0 {
        return None;
    }
    let t = (-qb - det.sqrt()) / qa;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let n = lerp(da, db, t).try_normalize(0.0)?;
    Some(SegmentQueryInfo {
        point: lerp(a, b, t) - n * r2,
        normal: n,
        alpha: t,
    })
}
