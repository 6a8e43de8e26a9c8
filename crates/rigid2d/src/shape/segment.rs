use super::{circle_segment_query, PointQueryInfo, SegmentQueryInfo};
use crate::geom::{closest_point_on_segment, cross, lerp, perp, Aabb};
use crate::{Rot, Vec2};

/// Capsule: the segment `a → b` thickened by radius `r`.
#[derive(Clone, Debug)]
pub struct SegmentShape {
    a: Vec2,
    b: Vec2,
    n: Vec2,
    r: f64,
    ta: Vec2,
    tb: Vec2,
    tn: Vec2,
}

impl SegmentShape {
    pub fn new(a: Vec2, b: Vec2, radius: f64) -> Self {
        let n = perp(b - a).try_normalize(0.0).unwrap_or_else(Vec2::zeros);
        Self {
            a,
            b,
            n,
            r: radius,
            ta: a,
            tb: b,
            tn: n,
        }
    }

    #[inline]
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.a, self.b)
    }

    #[inline]
    pub fn normal(&self) -> Vec2 {
        self.n
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.r
    }

    #[inline]
    pub fn world_endpoints(&self) -> (Vec2, Vec2) {
        (self.ta, self.tb)
    }

    pub fn update(&mut self, p: Vec2, rot: &Rot) -> Aabb {
        self.ta = p + rot * self.a;
        self.tb = p + rot * self.b;
        self.tn = rot * self.n;
        Aabb::new(self.ta.inf(&self.tb), self.ta.sup(&self.tb)).inflate(self.r)
    }

    pub fn point_query(&self, p: Vec2, eps: f64) -> PointQueryInfo {
        let closest = closest_point_on_segment(p, self.ta, self.tb);
        let delta = p - closest;
        let d = delta.norm();
        // On the core line the direction is undefined; use the face normal.
        let gradient = if d > eps { delta / d } else { self.tn };
        let point = if d > 0.0 {
            closest + gradient * self.r
        } else {
            closest
        };
        PointQueryInfo {
            point,
            distance: d - self.r,
            gradient,
        }
    }

    /// Ray against the offset face on the side facing `a`, falling back to the
    /// rounded end caps when the ray passes beyond the endpoints.
    pub fn segment_query(&self, a: Vec2, b: Vec2, radius: f64) -> Option<SegmentQueryInfo> {
        let n = self.tn;
        let d = (self.ta - a).dot(&n);
        let r = self.r + radius;

        let flipped_n = if d > 0.0 { -n } else { n };
        let seg_offset = flipped_n * r - a;

        // Endpoints relative to `a`, pushed out by the combined thickness.
        let seg_a = self.ta + seg_offset;
        let seg_b = self.tb + seg_offset;
        let delta = b - a;

        if cross(delta, seg_a) * cross(delta, seg_b) <= 0.0 {
            let d_offset = d + if d > 0.0 { -r } else { r };
            let ad = -d_offset;
            let bd = delta.dot(&n) - d_offset;
            if ad * bd < 0.0 {
                let t = ad / (ad - bd);
                return Some(SegmentQueryInfo {
                    point: lerp(a, b, t) - flipped_n * radius,
                    normal: flipped_n,
                    alpha: t,
                });
            }
            None
        } else if r != 0.0 {
            let hit_a = circle_segment_query(self.ta, self.r, a, b, radius);
            let hit_b = circle_segment_query(self.tb, self.r, a, b, radius);
            match (hit_a, hit_b) {
                (Some(ha), Some(hb)) => Some(if ha.alpha < hb.alpha { ha } else { hb }),
                (ha, hb) => ha.or(hb),
            }
        } else {
            None
        }
    }
}
