//! Area, centroid, and moment of inertia helpers for clockwise polygons and the
//! other primitive shapes.

use std::f64::consts::PI;

use super::util::cross;
use crate::Vec2;

/// Area of a clockwise polygon grown by a skin radius `r`.
pub fn area_for_poly(verts: &[Vec2], r: f64) -> f64 {
    let count = verts.len();
    let mut area = 0.0;
    let mut perimeter = 0.0;
    for i in 0..count {
        let v1 = verts[i];
        let v2 = verts[(i + 1) % count];
        area += cross(v1, v2);
        perimeter += (v1 - v2).norm();
    }
    // Clockwise winding makes the shoelace sum negative.
    -area / 2.0 + r * (PI * r.abs() + perimeter)
}

/// Area centroid of a polygon; `None` for zero-area input.
pub fn centroid_for_poly(verts: &[Vec2]) -> Option<Vec2> {
    let count = verts.len();
    let mut sum = 0.0;
    let mut vsum = Vec2::zeros();
    for i in 0..count {
        let v1 = verts[i];
        let v2 = verts[(i + 1) % count];
        let c = cross(v1, v2);
        sum += c;
        vsum += (v1 + v2) * c;
    }
    if sum.abs() < 1e-18 {
        return None;
    }
    Some(vsum / (3.0 * sum))
}

/// Moment of inertia of a solid polygon of mass `m` about the origin, after
/// shifting its vertices by `offset`.
pub fn moment_for_poly(m: f64, verts: &[Vec2], offset: Vec2) -> f64 {
    let count = verts.len();
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for i in 0..count {
        let v1 = verts[i] + offset;
        let v2 = verts[(i + 1) % count] + offset;
        let a = cross(v2, v1);
        let b = v1.dot(&v1) + v1.dot(&v2) + v2.dot(&v2);
        sum1 += a * b;
        sum2 += a;
    }
    m * sum1 / (6.0 * sum2)
}

/// Moment of inertia of a solid `w × h` box centered on the origin.
#[inline]
pub fn moment_for_box(m: f64, w: f64, h: f64) -> f64 {
    m * (w * w + h * h) / 12.0
}

/// Area of a ring with radii `r1`, `r2` (use 0 for a solid disc).
#[inline]
pub fn area_for_circle(r1: f64, r2: f64) -> f64 {
    PI * (r1 * r1 - r2 * r2).abs()
}

/// Moment of inertia of a ring with radii `r1`, `r2` centered at `offset`.
#[inline]
pub fn moment_for_circle(m: f64, r1: f64, r2: f64, offset: Vec2) -> f64 {
    m * (0.5 * (r1 * r1 + r2 * r2) + offset.norm_squared())
}

/// Area of a capsule of radius `r` around the segment `a → b`.
#[inline]
pub fn area_for_segment(a: Vec2, b: Vec2, r: f64) -> f64 {
    r * (PI * r + 2.0 * (a - b).norm())
}

/// Moment of inertia of a thin rod `a → b` about the origin.
#[inline]
pub fn moment_for_segment(m: f64, a: Vec2, b: Vec2) -> f64 {
    let length = (b - a).norm();
    let center = (a + b) * 0.5;
    m * (length * length / 12.0 + center.norm_squared())
}

/// Translate `verts` so their area centroid sits at the origin.
///
/// Zero-area input is left untouched.
pub fn recenter_poly(verts: &mut [Vec2]) {
    if let Some(c) = centroid_for_poly(verts) {
        for v in verts.iter_mut() {
            *v -= c;
        }
    }
}
