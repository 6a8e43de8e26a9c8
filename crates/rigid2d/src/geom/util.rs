use crate::Vec2;

/// 2D cross product (z component of `a × b`).
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Counterclockwise perpendicular `(-y, x)`.
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Clockwise perpendicular `(y, -x)`.
#[inline]
pub fn rperp(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    a * (1.0 - t) + b * t
}

/// Closest point to `p` on the closed segment `[a, b]` (clamped projection).
#[inline]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let delta = a - b;
    let len_sq = delta.norm_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = (delta.dot(&(p - b)) / len_sq).clamp(0.0, 1.0);
    b + delta * t
}

/// Unit vector along `v`, or zero when `v` has no usable length.
#[inline]
pub(crate) fn normalize_or_zero(v: Vec2) -> Vec2 {
    v.try_normalize(0.0).unwrap_or_else(Vec2::zeros)
}
