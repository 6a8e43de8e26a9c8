//! QuickHull reduction to clockwise convex polygons, plus winding validation.
//!
//! Model
//! - Seed the hull with the lexicographic (x, then y) minimum `a` and maximum `b`.
//! - Every remaining point strictly left of `a → b` (farther than `tol`) belongs to
//!   the upper chain, every point strictly left of `b → a` to the lower one.
//! - Each chain is reduced recursively: the farthest candidate becomes a hull
//!   vertex and splits its chain in two.
//! - Partitioning swaps in place inside a single scratch buffer; vertices are
//!   emitted in order, so the result is clockwise with `a` first.
//! - Rounding can leave a kept point whose turn, measured from its neighbours,
//!   reads as a left turn. Such points are pruned so the output always passes
//!   `poly_validate`; `a` is never pruned.

use std::fmt;

use super::util::cross;
use crate::Vec2;

/// Output of `convex_hull`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    /// Hull vertices, clockwise, starting at the lexicographic minimum.
    pub verts: Vec<Vec2>,
    /// Index in the *input* slice of `verts[0]`.
    pub first: usize,
}

/// Reduce `points` to a minimal clockwise convex polygon.
///
/// - `n <= 2` returns the input unchanged with `first = 0`.
/// - All-coincident inputs collapse to one point; collinear inputs to two.
/// - Points within `tol` of a hull edge are dropped.
/// - The result always satisfies `poly_validate`, including near-collinear float input.
///
/// Expected `O(n log n)`, worst case `O(n²)`.
pub fn convex_hull(points: &[Vec2], tol: f64) -> ConvexHull {
    if points.len() <= 2 {
        return ConvexHull {
            verts: points.to_vec(),
            first: 0,
        };
    }
    let (start, end) = loop_indexes(points);
    if start == end {
        tracing::debug!(count = points.len(), "hull input is a single repeated point");
        return ConvexHull {
            verts: vec![points[0]],
            first: 0,
        };
    }

    let mut scratch = points.to_vec();
    scratch.swap(0, start);
    // The original slot 0 moved to `start` if it held the maximum.
    scratch.swap(1, if end == 0 { start } else { end });
    let a = scratch[0];
    let b = scratch[1];

    let mut verts = Vec::with_capacity(points.len());
    verts.push(a);
    reduce(tol, &mut scratch[2..], a, b, a, &mut verts);
    let pruned = prune_left_turns(&mut verts);
    if pruned > 0 {
        tracing::debug!(pruned, "hull pruned vertices that turn left after rounding");
    }

    if verts.len() < points.len() {
        tracing::debug!(
            input = points.len(),
            hull = verts.len(),
            "hull dropped interior or collinear points"
        );
    }
    ConvexHull {
        verts,
        first: start,
    }
}

/// Indices of the lexicographic (x, then y) minimum and maximum.
fn loop_indexes(points: &[Vec2]) -> (usize, usize) {
    let mut start = 0;
    let mut end = 0;
    let mut min = points[0];
    let mut max = min;
    for (i, v) in points.iter().enumerate().skip(1) {
        if v.x < min.x || (v.x == min.x && v.y < min.y) {
            min = *v;
            start = i;
        } else if v.x > max.x || (v.x == max.x && v.y > max.y) {
            max = *v;
            end = i;
        }
    }
    (start, end)
}

/// Keep the points strictly left of `a → b` at the front of `verts` and move the
/// farthest one to index 0. Returns how many points were kept.
fn partition(verts: &mut [Vec2], a: Vec2, b: Vec2, tol: f64) -> usize {
    let delta = b - a;
    let value_tol = tol * delta.norm();
    let mut max = 0.0;
    let mut pivot = 0;
    let mut head = 0;
    let mut tail = verts.len();
    while head < tail {
        let value = cross(delta, verts[head] - a);
        if value > value_tol {
            if value > max {
                max = value;
                pivot = head;
            }
            head += 1;
        } else {
            tail -= 1;
            verts.swap(head, tail);
        }
    }
    if pivot != 0 {
        verts.swap(0, pivot);
    }
    head
}

/// Emit the hull chain strictly between `a` and `b` through the known vertex `pivot`.
///
/// `verts` holds the candidates left of `a → b`; it is reordered in place.
fn reduce(tol: f64, verts: &mut [Vec2], a: Vec2, pivot: Vec2, b: Vec2, out: &mut Vec<Vec2>) {
    let left = partition(verts, a, pivot, tol);
    if let Some((&mut far, rest)) = verts[..left].split_first_mut() {
        reduce(tol, rest, a, far, pivot, out);
    }
    out.push(pivot);

    let remaining = &mut verts[left..];
    let right = partition(remaining, pivot, b, tol);
    if let Some((&mut far, rest)) = remaining[..right].split_first_mut() {
        reduce(tol, rest, pivot, far, b, out);
    }
}

/// Remove vertices until no turn reads as a left turn under `first_left_turn`.
///
/// An offending triple is nearly collinear, so the vertex lying between the
/// other two is removed: the one outside the farthest-apart pair. `verts[0]`
/// stays, so it keeps matching the input index reported as `first`; if it is
/// the inner one, the triple member nearer to it goes instead. Returns the
/// number removed.
fn prune_left_turns(verts: &mut Vec<Vec2>) -> usize {
    let mut removed = 0;
    while let Some(i) = first_left_turn(verts) {
        let count = verts.len();
        let idx = [i, (i + 1) % count, (i + 2) % count];
        let dist = |j: usize, k: usize| (verts[idx[j]] - verts[idx[k]]).norm_squared();
        let (d01, d12, d02) = (dist(0, 1), dist(1, 2), dist(0, 2));
        let inner = if d02 >= d01 && d02 >= d12 {
            idx[1]
        } else if d01 >= d12 {
            idx[2]
        } else {
            idx[0]
        };
        let victim = if inner != 0 {
            inner
        } else {
            let (p, q) = match idx.iter().position(|&j| j == 0) {
                Some(0) => (idx[1], idx[2]),
                Some(1) => (idx[0], idx[2]),
                _ => (idx[0], idx[1]),
            };
            let origin = verts[0];
            if (verts[p] - origin).norm_squared() <= (verts[q] - origin).norm_squared() {
                p
            } else {
                q
            }
        };
        verts.remove(victim);
        removed += 1;
    }
    removed
}

/// Errors from validating an explicit vertex list.
#[derive(Clone, Debug, PartialEq)]
pub enum PolyError {
    /// No vertices at all.
    Empty,
    /// Vertex `index` is NaN or infinite.
    NonFinite { index: usize },
    /// The turn starting at vertex `index` bends left (non-convex or counterclockwise).
    NotConvex { index: usize },
}

impl fmt::Display for PolyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyError::Empty => write!(f, "polygon has no vertices"),
            PolyError::NonFinite { index } => write!(f, "vertex {index} is not finite"),
            PolyError::NotConvex { index } => write!(
                f,
                "vertices starting at {index} turn left (polygon must be convex and clockwise)"
            ),
        }
    }
}

impl std::error::Error for PolyError {}

/// Convex + clockwise check: no consecutive triple turns strictly left.
pub fn poly_validate(verts: &[Vec2]) -> bool {
    first_left_turn(verts).is_none()
}

/// Like `poly_validate`, but says what is wrong.
pub fn validate_poly(verts: &[Vec2]) -> Result<(), PolyError> {
    if verts.is_empty() {
        return Err(PolyError::Empty);
    }
    if let Some(index) = verts
        .iter()
        .position(|v| !(v.x.is_finite() && v.y.is_finite()))
    {
        return Err(PolyError::NonFinite { index });
    }
    match first_left_turn(verts) {
        Some(index) => Err(PolyError::NotConvex { index }),
        None => Ok(()),
    }
}

fn first_left_turn(verts: &[Vec2]) -> Option<usize> {
    let count = verts.len();
    (0..count).find(|&i| {
        let a = verts[i];
        let b = verts[(i + 1) % count];
        let c = verts[(i + 2) % count];
        cross(b - a, c - a) > 0.0
    })
}
