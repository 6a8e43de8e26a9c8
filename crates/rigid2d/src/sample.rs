//! Deterministic random point clouds and convex polygons.
//!
//! Purpose
//! - Reproducible inputs for hull tests, benches, and the CLI `sample` command.
//!   Every draw is addressed by a replay token `(seed, index)`, so a single
//!   failing case can be regenerated without replaying the whole run.
//!
//! Model
//! - `draw_cloud`: `n` points from a uniform box, disc, or ring.
//! - `draw_polygon_radial`: `n` jittered angles around a circle with radial
//!   jitter, hull-reduced; always convex and clockwise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::geom::convex_hull;
use crate::Vec2;

/// Point count distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointCount {
    Fixed(usize),
    Uniform { min: usize, max: usize },
}

impl PointCount {
    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        match *self {
            PointCount::Fixed(n) => n,
            PointCount::Uniform { min, max } => rng.gen_range(min..=max.max(min)),
        }
    }
}

/// Spatial distribution of a cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CloudDist {
    /// Uniform in the square `[-extent, extent]²`.
    Square,
    /// Uniform in the disc of radius `extent`.
    Disc,
    /// Uniform on the annulus `[inner * extent, extent]`. Mostly hull vertices.
    Ring { inner: f64 },
}

/// Point-cloud sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudCfg {
    pub count: PointCount,
    pub extent: f64,
    pub dist: CloudDist,
}

impl Default for CloudCfg {
    fn default() -> Self {
        Self {
            count: PointCount::Fixed(64),
            extent: 1.0,
            dist: CloudDist::Square,
        }
    }
}

/// Radial-jitter polygon sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialCfg {
    pub count: PointCount,
    /// Angular jitter as a fraction of the spacing `2π/n`, clamped to `[0, 0.49]`.
    pub angle_jitter_frac: f64,
    /// Radii are `base_radius * (1 + u)` with `u ∈ [-radial_jitter, radial_jitter]`.
    pub radial_jitter: f64,
    pub base_radius: f64,
}

impl Default for RadialCfg {
    fn default() -> Self {
        Self {
            count: PointCount::Fixed(12),
            angle_jitter_frac: 0.3,
            radial_jitter: 0.25,
            base_radius: 1.0,
        }
    }
}

/// Replay token making draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    /// The token after this one in the same stream.
    pub fn next(self) -> Self {
        Self {
            seed: self.seed,
            index: self.index.wrapping_add(1),
        }
    }

    fn to_std_rng(self) -> StdRng {
        // SplitMix64 finalizer.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Draw a point cloud.
pub fn draw_cloud(cfg: CloudCfg, tok: ReplayToken) -> Vec<Vec2> {
    let mut rng = tok.to_std_rng();
    let n = cfg.count.sample(&mut rng);
    let e = cfg.extent.abs();
    (0..n)
        .map(|_| match cfg.dist {
            CloudDist::Square => Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)) * e,
            CloudDist::Disc => polar(&mut rng, 0.0, e),
            CloudDist::Ring { inner } => polar(&mut rng, inner.clamp(0.0, 1.0) * e, e),
        })
        .collect()
}

/// Area-uniform point on the annulus `[r0, r1]`.
fn polar<R: Rng>(rng: &mut R, r0: f64, r1: f64) -> Vec2 {
    let th = rng.gen::<f64>() * TAU;
    let u: f64 = rng.gen();
    let r = (r0 * r0 + u * (r1 * r1 - r0 * r0)).sqrt();
    Vec2::new(th.cos() * r, th.sin() * r)
}

/// Draw a random convex polygon (clockwise vertices) by radial jitter and hull reduction.
///
/// At least three angles are drawn; the result can still lose vertices to the
/// hull when radial jitter pushes one inside its neighbours' chord.
pub fn draw_polygon_radial(cfg: RadialCfg, tok: ReplayToken) -> Vec<Vec2> {
    let mut rng = tok.to_std_rng();
    let n = cfg.count.sample(&mut rng).max(3);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.49);
    let rj = cfg.radial_jitter.max(0.0);
    let r0 = cfg.base_radius.max(1e-9);
    let delta = TAU / (n as f64);
    let phase = rng.gen::<f64>() * TAU;
    let pts: Vec<Vec2> = (0..n)
        .map(|k| {
            let th = phase + (k as f64) * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let u = (rng.gen::<f64>() * 2.0 - 1.0) * rj;
            let r = (1.0 + u).max(1e-6) * r0;
            Vec2::new(th.cos() * r, th.sin() * r)
        })
        .collect();
    convex_hull(&pts, 0.0).verts
}
