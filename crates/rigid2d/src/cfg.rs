//! Tolerance defaults (internal).
//!
//! Policy
//! - Defaults are fixed constants; `GeomCfg` carries them so a `Space` can
//!   override them without touching call sites.

/// Distance below which a point query stops trusting `(p - closest) / dist` and
/// falls back to the owning edge normal.
pub(crate) const GRADIENT_EPS: f64 = 1e-5;
/// Hull partition tolerance: points within this distance of a hull edge are
/// treated as collinear and dropped.
pub(crate) const HULL_TOL: f64 = 0.0;
