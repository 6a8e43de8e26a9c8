//! JSON scene files: bodies with shapes, loaded into a `Space`.
//!
//! ```json
//! {
//!   "statics": [{ "kind": "box", "width": 20, "height": 20, "name": "ground" }],
//!   "bodies": [{
//!     "position": [30, 0], "angle": 0.0,
//!     "shapes": [{ "kind": "circle", "radius": 1, "layers": 2, "sensor": true }]
//!   }]
//! }
//! ```

use anyhow::{bail, Context, Result};
use rigid2d::shape::ALL_LAYERS;
use rigid2d::{Body, BodyId, Shape, ShapeId, Space, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SceneFile {
    /// Shapes attached to the space's static body.
    #[serde(default)]
    pub statics: Vec<ShapeSpec>,
    #[serde(default)]
    pub bodies: Vec<BodySpec>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BodySpec {
    pub position: [f64; 2],
    #[serde(default)]
    pub angle: f64,
    /// Static bodies are indexed with the immovable shapes.
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub shapes: Vec<ShapeSpec>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Circle {
        radius: f64,
        #[serde(default)]
        offset: [f64; 2],
    },
    Segment {
        a: [f64; 2],
        b: [f64; 2],
        #[serde(default)]
        radius: f64,
    },
    Poly {
        verts: Vec<[f64; 2]>,
        #[serde(default)]
        radius: f64,
    },
    Box {
        width: f64,
        height: f64,
        #[serde(default)]
        radius: f64,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ShapeSpec {
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "all_layers")]
    pub layers: u32,
    #[serde(default)]
    pub group: u32,
    #[serde(default)]
    pub sensor: bool,
}

fn all_layers() -> u32 {
    ALL_LAYERS
}

pub fn vec2(p: [f64; 2]) -> Vec2 {
    Vec2::new(p[0], p[1])
}

/// A loaded space plus display names for its shapes.
pub struct Scene {
    pub space: Space,
    names: BTreeMap<ShapeId, String>,
}

impl Scene {
    pub fn name(&self, id: ShapeId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{id:?}"))
    }
}

impl SceneFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading scene {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing scene {}", path.display()))
    }

    /// Build a space; shapes without a name are labelled by file order.
    pub fn build(&self) -> Result<Scene> {
        let mut space = Space::new();
        let mut names = BTreeMap::new();
        let mut counter = 0usize;

        let static_body = space.static_body();
        for spec in &self.statics {
            let id = add_shape(&mut space, static_body, spec)
                .with_context(|| format!("static shape #{counter}"))?;
            names.insert(id, label(spec, counter));
            counter += 1;
        }
        for (bi, body) in self.bodies.iter().enumerate() {
            let proto = if body.is_static {
                Body::new_static()
            } else {
                Body::new_dynamic()
            };
            let body_id = space.add_body(proto.with_position(vec2(body.position)).with_angle(body.angle));
            for spec in &body.shapes {
                let id = add_shape(&mut space, body_id, spec)
                    .with_context(|| format!("body #{bi}, shape #{counter}"))?;
                names.insert(id, label(spec, counter));
                counter += 1;
            }
        }
        tracing::debug!(
            bodies = self.bodies.len(),
            shapes = space.shape_count(),
            "scene built"
        );
        Ok(Scene { space, names })
    }
}

fn label(spec: &ShapeSpec, index: usize) -> String {
    spec.name.clone().unwrap_or_else(|| format!("shape{index}"))
}

fn add_shape(space: &mut Space, body: BodyId, spec: &ShapeSpec) -> Result<ShapeId> {
    let shape = match &spec.geometry {
        Geometry::Circle { radius, offset } => Shape::new_circle(body, *radius, vec2(*offset)),
        Geometry::Segment { a, b, radius } => Shape::new_segment(body, vec2(*a), vec2(*b), *radius),
        Geometry::Poly { verts, radius } => {
            if verts.is_empty() {
                bail!("poly shape needs at least one vertex");
            }
            let verts: Vec<Vec2> = verts.iter().copied().map(vec2).collect();
            if let Some(i) = verts.iter().position(|v| !(v.x.is_finite() && v.y.is_finite())) {
                bail!("poly vertex {i} is not finite");
            }
            Shape::new_poly(body, &verts, Vec2::zeros(), *radius)
        }
        Geometry::Box {
            width,
            height,
            radius,
        } => Shape::new_box(body, *width, *height, *radius),
    };
    let shape = shape
        .with_filter(spec.layers, spec.group)
        .with_sensor(spec.sensor);
    Ok(space.add_shape(shape))
}
