mod provenance;
mod scene;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rigid2d::geom::convex_hull;
use rigid2d::sample::{draw_cloud, CloudCfg, CloudDist, PointCount, ReplayToken};
use rigid2d::{Aabb, PointQueryHit, QueryFilter, SegmentQueryHit, Vec2};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

use provenance::{write_sidecar, Payload};
use scene::{vec2, Scene, SceneFile};

#[derive(Parser)]
#[command(name = "rigid2d")]
#[command(about = "Probe the 2D geometry core: hull reduction and space queries")]
struct Cmd {
    /// Write the JSON result here (plus a provenance sidecar) instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Reduce a JSON point list (`[[x, y], ...]`) to its convex hull
    Hull {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        tol: f64,
    },
    /// Shapes within a distance of a point (or the nearest one)
    Point {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        at: Vec2,
        #[arg(long, default_value_t = 0.0)]
        max_distance: f64,
        /// Report only the nearest non-sensor shape
        #[arg(long)]
        nearest: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Shapes crossed by a segment (or the first one hit)
    Segment {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        from: Vec2,
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        to: Vec2,
        #[arg(long, default_value_t = 0.0)]
        radius: f64,
        /// Report only the earliest non-sensor hit
        #[arg(long)]
        first: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Shapes whose bounding box overlaps `l,b,r,t`
    Bb {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long, value_parser = parse_bb, allow_hyphen_values = true)]
        bb: Aabb,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Draw a deterministic random point cloud
    Sample {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long, default_value_t = 32)]
        count: usize,
        #[arg(long, default_value_t = 1.0)]
        extent: f64,
        #[arg(long, value_enum, default_value_t = Dist::Square)]
        dist: Dist,
        /// Inner radius fraction for `ring`
        #[arg(long, default_value_t = 0.5)]
        inner: f64,
        /// Also report the hull of the drawn cloud
        #[arg(long)]
        hull: bool,
    },
}

#[derive(Args, Clone, Copy)]
struct FilterArgs {
    #[arg(long, default_value_t = u32::MAX)]
    layers: u32,
    #[arg(long, default_value_t = 0)]
    group: u32,
}

impl From<FilterArgs> for QueryFilter {
    fn from(f: FilterArgs) -> Self {
        QueryFilter::new(f.layers, f.group)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Dist {
    Square,
    Disc,
    Ring,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let (command, params, result) = match cmd.action {
        Action::Hull { input, tol } => (
            "hull",
            json!({ "input": input, "tol": tol }),
            hull(&input, tol)?,
        ),
        Action::Point {
            scene,
            at,
            max_distance,
            nearest,
            filter,
        } => (
            "point",
            json!({ "scene": scene, "at": [at.x, at.y], "max_distance": max_distance, "nearest": nearest }),
            point(&mut load(&scene)?, at, max_distance, nearest, filter.into()),
        ),
        Action::Segment {
            scene,
            from,
            to,
            radius,
            first,
            filter,
        } => (
            "segment",
            json!({ "scene": scene, "from": [from.x, from.y], "to": [to.x, to.y], "radius": radius, "first": first }),
            segment(&mut load(&scene)?, from, to, radius, first, filter.into()),
        ),
        Action::Bb { scene, bb, filter } => (
            "bb",
            json!({ "scene": scene, "bb": [bb.min.x, bb.min.y, bb.max.x, bb.max.y] }),
            bb_query(&mut load(&scene)?, bb, filter.into()),
        ),
        Action::Sample {
            seed,
            index,
            count,
            extent,
            dist,
            inner,
            hull,
        } => (
            "sample",
            json!({ "seed": seed, "index": index, "count": count, "extent": extent, "dist": format!("{dist:?}"), "inner": inner }),
            sample(seed, index, count, extent, dist, inner, hull),
        ),
    };
    emit(cmd.out.as_deref(), command, params, &result)
}

fn emit(out: Option<&Path>, command: &'static str, params: Value, result: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(result)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            let prov = write_sidecar(path, Payload::new(command, params))?;
            tracing::info!(out = %path.display(), provenance = %prov.display(), "wrote result");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn load(path: &Path) -> Result<Scene> {
    SceneFile::read(path)?.build()
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    let parts = parse_floats(s)?;
    match parts.as_slice() {
        [x, y] => Ok(Vec2::new(*x, *y)),
        _ => Err(format!("expected `x,y`, got `{s}`")),
    }
}

fn parse_bb(s: &str) -> Result<Aabb, String> {
    let parts = parse_floats(s)?;
    match parts.as_slice() {
        [l, b, r, t] if l <= r && b <= t => Ok(Aabb::from_extents(*l, *b, *r, *t)),
        [_, _, _, _] => Err(format!("box `{s}` has l > r or b > t")),
        _ => Err(format!("expected `l,b,r,t`, got `{s}`")),
    }
}

fn parse_floats(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad number `{}`: {e}", p.trim()))
        })
        .collect()
}

fn pair(v: Vec2) -> [f64; 2] {
    [v.x, v.y]
}

fn hull(input: &Path, tol: f64) -> Result<Value> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let raw: Vec<[f64; 2]> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing point list {}", input.display()))?;
    if raw.iter().flatten().any(|c| !c.is_finite()) {
        bail!("point list {} contains non-finite coordinates", input.display());
    }
    let pts: Vec<Vec2> = raw.into_iter().map(vec2).collect();
    let hull = convex_hull(&pts, tol);
    tracing::info!(input = pts.len(), count = hull.verts.len(), first = hull.first, "hull");
    Ok(json!({
        "verts": hull.verts.iter().copied().map(pair).collect::<Vec<_>>(),
        "first": hull.first,
    }))
}

fn point_json(scene: &Scene, hit: &PointQueryHit) -> Value {
    json!({
        "shape": scene.name(hit.shape),
        "distance": hit.info.distance,
        "point": pair(hit.info.point),
        "gradient": pair(hit.info.gradient),
    })
}

fn segment_json(scene: &Scene, hit: &SegmentQueryHit) -> Value {
    json!({
        "shape": scene.name(hit.shape),
        "alpha": hit.info.alpha,
        "point": pair(hit.info.point),
        "normal": pair(hit.info.normal),
    })
}

fn point(
    scene: &mut Scene,
    at: Vec2,
    max_distance: f64,
    nearest: bool,
    filter: QueryFilter,
) -> Value {
    if nearest {
        let hit = scene.space.point_query_nearest(at, max_distance, filter);
        tracing::info!(found = hit.is_some(), "point nearest");
        return hit.map_or(Value::Null, |h| point_json(scene, &h));
    }

    let mut hits = Vec::new();
    scene
        .space
        .point_query(at, max_distance, filter, |_, hit| hits.push(*hit));
    hits.sort_by(|a, b| a.info.distance.total_cmp(&b.info.distance));
    tracing::info!(hits = hits.len(), "point");
    Value::Array(hits.iter().map(|h| point_json(scene, h)).collect())
}

fn segment(
    scene: &mut Scene,
    from: Vec2,
    to: Vec2,
    radius: f64,
    first: bool,
    filter: QueryFilter,
) -> Value {
    if first {
        let hit = scene.space.segment_query_first(from, to, radius, filter);
        tracing::info!(found = hit.is_some(), alpha = hit.map(|h| h.info.alpha), "segment first");
        return hit.map_or(Value::Null, |h| segment_json(scene, &h));
    }

    let mut hits = Vec::new();
    scene
        .space
        .segment_query(from, to, radius, filter, |_, hit| hits.push(*hit));
    hits.sort_by(|a, b| a.info.alpha.total_cmp(&b.info.alpha));
    tracing::info!(hits = hits.len(), "segment");
    Value::Array(hits.iter().map(|h| segment_json(scene, h)).collect())
}

fn bb_query(scene: &mut Scene, bb: Aabb, filter: QueryFilter) -> Value {
    let mut ids = Vec::new();
    scene.space.bb_query(bb, filter, |_, id| ids.push(id));
    let mut names: Vec<String> = ids.into_iter().map(|id| scene.name(id)).collect();
    names.sort();
    tracing::info!(hits = names.len(), "bb");
    json!(names)
}

fn sample(seed: u64, index: u64, count: usize, extent: f64, dist: Dist, inner: f64, hull: bool) -> Value {
    let cfg = CloudCfg {
        count: PointCount::Fixed(count),
        extent,
        dist: match dist {
            Dist::Square => CloudDist::Square,
            Dist::Disc => CloudDist::Disc,
            Dist::Ring => CloudDist::Ring { inner },
        },
    };
    let pts = draw_cloud(cfg, ReplayToken::new(seed, index));
    tracing::info!(seed, index, count = pts.len(), "sample");
    let mut doc = json!({ "points": pts.iter().copied().map(pair).collect::<Vec<_>>() });
    if hull && !pts.is_empty() {
        let h = convex_hull(&pts, 0.0);
        doc["hull"] = json!({
            "verts": h.verts.iter().copied().map(pair).collect::<Vec<_>>(),
            "first": h.first,
        });
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_vectors_and_boxes() {
        assert_eq!(parse_vec2("-3, 4.5"), Ok(Vec2::new(-3.0, 4.5)));
        assert!(parse_vec2("1,2,3").is_err());
        assert!(parse_vec2("a,b").is_err());
        let bb = parse_bb("-1,-2,3,4").unwrap();
        assert_eq!(bb, Aabb::from_extents(-1.0, -2.0, 3.0, 4.0));
        assert!(parse_bb("3,0,1,1").is_err());
    }

    #[test]
    fn hull_command_reads_points() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pts.json");
        fs::write(&input, "[[-1,-1],[-1,1],[1,1],[1,-1],[0.2,0.1]]").unwrap();
        let out = hull(&input, 0.0).unwrap();
        assert_eq!(out["verts"].as_array().unwrap().len(), 4);

        fs::write(&input, "[[0,0],[1]]").unwrap();
        assert!(hull(&input, 0.0).is_err());
    }

    #[test]
    fn queries_report_named_shapes() {
        let file: SceneFile = serde_json::from_str(
            r#"{
                "statics": [{ "kind": "box", "width": 20, "height": 20, "name": "ground" }],
                "bodies": [{ "position": [30, 0], "shapes": [{ "kind": "box", "width": 2, "height": 2, "name": "crate" }] }]
            }"#,
        )
        .unwrap();
        let mut scene = file.build().unwrap();

        let all = point(&mut scene, Vec2::new(20.0, 0.0), 10.5, false, QueryFilter::ALL);
        let names: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["shape"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["crate", "ground"]);

        let first = segment(
            &mut scene,
            Vec2::new(-100.0, 0.0),
            Vec2::new(100.0, 0.0),
            0.0,
            true,
            QueryFilter::ALL,
        );
        assert_eq!(first["shape"], "ground");
        assert!((first["alpha"].as_f64().unwrap() - 0.45).abs() < 1e-9);

        let boxes = bb_query(&mut scene, Aabb::from_extents(25.0, -5.0, 35.0, 5.0), QueryFilter::ALL);
        assert_eq!(boxes, json!(["crate"]));
    }

    #[test]
    fn emit_writes_result_and_sidecar() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("cloud.json");
        let result = sample(3, 0, 16, 2.0, Dist::Ring, 0.5, true);
        assert_eq!(result["points"].as_array().unwrap().len(), 16);
        emit(Some(out.as_path()), "sample", json!({ "seed": 3 }), &result).unwrap();
        let written: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(written["points"].as_array().unwrap().len(), 16);
        assert!(written["hull"]["verts"].as_array().unwrap().len() >= 3);
        assert!(dir.path().join("nested").join("cloud.provenance.json").exists());
    }
}
