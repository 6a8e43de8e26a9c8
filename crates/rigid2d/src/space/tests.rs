use super::*;
use crate::geom::Aabb;
use crate::shape::{QueryFilter, ALL_LAYERS, NO_GROUP};
use nalgebra::vector;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeSet;

const EPS: f64 = 1e-9;

/// Static 20×20 square at the origin plus one dynamic 2×2 box at `(30, 0)`.
fn two_box_scene() -> (Space, ShapeId, ShapeId) {
    let mut space = Space::new();
    let ground = space.add_shape(Shape::new_box(space.static_body(), 20.0, 20.0, 0.0));
    let body = space.add_body(Body::new_dynamic().with_position(vector![30.0, 0.0]));
    let crate_box = space.add_shape(Shape::new_box(body, 2.0, 2.0, 0.0));
    (space, ground, crate_box)
}

fn collect_points(space: &mut Space, p: Vec2, max: f64, filter: QueryFilter) -> BTreeSet<ShapeId> {
    let mut seen = BTreeSet::new();
    space.point_query(p, max, filter, |_, hit| {
        seen.insert(hit.shape);
    });
    seen
}

#[test]
fn point_query_all_respects_max_distance() {
    let (mut space, ground, crate_box) = two_box_scene();

    let near_ground = collect_points(&mut space, vector![0.0, 0.0], 1.0, QueryFilter::ALL);
    assert_eq!(near_ground, BTreeSet::from([ground]));

    // Ground surface at x = 10 is 10 away, the crate at x = 29 is 9 away.
    let between = collect_points(&mut space, vector![20.0, 0.0], 10.5, QueryFilter::ALL);
    assert_eq!(between, BTreeSet::from([ground, crate_box]));
    let strict = collect_points(&mut space, vector![20.0, 0.0], 10.0, QueryFilter::ALL);
    assert_eq!(strict, BTreeSet::from([crate_box]));
}

#[test]
fn point_query_reports_signed_distance() {
    let (mut space, ground, _) = two_box_scene();
    let mut hits = Vec::new();
    space.point_query(vector![0.0, 0.0], 0.0, QueryFilter::ALL, |_, hit| hits.push(*hit));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].shape, ground);
    assert!((hits[0].info.distance + 10.0).abs() < EPS);
}

#[test]
fn nearest_picks_closest_and_skips_sensors() {
    let (mut space, ground, crate_box) = two_box_scene();
    let hit = space
        .point_query_nearest(vector![21.0, 0.0], 100.0, QueryFilter::ALL)
        .expect("two shapes in range");
    assert_eq!(hit.shape, crate_box);
    assert!((hit.info.distance - 8.0).abs() < EPS);

    assert!(space.set_sensor(crate_box, true));
    let hit = space
        .point_query_nearest(vector![21.0, 0.0], 100.0, QueryFilter::ALL)
        .expect("ground still in range");
    assert_eq!(hit.shape, ground);

    assert!(space
        .point_query_nearest(vector![21.0, 0.0], 5.0, QueryFilter::ALL)
        .is_none());
}

#[test]
fn segment_first_hits_square_face() {
    let (space, ground, _) = two_box_scene();
    let hit = space
        .segment_query_first(vector![-100.0, 0.0], vector![100.0, 0.0], 0.0, QueryFilter::ALL)
        .expect("ray crosses the ground");
    assert_eq!(hit.shape, ground);
    assert!((hit.info.alpha - 0.45).abs() < EPS);
    assert!((hit.info.point - vector![-10.0, 0.0]).norm() < EPS);
    assert!((hit.info.normal - vector![-1.0, 0.0]).norm() < EPS);
}

#[test]
fn segment_first_prefers_earlier_active_hit() {
    let (space, _, crate_box) = two_box_scene();
    // From the right the dynamic crate is crossed before the static ground.
    let hit = space
        .segment_query_first(vector![100.0, 0.0], vector![-100.0, 0.0], 0.0, QueryFilter::ALL)
        .expect("ray crosses both");
    assert_eq!(hit.shape, crate_box);
    assert!((hit.info.alpha - 69.0 / 200.0).abs() < EPS);
}

#[test]
fn segment_all_reports_every_crossed_shape() {
    let (mut space, ground, crate_box) = two_box_scene();
    let mut seen = BTreeSet::new();
    space.segment_query(vector![100.0, 0.0], vector![-100.0, 0.0], 0.0, QueryFilter::ALL, |_, hit| {
        seen.insert(hit.shape);
    });
    assert_eq!(seen, BTreeSet::from([ground, crate_box]));

    let mut none = 0;
    space.segment_query(vector![100.0, 50.0], vector![-100.0, 50.0], 0.0, QueryFilter::ALL, |_, _| {
        none += 1;
    });
    assert_eq!(none, 0);
}

#[test]
fn bb_query_tests_boxes_only() {
    let (mut space, ground, crate_box) = two_box_scene();
    let mut seen = BTreeSet::new();
    space.bb_query(Aabb::from_extents(9.0, -1.0, 29.5, 1.0), QueryFilter::ALL, |_, id| {
        seen.insert(id);
    });
    assert_eq!(seen, BTreeSet::from([ground, crate_box]));

    let mut seen = BTreeSet::new();
    space.bb_query(Aabb::from_extents(12.0, -1.0, 20.0, 1.0), QueryFilter::ALL, |_, id| {
        seen.insert(id);
    });
    assert!(seen.is_empty());
}

#[test]
fn filters_apply_to_every_query() {
    let (mut space, ground, crate_box) = two_box_scene();
    space.set_shape_filter(ground, 0b01, 3);
    space.set_shape_filter(crate_box, 0b10, NO_GROUP);

    let layer_one = QueryFilter::new(0b01, NO_GROUP);
    let all = collect_points(&mut space, vector![20.0, 0.0], 50.0, layer_one);
    assert_eq!(all, BTreeSet::from([ground]));

    let same_group = QueryFilter::new(ALL_LAYERS, 3);
    let all = collect_points(&mut space, vector![20.0, 0.0], 50.0, same_group);
    assert_eq!(all, BTreeSet::from([crate_box]));

    let first = space
        .segment_query_first(vector![-100.0, 0.0], vector![100.0, 0.0], 0.0, same_group)
        .expect("crate still visible");
    assert_eq!(first.shape, crate_box);

    let nearest = space.point_query_nearest(vector![0.0, 0.0], 50.0, QueryFilter::new(0b100, NO_GROUP));
    assert!(nearest.is_none());
}

fn rect(l: f64, b: f64, r: f64, t: f64) -> Vec<Vec2> {
    vec![vector![l, b], vector![l, t], vector![r, t], vector![r, b]]
}

/// Two overlapping squares on one dynamic body, both in group 7.
fn grouped_pair() -> (Space, ShapeId, ShapeId) {
    let mut space = Space::new();
    let body = space.add_body(Body::new_dynamic());
    let left = space.add_shape(
        Shape::new_poly(body, &rect(-1.0, -1.0, 1.0, 1.0), Vec2::zeros(), 0.0).with_filter(ALL_LAYERS, 7),
    );
    let right = space.add_shape(
        Shape::new_poly(body, &rect(0.0, -1.0, 2.0, 1.0), Vec2::zeros(), 0.0).with_filter(ALL_LAYERS, 7),
    );
    (space, left, right)
}

#[test]
fn same_group_point_query_reports_nothing() {
    let (mut space, left, right) = grouped_pair();
    let mut callbacks = 0;
    space.point_query(vector![0.5, 0.0], 0.0, QueryFilter::new(ALL_LAYERS, 7), |_, _| {
        callbacks += 1;
    });
    assert_eq!(callbacks, 0);

    let other_group = collect_points(&mut space, vector![0.5, 0.0], 0.0, QueryFilter::new(ALL_LAYERS, 8));
    assert_eq!(other_group, BTreeSet::from([left, right]));
    let ungrouped = collect_points(&mut space, vector![0.5, 0.0], 0.0, QueryFilter::ALL);
    assert_eq!(ungrouped, BTreeSet::from([left, right]));
}

#[test]
fn segment_query_all_honors_filters() {
    let (mut space, ground, crate_box) = two_box_scene();
    space.set_shape_filter(ground, 0b01, 3);
    space.set_shape_filter(crate_box, 0b10, NO_GROUP);
    let (a, b) = (vector![100.0, 0.0], vector![-100.0, 0.0]);

    let run = |space: &mut Space, filter: QueryFilter| {
        let mut seen = BTreeSet::new();
        space.segment_query(a, b, 0.0, filter, |space, hit| {
            let shape = space.shape(hit.shape).expect("live shape");
            assert!(filter.admits(shape));
            seen.insert(hit.shape);
        });
        seen
    };
    assert_eq!(run(&mut space, QueryFilter::new(0b01, NO_GROUP)), BTreeSet::from([ground]));
    assert_eq!(run(&mut space, QueryFilter::new(0b10, NO_GROUP)), BTreeSet::from([crate_box]));
    assert_eq!(run(&mut space, QueryFilter::new(ALL_LAYERS, 3)), BTreeSet::from([crate_box]));
    assert!(run(&mut space, QueryFilter::new(0b100, NO_GROUP)).is_empty());
    assert!(run(&mut space, QueryFilter::new(0b01, 3)).is_empty());
    assert_eq!(run(&mut space, QueryFilter::ALL), BTreeSet::from([ground, crate_box]));
}

#[test]
fn bb_query_honors_filters() {
    let (mut space, ground, crate_box) = two_box_scene();
    space.set_shape_filter(ground, 0b01, 3);
    space.set_shape_filter(crate_box, 0b10, 4);
    let bb = Aabb::from_extents(-50.0, -50.0, 50.0, 50.0);

    let run = |space: &mut Space, filter: QueryFilter| {
        let mut seen = BTreeSet::new();
        space.bb_query(bb, filter, |space, id| {
            let shape = space.shape(id).expect("live shape");
            assert!(filter.admits(shape));
            seen.insert(id);
        });
        seen
    };
    assert_eq!(run(&mut space, QueryFilter::ALL), BTreeSet::from([ground, crate_box]));
    assert_eq!(run(&mut space, QueryFilter::new(ALL_LAYERS, 3)), BTreeSet::from([crate_box]));
    assert_eq!(run(&mut space, QueryFilter::new(ALL_LAYERS, 4)), BTreeSet::from([ground]));
    assert_eq!(run(&mut space, QueryFilter::new(0b10, NO_GROUP)), BTreeSet::from([crate_box]));
    assert!(run(&mut space, QueryFilter::new(0b01, 3)).is_empty());
    assert!(run(&mut space, QueryFilter::new(0b1100, NO_GROUP)).is_empty());
}

#[test]
fn body_frame_round_trip() {
    let body = Body::new_dynamic()
        .with_position(vector![3.0, -1.0])
        .with_angle(std::f64::consts::FRAC_PI_2);
    let world = body.local_to_world(vector![1.0, 0.0]);
    assert!((world - vector![3.0, 0.0]).norm() < EPS);
    assert!((body.world_to_local(world) - vector![1.0, 0.0]).norm() < EPS);
    let origin = body.world_to_local(Vec2::zeros());
    assert!((body.local_to_world(origin)).norm() < EPS);
}

#[test]
fn callback_sees_locked_space_and_removal_is_deferred() {
    let (mut space, ground, crate_box) = two_box_scene();
    let mut visits = 0;
    space.point_query(vector![20.0, 0.0], 50.0, QueryFilter::ALL, |space, hit| {
        assert!(space.is_locked());
        // Still present while the query runs.
        assert!(space.shape(hit.shape).is_some());
        assert!(space.shape(ground).is_some());
        if hit.shape == ground {
            space.defer(Mutation::RemoveShape(ground));
        }
        visits += 1;
    });
    assert_eq!(visits, 2);
    assert!(!space.is_locked());
    assert!(space.shape(ground).is_none());
    assert!(space.shape(crate_box).is_some());
    assert_eq!(space.shape_count(), 1);

    let rest = collect_points(&mut space, vector![0.0, 0.0], 100.0, QueryFilter::ALL);
    assert_eq!(rest, BTreeSet::from([crate_box]));
}

#[test]
fn deferred_mutations_commit_in_request_order() {
    let (mut space, _, crate_box) = two_box_scene();
    let body = space.shape(crate_box).map(|s| s.body()).expect("crate exists");
    space.bb_query(Aabb::from_extents(-100.0, -100.0, 100.0, 100.0), QueryFilter::ALL, |space, _| {
        if space.pending.borrow().is_empty() {
            space.defer(Mutation::AddShape(Shape::new_circle(body, 1.0, vector![0.0, 5.0])));
            space.defer(Mutation::RemoveBody(body));
        }
    });
    // The added circle was attached to the body, so removing the body took it too.
    assert_eq!(space.shape_count(), 1);
    assert!(space.body(body).is_none());

    let (mut space, _, crate_box) = two_box_scene();
    let body = space.shape(crate_box).map(|s| s.body()).expect("crate exists");
    space.bb_query(Aabb::from_extents(-100.0, -100.0, 100.0, 100.0), QueryFilter::ALL, |space, _| {
        if space.pending.borrow().is_empty() {
            space.defer(Mutation::RemoveBody(body));
            space.defer(Mutation::AddShape(Shape::new_circle(body, 1.0, vector![0.0, 5.0])));
        }
    });
    // Add after removal targets a dead body and is dropped.
    assert_eq!(space.shape_count(), 1);
}

#[test]
fn failing_callback_releases_lock_and_commits() {
    let (mut space, _, _) = two_box_scene();
    let mut calls = 0;
    let res: Result<(), &str> =
        space.try_point_query(vector![20.0, 0.0], 50.0, QueryFilter::ALL, |space, hit| {
            calls += 1;
            space.defer(Mutation::RemoveShape(hit.shape));
            Err("stop")
        });
    assert_eq!(res, Err("stop"));
    assert_eq!(calls, 1);
    assert!(!space.is_locked());
    assert_eq!(space.shape_count(), 1);

    let res: Result<(), ()> = space.try_segment_query(
        vector![-100.0, 0.0],
        vector![100.0, 0.0],
        0.0,
        QueryFilter::ALL,
        |_, _| Err(()),
    );
    assert!(res.is_err());
    let everything = Aabb::from_extents(-1e3, -1e3, 1e3, 1e3);
    let res: Result<(), ()> = space.try_bb_query(everything, QueryFilter::ALL, |_, _| Err(()));
    assert!(res.is_err());
    assert!(!space.is_locked());
}

#[test]
fn panicking_callback_releases_lock() {
    let (mut space, ground, _) = two_box_scene();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        space.point_query(vector![0.0, 0.0], 1.0, QueryFilter::ALL, |space, hit| {
            space.defer(Mutation::RemoveShape(hit.shape));
            panic!("callback failure");
        });
    }));
    assert!(outcome.is_err());
    assert!(!space.is_locked());
    assert!(space.shape(ground).is_none());
}

#[test]
#[should_panic(expected = "space lock")]
fn defer_outside_query_panics() {
    let (space, ground, _) = two_box_scene();
    space.defer(Mutation::RemoveShape(ground));
}

#[test]
#[should_panic(expected = "static body")]
fn static_body_cannot_be_removed() {
    let mut space = Space::new();
    let id = space.static_body();
    space.remove_body(id);
}

#[test]
fn refresh_moves_active_shapes_only() {
    let (mut space, ground, crate_box) = two_box_scene();
    let body = space.shape(crate_box).map(|s| s.body()).expect("crate exists");
    assert!(space.set_body_transform(body, vector![0.0, 40.0], 0.0));

    // World cache is stale until refreshed.
    let stale = collect_points(&mut space, vector![0.0, 40.0], 0.5, QueryFilter::ALL);
    assert!(stale.is_empty());

    space.refresh_world_caches();
    let moved = collect_points(&mut space, vector![0.0, 40.0], 0.5, QueryFilter::ALL);
    assert_eq!(moved, BTreeSet::from([crate_box]));

    // Static shapes follow their body only on reindex.
    let static_body = space.static_body();
    assert!(space.set_body_transform(static_body, vector![-50.0, 0.0], 0.0));
    space.refresh_world_caches();
    assert!(collect_points(&mut space, vector![-50.0, 0.0], 0.5, QueryFilter::ALL).is_empty());
    space.reindex_static();
    assert_eq!(
        collect_points(&mut space, vector![-50.0, 0.0], 0.5, QueryFilter::ALL),
        BTreeSet::from([ground])
    );
}

#[test]
fn rotated_body_rotates_shape() {
    let mut space = Space::new();
    let body = space.add_body(
        Body::new_dynamic()
            .with_position(vector![5.0, 5.0])
            .with_angle(std::f64::consts::FRAC_PI_2),
    );
    let id = space.add_shape(Shape::new_box(body, 10.0, 2.0, 0.0));
    let bb = space.shape(id).map(|s| s.bb()).expect("shape exists");
    assert!((bb.min.x - 4.0).abs() < EPS && (bb.max.x - 6.0).abs() < EPS);
    assert!((bb.min.y - 0.0).abs() < EPS && (bb.max.y - 10.0).abs() < EPS);
}

#[test]
fn remove_body_takes_its_shapes() {
    let (mut space, ground, crate_box) = two_box_scene();
    let body = space.shape(crate_box).map(|s| s.body()).expect("crate exists");
    space.add_shape(Shape::new_circle(body, 1.0, vector![0.0, 3.0]));
    assert_eq!(space.shape_count(), 3);

    assert!(space.remove_body(body).is_some());
    assert_eq!(space.shape_count(), 1);
    assert!(space.shape(crate_box).is_none());
    assert!(space.shape(ground).is_some());
    assert!(space.remove_body(body).is_none());
    assert!(space.remove_shape(crate_box).is_none());
    assert!(!space.set_body_transform(body, Vec2::zeros(), 0.0));
}

#[test]
fn poly_edits_reindex() {
    let (mut space, _, crate_box) = two_box_scene();
    let verts = [
        vector![-5.0, -1.0],
        vector![-5.0, 1.0],
        vector![5.0, 1.0],
        vector![5.0, -1.0],
    ];
    assert!(space.set_poly_vertices(crate_box, &verts, Vec2::zeros()));
    let bb = space.shape(crate_box).map(|s| s.bb()).expect("crate exists");
    assert!((bb.min.x - 25.0).abs() < EPS);

    assert!(space.set_poly_radius(crate_box, 1.0));
    let hit = space
        .point_query_nearest(vector![20.0, 0.0], 10.0, QueryFilter::ALL)
        .expect("crate in range");
    assert_eq!(hit.shape, crate_box);
    assert!((hit.info.distance - 4.0).abs() < EPS);
    assert!((space.shape(crate_box).map(|s| s.poly_radius()).unwrap_or_default() - 1.0).abs() < EPS);
}

#[test]
fn first_hit_matches_manual_scan() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut space = Space::new();
    let static_body = space.static_body();
    for _ in 0..12 {
        let c = vector![rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0)];
        let pts: Vec<Vec2> = (0..6)
            .map(|_| c + vector![rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0)])
            .collect();
        space.add_shape(Shape::new_poly(static_body, &pts, Vec2::zeros(), rng.gen_range(0.0..0.5)));
    }
    for i in 0..12 {
        let body = space.add_body(
            Body::new_dynamic()
                .with_position(vector![rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0)])
                .with_angle(rng.gen_range(0.0..6.28)),
        );
        let shape = if i % 2 == 0 {
            Shape::new_box(body, rng.gen_range(1.0..6.0), rng.gen_range(1.0..6.0), 0.0)
        } else {
            Shape::new_circle(body, rng.gen_range(0.5..3.0), Vec2::zeros())
        };
        space.add_shape(shape.with_sensor(i % 5 == 0));
    }

    for _ in 0..200 {
        let a = vector![rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0)];
        let b = vector![rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0)];
        let radius = if rng.gen_bool(0.5) { 0.0 } else { rng.gen_range(0.0..1.0) };

        let manual = space
            .shapes()
            .filter(|(_, s)| !s.sensor)
            .filter_map(|(id, s)| s.segment_query(a, b, radius).map(|info| (id, info)))
            .min_by(|x, y| x.1.alpha.total_cmp(&y.1.alpha));
        let first = space.segment_query_first(a, b, radius, QueryFilter::ALL);
        match (manual, first) {
            (None, None) => {}
            (Some((id, info)), Some(hit)) => {
                assert_eq!(hit.info.alpha, info.alpha);
                assert_eq!(hit.shape, id);
            }
            other => panic!("manual scan and query disagree: {other:?}"),
        }

        let mut all = BTreeSet::new();
        space.segment_query(a, b, radius, QueryFilter::ALL, |_, hit| {
            all.insert(hit.shape);
        });
        let want: BTreeSet<ShapeId> = space
            .shapes()
            .filter(|(_, s)| s.segment_query(a, b, radius).is_some())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(all, want);
    }
}

#[test]
fn nearest_matches_manual_scan() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut space = Space::new();
    for _ in 0..20 {
        let body = space.add_body(
            Body::new_dynamic()
                .with_position(vector![rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0)]),
        );
        space.add_shape(Shape::new_box(body, rng.gen_range(1.0..4.0), rng.gen_range(1.0..4.0), 0.1));
    }
    for _ in 0..100 {
        let p = vector![rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0)];
        let max = rng.gen_range(0.0..20.0);
        let manual = space
            .shapes()
            .map(|(id, s)| (id, s.point_query(p)))
            .filter(|(_, info)| info.distance < max)
            .min_by(|x, y| x.1.distance.total_cmp(&y.1.distance));
        let nearest = space.point_query_nearest(p, max, QueryFilter::ALL);
        assert_eq!(nearest.map(|h| h.shape), manual.map(|(id, _)| id));
    }
}
