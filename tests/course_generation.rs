//! Structural property tests over randomly generated courses. Generation is
//! intentionally non-deterministic, so these assert invariants — footprint
//! disjointness, band progression, finish shape — across many fresh courses,
//! never exact geometry.

use marble_race::core::config::config::{CourseConfig, WindConfig};
use marble_race::core::course::generator::generate_course;
use marble_race::core::course::layout::{CourseSpec, PartKind, WindMotion};

fn generate(width: f32) -> CourseSpec {
    let mut rng = rand::thread_rng();
    generate_course(width, &CourseConfig::default(), &WindConfig::default(), &mut rng)
}

#[test]
fn no_two_obstacle_footprints_overlap() {
    for round in 0..20 {
        let width = 800.0 + (round % 5) as f32 * 200.0;
        let spec = generate(width);
        let fps = &spec.obstacle_footprints;
        assert!(!fps.is_empty());
        for i in 0..fps.len() {
            for j in (i + 1)..fps.len() {
                assert!(
                    !fps[i].intersects(&fps[j]),
                    "round {round}: footprints {i} and {j} overlap: {:?} vs {:?}",
                    fps[i],
                    fps[j]
                );
            }
        }
    }
}

#[test]
fn layers_progress_monotonically_down_course() {
    let spec = generate(1200.0);
    let cfg = CourseConfig::default();
    assert_eq!(spec.layers.len(), cfg.layer_count as usize);
    let mut previous_bottom: Option<f32> = None;
    for layer in &spec.layers {
        assert!(layer.y_top > layer.y_bottom, "layer band inverted: {layer:?}");
        if let Some(prev) = previous_bottom {
            assert!(
                (layer.y_top - prev).abs() < 1e-3,
                "layers must tile the span contiguously: {} vs {prev}",
                layer.y_top
            );
        }
        previous_bottom = Some(layer.y_bottom);
    }
    // layered region sits strictly between spawn line and finish
    assert!(spec.layers[0].y_top < spec.bounds.top);
    assert!(previous_bottom.unwrap() > spec.finish.start_y);
}

#[test]
fn placed_counts_never_exceed_targets() {
    for _ in 0..10 {
        let spec = generate(1000.0);
        for layer in &spec.layers {
            assert!(
                layer.placed <= layer.target,
                "layer {layer:?} overfilled"
            );
        }
        // placement failure is a silent skip, so most layers should still fill
        let total_placed: u32 = spec.layers.iter().map(|l| l.placed).sum();
        assert!(total_placed > 0, "no layered obstacle placed at all");
    }
}

#[test]
fn separators_sit_between_layers() {
    let spec = generate(1000.0);
    assert_eq!(spec.separators.len(), spec.layers.len());
    for (layer, sep) in spec.layers.iter().zip(&spec.separators) {
        assert_eq!(sep.y, layer.y_bottom);
    }
}

#[test]
fn finish_chute_shape_at_width_1000() {
    let spec = generate(1000.0);

    // the catch platform lies beyond the finish-zone start, further down-course
    assert!(
        spec.finish.final_platform_y < spec.finish.start_y,
        "catch platform {} must be below finish start {}",
        spec.finish.final_platform_y,
        spec.finish.start_y
    );

    // exactly one catch platform, spanning close to the full track width
    let catches: Vec<_> = spec
        .statics
        .iter()
        .filter(|p| p.kind == PartKind::CatchPlatform)
        .collect();
    assert_eq!(catches.len(), 1);
    let bb = catches[0].aabb();
    assert!(
        bb.max.x - bb.min.x >= 0.9 * 1000.0,
        "catch platform span {} too narrow",
        bb.max.x - bb.min.x
    );

    // six alternating slopes
    let slopes = spec
        .statics
        .iter()
        .filter(|p| p.kind == PartKind::FinishSlope)
        .count();
    assert_eq!(slopes, CourseConfig::default().finish_platforms as usize);
}

#[test]
fn corridor_emits_ramps_and_spikes() {
    let spec = generate(1000.0);
    let ramps = spec.statics.iter().filter(|p| p.kind == PartKind::Ramp).count();
    let spikes = spec.statics.iter().filter(|p| p.kind == PartKind::Spike).count();
    let iterations = CourseConfig::default().corridor_multiplier * 10;
    assert!(ramps > 0 && ramps <= iterations as usize);
    assert!(spikes > 0, "corridor should carry spike clusters");
}

#[test]
fn wind_phase_creates_main_and_roaming_zones() {
    let wind_cfg = WindConfig::default();
    let spec = generate(1000.0);
    assert_eq!(spec.wind_zones.len(), 1 + wind_cfg.roaming_count as usize);
    let main = &spec.wind_zones[0];
    assert!(matches!(main.motion, WindMotion::Oscillate { .. }));
    assert!(main.force.y > 0.0, "main zone pushes up-course");
    for zone in &spec.wind_zones[1..] {
        assert!(matches!(zone.motion, WindMotion::Roam { .. }));
    }
}

#[test]
fn world_bounds_bracket_everything() {
    for _ in 0..5 {
        let spec = generate(900.0);
        assert!(spec.bounds.bottom < spec.bounds.top);
        for part in &spec.statics {
            let bb = part.aabb();
            assert!(
                bb.max.y <= spec.bounds.top + 500.0,
                "part pokes far above the world: {part:?}"
            );
            assert!(
                bb.min.y >= spec.bounds.bottom - 200.0,
                "part pokes far below the world: {part:?}"
            );
        }
    }
}
