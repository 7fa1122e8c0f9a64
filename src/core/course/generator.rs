//! Procedural course generation. Runs once per race; produces a fixed
//! [`CourseSpec`] that is never mutated afterwards. Determinism is not a goal —
//! every run lays out a different course — so tests assert structural
//! invariants (no footprint overlap, band progression, finish shape) rather
//! than exact geometry.

use bevy::prelude::*;
use rand::Rng;

use super::layout::{
    Aabb2, CourseSpec, FinishInfo, LayerInfo, ObstacleArchetype, PartKind, PartShape,
    SeparatorSpec, StaticPart, WindMotion, WindZoneSpec,
};
use super::obstacles::{self, ObstacleBuild, WallSide};
use crate::core::config::config::{CourseConfig, WindConfig};

/// Vertical clearance kept free beneath the spawn line before the corridor.
const SPAWN_CLEARANCE: f32 = 150.0;
/// Gap between the layered region and the finish chute.
const FINISH_CLEARANCE: f32 = 80.0;
/// Slope of the finish chute platforms (radians).
const FINISH_SLOPE: f32 = 0.20;

pub fn generate_course(
    width: f32,
    cfg: &CourseConfig,
    wind: &WindConfig,
    rng: &mut impl Rng,
) -> CourseSpec {
    let half_track = width * 0.5;
    let mut spec = CourseSpec::default();
    spec.bounds.half_width = half_track;
    spec.bounds.top = 0.0;

    let corridor_end = corridor_phase(&mut spec, half_track, cfg, rng);
    let layers_end = layer_phase(&mut spec, corridor_end, half_track, cfg, rng);
    finish_phase(&mut spec, layers_end, half_track, cfg.finish_platforms, rng);
    wind_phase(&mut spec, half_track, wind, rng);
    wall_phase(&mut spec, half_track);

    spec
}

/// Footprint fully inside `region`, overlapping no committed obstacle.
fn placeable(spec: &CourseSpec, bb: &Aabb2, region: &Aabb2) -> bool {
    if bb.min.x < region.min.x
        || bb.max.x > region.max.x
        || bb.min.y < region.min.y
        || bb.max.y > region.max.y
    {
        return false;
    }
    !spec.obstacle_footprints.iter().any(|placed| placed.intersects(bb))
}

/// Bounded rejection sampling: try up to `attempts` candidate builds, commit
/// the first acceptable one. Exhaustion skips the instance silently; a
/// slightly sparser course is never fatal.
fn try_place<R: Rng>(
    spec: &mut CourseSpec,
    sample: &Aabb2,
    contain: &Aabb2,
    attempts: u32,
    rng: &mut R,
    mut build_at: impl FnMut(Vec2, &mut R) -> ObstacleBuild,
) -> bool {
    if sample.max.x <= sample.min.x || sample.max.y <= sample.min.y {
        return false;
    }
    for _ in 0..attempts {
        let pos = Vec2::new(
            rng.gen_range(sample.min.x..sample.max.x),
            rng.gen_range(sample.min.y..sample.max.y),
        );
        let build = build_at(pos, rng);
        let Some(bb) = build.footprint else { continue };
        if placeable(spec, &bb, contain) {
            build.commit(spec);
            return true;
        }
    }
    false
}

// =====================================================================================
// Phase 1: ramp/spike corridor
// =====================================================================================

fn corridor_phase(
    spec: &mut CourseSpec,
    half_track: f32,
    cfg: &CourseConfig,
    rng: &mut impl Rng,
) -> f32 {
    let mut cursor = -SPAWN_CLEARANCE;
    let iterations = cfg.corridor_multiplier * 10;
    for _ in 0..iterations {
        let side = if rng.gen_bool(0.5) { WallSide::Left } else { WallSide::Right };
        let height = rng.gen_range(cfg.ramp_height_range.min..cfg.ramp_height_range.max);
        let ramp = obstacles::build_ramp(side, cursor, height, half_track, rng);
        if let Some(bb) = ramp.footprint {
            if !spec.obstacle_footprints.iter().any(|p| p.intersects(&bb)) {
                ramp.commit(spec);
            }
        }
        cursor -= height;

        // spike cluster filling a random-height gap beneath the ramp
        let gap = rng.gen_range(cfg.spike_gap_range.min..cfg.spike_gap_range.max);
        let spacing = rng.gen_range(60.0..140.0);
        let count = ((half_track * 2.0) / spacing) as u32;
        // spikes point upward: sample bases low enough that tips stay in the
        // gap, with a sliver kept clear at the bottom for the next ramp mount
        let sample = Aabb2::new(
            Vec2::new(-half_track + cfg.track_margin, cursor - gap + 20.0),
            Vec2::new(half_track - cfg.track_margin, cursor - 60.0),
        );
        let contain = Aabb2::new(
            Vec2::new(-half_track + cfg.track_margin, cursor - gap),
            Vec2::new(half_track - cfg.track_margin, cursor),
        );
        if sample.max.y > sample.min.y {
            for _ in 0..count {
                try_place(spec, &sample, &contain, 10, rng, |pos, rng| {
                    obstacles::build_spike(pos, rng)
                });
            }
        }
        cursor -= gap;
    }
    cursor
}

// =====================================================================================
// Phase 3 (ordered second spatially): layered obstacle bands
// =====================================================================================

fn layer_phase(
    spec: &mut CourseSpec,
    corridor_end: f32,
    half_track: f32,
    cfg: &CourseConfig,
    rng: &mut impl Rng,
) -> f32 {
    // one archetype per band; a shuffled deck keeps every course's order fresh
    let mut deck: Vec<ObstacleArchetype> = ObstacleArchetype::ALL.to_vec();
    for i in (1..deck.len()).rev() {
        deck.swap(i, rng.gen_range(0..=i));
    }

    for i in 0..cfg.layer_count {
        let archetype = deck[i as usize % deck.len()];
        let y_top = corridor_end - i as f32 * cfg.layer_height;
        let y_bottom = y_top - cfg.layer_height;
        let region = Aabb2::new(
            Vec2::new(-half_track + cfg.track_margin, y_bottom + 20.0),
            Vec2::new(half_track - cfg.track_margin, y_top - 20.0),
        );
        let target = archetype.target_count();
        let mut placed = 0;
        for _ in 0..target {
            if try_place(spec, &region, &region, cfg.placement_attempts, rng, |pos, rng| {
                obstacles::build_for_archetype(archetype, pos, half_track, rng)
            }) {
                placed += 1;
            } else {
                debug!(target: "course", "placement budget exhausted for {:?}; skipping instance", archetype);
            }
        }
        spec.layers.push(LayerInfo {
            y_top,
            y_bottom,
            archetype,
            target,
            placed,
        });
        // non-colliding separator strip, purely for operator calibration
        spec.separators.push(SeparatorSpec {
            y: y_bottom,
            half_width: half_track,
        });
    }
    corridor_end - cfg.layer_count as f32 * cfg.layer_height
}

// =====================================================================================
// Phase 2 (spatially last): finish chute
// =====================================================================================

fn finish_phase(
    spec: &mut CourseSpec,
    layers_end: f32,
    half_track: f32,
    platforms: u32,
    rng: &mut impl Rng,
) {
    let start_y = layers_end - FINISH_CLEARANCE;
    let mut cursor = start_y;
    let len = half_track * 2.0 * 0.62;
    let mut last_end = Vec2::new(0.0, cursor);

    for k in 0..platforms {
        let from_left = k % 2 == 0;
        let sign = if from_left { 1.0 } else { -1.0 };
        let start = Vec2::new(-sign * half_track, cursor);
        let dir = Vec2::new(sign * FINISH_SLOPE.cos(), -FINISH_SLOPE.sin());
        let end = start + dir * len;
        let part = StaticPart {
            kind: PartKind::FinishSlope,
            pos: (start + end) * 0.5,
            rot: if from_left { -FINISH_SLOPE } else { FINISH_SLOPE },
            shape: PartShape::Cuboid { hx: len * 0.5, hy: 8.0 },
        };
        let bb = part.aabb();
        let mut build = ObstacleBuild::default();
        build.statics.push(part);
        build.footprint = Some(bb);
        build.commit(spec);
        last_end = end;
        // stack strictly below the previous slope's box so footprints stay disjoint
        cursor = bb.min.y - 30.0;
    }

    // short wall at the end of the last slope to stop overshoot
    let wall = StaticPart {
        kind: PartKind::Wall,
        pos: Vec2::new(last_end.x, last_end.y + 40.0),
        rot: 0.0,
        shape: PartShape::Cuboid { hx: 8.0, hy: 40.0 },
    };
    spec.statics.push(wall);

    // one flat catch platform spanning close to the full track width
    let catch_y = cursor - rng.gen_range(60.0..120.0);
    let catch_half = half_track - 20.0;
    let mut build = ObstacleBuild::default();
    let catch = StaticPart {
        kind: PartKind::CatchPlatform,
        pos: Vec2::new(0.0, catch_y),
        rot: 0.0,
        shape: PartShape::Cuboid { hx: catch_half, hy: 12.0 },
    };
    build.footprint = Some(catch.aabb());
    build.statics.push(catch);
    build.commit(spec);

    spec.finish = FinishInfo {
        start_y,
        final_platform_y: catch_y,
        final_platform_half_width: catch_half,
    };
    spec.bounds.bottom = catch_y - 60.0;
}

// =====================================================================================
// Phase 4: wind zones
// =====================================================================================

fn wind_phase(spec: &mut CourseSpec, half_track: f32, wind: &WindConfig, rng: &mut impl Rng) {
    // main zone near the top, oscillating horizontally forever, pushing up-course
    let amplitude = wind
        .main_amplitude
        .min(half_track - wind.main_half_width - 20.0)
        .max(0.0);
    spec.wind_zones.push(WindZoneSpec {
        pos: Vec2::new(0.0, -SPAWN_CLEARANCE - 150.0),
        half: Vec2::new(wind.main_half_width, wind.main_half_height),
        force: Vec2::new(0.0, wind.main_force),
        motion: WindMotion::Oscillate {
            amplitude,
            frequency: wind.main_frequency,
        },
    });

    // roaming zones drifting through the layered region
    let region_top = spec.layers.first().map_or(spec.finish.start_y, |l| l.y_top);
    let region_bottom = spec.layers.last().map_or(spec.finish.start_y, |l| l.y_bottom);
    if region_top - region_bottom < 200.0 {
        return; // no layered region to roam
    }
    for _ in 0..wind.roaming_count {
        let dir = rand_unit(rng);
        let lateral = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        spec.wind_zones.push(WindZoneSpec {
            pos: Vec2::new(
                rng.gen_range(-half_track * 0.6..half_track * 0.6),
                rng.gen_range(region_bottom..region_top),
            ),
            half: Vec2::new(90.0, 70.0),
            force: Vec2::new(lateral * wind.roaming_force, wind.roaming_force * 0.3),
            motion: WindMotion::Roam {
                velocity: dir * wind.roaming_speed,
            },
        });
    }
}

fn rand_unit(rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec2::from_angle(angle)
}

// =====================================================================================
// Side walls (excluded from the obstacle footprint list: wall-mounted ramps
// deliberately touch them)
// =====================================================================================

fn wall_phase(spec: &mut CourseSpec, half_track: f32) {
    let top = spec.bounds.top + 400.0;
    let bottom = spec.bounds.bottom - 100.0;
    let mid_y = (top + bottom) * 0.5;
    let half_height = (top - bottom) * 0.5;
    for sign in [-1.0f32, 1.0] {
        spec.statics.push(StaticPart {
            kind: PartKind::Wall,
            pos: Vec2::new(sign * (half_track + 20.0), mid_y),
            rot: 0.0,
            shape: PartShape::Cuboid { hx: 20.0, hy: half_height },
        });
    }
}
