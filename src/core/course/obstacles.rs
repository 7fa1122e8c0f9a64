//! Per-archetype obstacle construction. Builders produce geometry centered on a
//! candidate position; the generator owns placement, overlap rejection and
//! committing into the [`CourseSpec`].

use bevy::prelude::*;
use rand::Rng;

use super::layout::{
    Aabb2, ConveyorSpec, CourseSpec, CradleSpec, FlipperSpec, ObstacleArchetype, OscillationSpec,
    PartKind, PartShape, PegSpec, SpinnerSpec, StaticPart,
};

/// Everything one obstacle instance contributes, plus its overall footprint.
#[derive(Debug, Clone, Default)]
pub struct ObstacleBuild {
    pub statics: Vec<StaticPart>,
    pub spinners: Vec<SpinnerSpec>,
    pub cradles: Vec<CradleSpec>,
    pub flippers: Vec<FlipperSpec>,
    pub conveyors: Vec<ConveyorSpec>,
    pub pegs: Vec<PegSpec>,
    pub footprint: Option<Aabb2>,
}

impl ObstacleBuild {
    fn push_static(&mut self, part: StaticPart) {
        self.grow(part.aabb());
        self.statics.push(part);
    }

    fn grow(&mut self, bb: Aabb2) {
        self.footprint = Some(match self.footprint {
            Some(cur) => cur.union(&bb),
            None => bb,
        });
    }

    /// Merge this instance into the course. The caller has already accepted the
    /// footprint against the committed list.
    pub fn commit(self, spec: &mut CourseSpec) {
        if let Some(bb) = self.footprint {
            spec.obstacle_footprints.push(bb);
        }
        spec.statics.extend(self.statics);
        spec.spinners.extend(self.spinners);
        spec.cradles.extend(self.cradles);
        spec.flippers.extend(self.flippers);
        spec.conveyors.extend(self.conveyors);
        spec.pegs.extend(self.pegs);
    }
}

/// Which wall a corridor ramp hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

/// Wall-mounted ramp descending toward the opposite side. `height` is the
/// vertical drop of the ramp, `y_top` the altitude of its wall mount.
pub fn build_ramp(
    side: WallSide,
    y_top: f32,
    height: f32,
    half_track: f32,
    rng: &mut impl Rng,
) -> ObstacleBuild {
    let span = half_track * 2.0 * rng.gen_range(0.55..0.75);
    let sign = match side {
        WallSide::Left => 1.0,
        WallSide::Right => -1.0,
    };
    let start = Vec2::new(-sign * half_track, y_top);
    let end = Vec2::new(start.x + sign * span, y_top - height);
    let mid = (start + end) * 0.5;
    let dir = end - start;

    let mut build = ObstacleBuild::default();
    build.push_static(StaticPart {
        kind: PartKind::Ramp,
        pos: mid,
        rot: dir.y.atan2(dir.x),
        shape: PartShape::Cuboid {
            hx: dir.length() * 0.5,
            hy: 10.0,
        },
    });
    build
}

/// One spike: an upward-pointing triangle sitting at `pos`.
pub fn build_spike(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let half_base = rng.gen_range(6.0..14.0);
    let len = rng.gen_range(20.0..60.0);
    let mut build = ObstacleBuild::default();
    build.push_static(StaticPart {
        kind: PartKind::Spike,
        pos,
        rot: 0.0,
        shape: PartShape::Triangle {
            a: Vec2::new(-half_base, 0.0),
            b: Vec2::new(half_base, 0.0),
            c: Vec2::new(0.0, len),
        },
    });
    build
}

/// Simple (possibly slightly tilted) platform.
pub fn build_platform(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let mut build = ObstacleBuild::default();
    build.push_static(StaticPart {
        kind: PartKind::Platform,
        pos,
        rot: rng.gen_range(-0.25..0.25),
        shape: PartShape::Cuboid {
            hx: rng.gen_range(60.0..140.0),
            hy: 8.0,
        },
    });
    build
}

/// Pinned spinner bar. The footprint is the swept disc so neighbors stay clear
/// of the whole rotation.
pub fn build_spinner(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let half_length = rng.gen_range(50.0..110.0);
    let spin = rng.gen_range(1.5..4.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let mut build = ObstacleBuild::default();
    build.spinners.push(SpinnerSpec {
        pos,
        half_length,
        half_thickness: 6.0,
        spin,
    });
    build.grow(Aabb2::from_center(pos, Vec2::splat(half_length + 6.0)));
    build
}

/// V-funnel: two angled walls with a drop gap between their lower tips.
pub fn build_funnel(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let half_len = rng.gen_range(70.0..120.0);
    let angle: f32 = rng.gen_range(0.55..0.85);
    let gap_half = rng.gen_range(25.0..40.0);
    let (s, c) = (angle.sin(), angle.cos());
    // wall centers sit so the inner lower tips frame the gap
    let dx = gap_half + half_len * c;
    let dy = half_len * s;
    let mut build = ObstacleBuild::default();
    build.push_static(StaticPart {
        kind: PartKind::FunnelWall,
        pos: Vec2::new(pos.x - dx, pos.y + dy),
        rot: -angle,
        shape: PartShape::Cuboid { hx: half_len, hy: 7.0 },
    });
    build.push_static(StaticPart {
        kind: PartKind::FunnelWall,
        pos: Vec2::new(pos.x + dx, pos.y + dy),
        rot: angle,
        shape: PartShape::Cuboid { hx: half_len, hy: 7.0 },
    });
    build
}

/// Staggered plinko peg grid; a fraction of pegs oscillate horizontally.
pub fn build_plinko(pos: Vec2, half_track: f32, rng: &mut impl Rng) -> ObstacleBuild {
    let rows = rng.gen_range(3..=5u32);
    let spacing = rng.gen_range(60.0..90.0);
    let grid_half_width = (half_track * 0.8).min(spacing * 4.0);
    let cols = ((grid_half_width * 2.0 / spacing).floor() as u32).max(2);
    let mut build = ObstacleBuild::default();
    for row in 0..rows {
        let y = pos.y - row as f32 * spacing;
        let stagger = if row % 2 == 1 { spacing * 0.5 } else { 0.0 };
        for col in 0..cols {
            let x = pos.x - grid_half_width + stagger + col as f32 * spacing;
            let radius = rng.gen_range(6.0..9.0);
            let oscillation = if rng.gen_bool(0.3) {
                Some(OscillationSpec {
                    amplitude: rng.gen_range(15.0..(spacing * 0.45)),
                    frequency: rng.gen_range(0.2..0.6),
                    phase: rng.gen_range(0.0..std::f32::consts::TAU),
                })
            } else {
                None
            };
            let swing = oscillation.map_or(0.0, |o| o.amplitude);
            build.pegs.push(PegSpec {
                pos: Vec2::new(x, y),
                radius,
                oscillation,
            });
            build.grow(Aabb2::from_center(
                Vec2::new(x, y),
                Vec2::new(radius + swing, radius),
            ));
        }
    }
    build
}

/// Newton's cradle: a row of bobs on ropes below an anchor rail, kicked on an
/// interval. The footprint covers the swing envelope.
pub fn build_cradle(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let bobs = rng.gen_range(4..=6u32);
    let bob_radius = rng.gen_range(10.0..13.0);
    let rope_length = rng.gen_range(80.0..140.0);
    let mut build = ObstacleBuild::default();
    build.cradles.push(CradleSpec {
        anchor: pos,
        bobs,
        rope_length,
        bob_radius,
        interval: rng.gen_range(2.0..4.0),
        impulse: rng.gen_range(60.0..120.0),
    });
    let row_half = bobs as f32 * bob_radius;
    build.grow(Aabb2::new(
        Vec2::new(pos.x - row_half - rope_length * 0.6, pos.y - rope_length - bob_radius * 2.0),
        Vec2::new(pos.x + row_half + rope_length * 0.6, pos.y),
    ));
    build
}

/// Double flipper: mirrored bars pivoting toward the center gap.
pub fn build_flipper(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let half_length = rng.gen_range(45.0..80.0);
    let gap_half = rng.gen_range(20.0..35.0);
    let period = rng.gen_range(1.2..2.5);
    let mut build = ObstacleBuild::default();
    for direction in [1.0f32, -1.0] {
        build.flippers.push(FlipperSpec {
            pivot: Vec2::new(pos.x - direction * (gap_half + half_length * 2.0), pos.y),
            half_length,
            half_thickness: 7.0,
            period,
            direction,
        });
    }
    let reach = gap_half + half_length * 3.0;
    build.grow(Aabb2::from_center(pos, Vec2::new(reach, half_length + 10.0)));
    build
}

/// Conveyor belt; signed speed picks the drive direction.
pub fn build_conveyor(pos: Vec2, rng: &mut impl Rng) -> ObstacleBuild {
    let half_length = rng.gen_range(80.0..160.0);
    let speed = rng.gen_range(80.0..200.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let mut build = ObstacleBuild::default();
    build.conveyors.push(ConveyorSpec {
        pos,
        half_length,
        half_thickness: 8.0,
        speed,
    });
    build.grow(Aabb2::from_center(pos, Vec2::new(half_length, 8.0)));
    build
}

pub fn build_for_archetype(
    archetype: ObstacleArchetype,
    pos: Vec2,
    half_track: f32,
    rng: &mut impl Rng,
) -> ObstacleBuild {
    match archetype {
        ObstacleArchetype::Platform => build_platform(pos, rng),
        ObstacleArchetype::Spinner => build_spinner(pos, rng),
        ObstacleArchetype::Funnel => build_funnel(pos, rng),
        ObstacleArchetype::Plinko => build_plinko(pos, half_track, rng),
        ObstacleArchetype::Cradle => build_cradle(pos, rng),
        ObstacleArchetype::Flipper => build_flipper(pos, rng),
        ObstacleArchetype::Conveyor => build_conveyor(pos, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn ramp_reaches_from_wall_toward_center() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let b = build_ramp(WallSide::Left, -100.0, 500.0, 500.0, &mut rng);
            let bb = b.footprint.unwrap();
            assert!(bb.min.x <= -499.0, "ramp must touch the left wall: {bb:?}");
            assert!(bb.max.x < 500.0, "ramp must not cross the right wall");
            assert!(bb.min.y < -100.0 && bb.max.y <= -80.0);
        }
    }

    #[test]
    fn funnel_walls_leave_a_gap() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let b = build_funnel(Vec2::ZERO, &mut rng);
            assert_eq!(b.statics.len(), 2);
            let left = b.statics[0].aabb();
            let right = b.statics[1].aabb();
            assert!(left.max.x < right.min.x, "funnel tips must not touch");
        }
    }

    #[test]
    fn plinko_footprint_covers_oscillation() {
        let mut rng = thread_rng();
        for _ in 0..20 {
            let b = build_plinko(Vec2::ZERO, 500.0, &mut rng);
            let bb = b.footprint.unwrap();
            for peg in &b.pegs {
                let swing = peg.oscillation.map_or(0.0, |o| o.amplitude);
                assert!(peg.pos.x - peg.radius - swing >= bb.min.x - 1e-3);
                assert!(peg.pos.x + peg.radius + swing <= bb.max.x + 1e-3);
            }
        }
    }

    #[test]
    fn double_flipper_is_mirrored() {
        let mut rng = thread_rng();
        let b = build_flipper(Vec2::new(10.0, -50.0), &mut rng);
        assert_eq!(b.flippers.len(), 2);
        let [a, c] = [b.flippers[0], b.flippers[1]];
        let offset_a = (a.pivot.x - 10.0).abs();
        let offset_c = (c.pivot.x - 10.0).abs();
        assert!((offset_a - offset_c).abs() < 1e-3, "pivots must mirror around the center");
        assert_eq!(a.direction, -c.direction);
    }
}
