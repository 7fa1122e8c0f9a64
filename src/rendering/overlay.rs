//! Gizmo overlay: trails, wind indicators and layer separators drawn in world
//! space on the surface stacked above the field quad.

use bevy::prelude::*;
use bevy_rapier2d::prelude::Collider;

use crate::core::components::{Marble, Species, WindZone};
use crate::core::course::layout::Course;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::gameplay::trails::Trail;

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (draw_trails, draw_wind_zones, draw_separators).in_set(PostPhysicsAdjustSet),
        );
    }
}

fn species_color(species: Species) -> Color {
    match species {
        Species::Water => Color::srgb(0.4, 0.7, 1.0),
        Species::Lava => Color::srgb(1.0, 0.6, 0.0),
    }
}

fn draw_trails(mut gizmos: Gizmos, marbles: Query<(&Trail, &Species), With<Marble>>) {
    for (trail, species) in marbles.iter() {
        let n = trail.points.len();
        if n < 2 {
            continue;
        }
        let base = species_color(*species);
        for (i, pair) in trail.points.iter().zip(trail.points.iter().skip(1)).enumerate() {
            // older segments fade out
            let alpha = (i + 1) as f32 / n as f32 * 0.6;
            gizmos.line_2d(*pair.0, *pair.1, base.with_alpha(alpha));
        }
    }
}

fn draw_wind_zones(mut gizmos: Gizmos, zones: Query<(&Transform, &WindZone, &Collider)>) {
    for (transform, zone, collider) in zones.iter() {
        let pos = transform.translation.truncate();
        let half = collider
            .as_cuboid()
            .map(|c| c.half_extents())
            .unwrap_or(Vec2::splat(70.0));
        gizmos.rect_2d(
            Isometry2d::from_translation(pos),
            half * 2.0,
            Color::srgba(0.6, 0.9, 1.0, 0.25),
        );
        let tip = pos + zone.force.normalize_or_zero() * 60.0;
        gizmos.arrow_2d(pos, tip, Color::srgba(0.6, 0.9, 1.0, 0.8));
    }
}

fn draw_separators(mut gizmos: Gizmos, course: Option<Res<Course>>) {
    let Some(course) = course else { return };
    for sep in &course.0.separators {
        gizmos.line_2d(
            Vec2::new(-sep.half_width, sep.y),
            Vec2::new(sep.half_width, sep.y),
            Color::srgba(1.0, 1.0, 1.0, 0.08),
        );
    }
}
