//! Force fields and animated obstacles: wind zones, conveyor belts, cradle
//! kicks, flipper motors, oscillating kinematics. Membership in force regions
//! is maintained by collision enter/exit events, never by per-frame distance
//! checks.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::core::components::{
    ConveyorBelt, Cradle, Flipper, Marble, Oscillator, Roamer, WindZone,
};
use crate::core::config::GameConfig;
use crate::core::course::layout::Course;
use crate::core::system::system_order::PrePhysicsSet;
use crate::gameplay::state::{RaceClock, SpeedMultiplier};

/// Marbles currently inside each wind zone's sensor region.
#[derive(Resource, Debug, Default)]
pub struct WindOccupancy(pub HashMap<Entity, HashSet<Entity>>);

/// Marbles currently in contact with each conveyor belt.
#[derive(Resource, Debug, Default)]
pub struct ConveyorRiders(pub HashMap<Entity, HashSet<Entity>>);

pub struct ForcesPlugin;

impl Plugin for ForcesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WindOccupancy>()
            .init_resource::<ConveyorRiders>()
            .add_systems(
                Update,
                (
                    track_field_membership,
                    apply_field_forces.after(track_field_membership),
                    animate_oscillators,
                    roam_wind_zones,
                    drive_cradles,
                    drive_flippers,
                )
                    .in_set(PrePhysicsSet),
            );
    }
}

/// Enter/exit bookkeeping from Rapier collision events. A despawned marble is
/// dropped lazily when force application fails to resolve it.
fn track_field_membership(
    mut events: EventReader<CollisionEvent>,
    mut wind: ResMut<WindOccupancy>,
    mut riders: ResMut<ConveyorRiders>,
    zones: Query<(), With<WindZone>>,
    belts: Query<(), With<ConveyorBelt>>,
    marbles: Query<(), With<Marble>>,
) {
    let classify = |a: Entity, b: Entity| -> Option<(Entity, Entity, bool)> {
        // returns (region, marble, is_wind)
        if zones.contains(a) && marbles.contains(b) {
            Some((a, b, true))
        } else if zones.contains(b) && marbles.contains(a) {
            Some((b, a, true))
        } else if belts.contains(a) && marbles.contains(b) {
            Some((a, b, false))
        } else if belts.contains(b) && marbles.contains(a) {
            Some((b, a, false))
        } else {
            None
        }
    };
    for event in events.read() {
        match *event {
            CollisionEvent::Started(a, b, _) => {
                if let Some((region, marble, is_wind)) = classify(a, b) {
                    let map = if is_wind { &mut wind.0 } else { &mut riders.0 };
                    map.entry(region).or_default().insert(marble);
                }
            }
            CollisionEvent::Stopped(a, b, _) => {
                if let Some((region, marble, is_wind)) = classify(a, b) {
                    let map = if is_wind { &mut wind.0 } else { &mut riders.0 };
                    if let Some(set) = map.get_mut(&region) {
                        set.remove(&marble);
                    }
                }
            }
        }
    }
}

fn apply_field_forces(
    speed: Res<SpeedMultiplier>,
    cfg: Res<GameConfig>,
    mut wind: ResMut<WindOccupancy>,
    mut riders: ResMut<ConveyorRiders>,
    zones: Query<&WindZone>,
    belts: Query<&ConveyorBelt>,
    mut forces: Query<&mut ExternalForce, With<Marble>>,
) {
    for mut force in forces.iter_mut() {
        force.force = Vec2::ZERO;
    }
    for (zone_entity, occupants) in wind.0.iter_mut() {
        let Ok(zone) = zones.get(*zone_entity) else { continue };
        occupants.retain(|marble| {
            let Ok(mut force) = forces.get_mut(*marble) else { return false };
            force.force += zone.force * speed.0;
            true
        });
    }
    for (belt_entity, on_belt) in riders.0.iter_mut() {
        let Ok(belt) = belts.get(*belt_entity) else { continue };
        on_belt.retain(|marble| {
            let Ok(mut force) = forces.get_mut(*marble) else { return false };
            force.force.x += belt.speed * cfg.driver.conveyor_force_scale;
            true
        });
    }
}

/// Kinematic sinusoids: main wind zone sweep and animated plinko pegs.
fn animate_oscillators(clock: Res<RaceClock>, mut q: Query<(&Oscillator, &mut Transform)>) {
    for (osc, mut transform) in q.iter_mut() {
        let pos = osc.position_at(clock.0);
        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}

/// Roaming wind zones drift and deflect off track bounds and committed
/// obstacle footprints.
fn roam_wind_zones(
    time: Res<Time>,
    speed: Res<SpeedMultiplier>,
    course: Option<Res<Course>>,
    mut q: Query<(&mut Roamer, &mut Transform, &Collider), With<WindZone>>,
) {
    let Some(course) = course else { return };
    let spec = &course.0;
    let dt = time.delta_secs() * speed.0;
    for (mut roamer, mut transform, collider) in q.iter_mut() {
        let half = collider
            .as_cuboid()
            .map(|c| c.half_extents())
            .unwrap_or(Vec2::splat(50.0));
        let mut pos = transform.translation.truncate() + roamer.velocity * dt;

        let x_limit = spec.bounds.half_width - half.x;
        if pos.x.abs() > x_limit {
            roamer.velocity.x = -roamer.velocity.x;
            pos.x = pos.x.clamp(-x_limit, x_limit);
        }
        let y_top = spec.bounds.top - half.y;
        let y_bottom = spec.finish.start_y + half.y;
        if pos.y > y_top || pos.y < y_bottom {
            roamer.velocity.y = -roamer.velocity.y;
            pos.y = pos.y.clamp(y_bottom, y_top);
        }

        let zone_bb = crate::core::course::layout::Aabb2::from_center(pos, half);
        if let Some(hit) = spec.obstacle_footprints.iter().find(|f| f.intersects(&zone_bb)) {
            // reflect along the axis of least penetration and step back
            let pen_x = (half.x + (hit.max.x - hit.min.x) * 0.5)
                - (pos.x - hit.center().x).abs();
            let pen_y = (half.y + (hit.max.y - hit.min.y) * 0.5)
                - (pos.y - hit.center().y).abs();
            if pen_x < pen_y {
                roamer.velocity.x = -roamer.velocity.x;
            } else {
                roamer.velocity.y = -roamer.velocity.y;
            }
            pos = transform.translation.truncate();
        }

        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}

/// Kick the lead bob on each cradle's activation interval.
fn drive_cradles(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SpeedMultiplier>,
    mut cradles: Query<&mut Cradle>,
) {
    let scaled = time.delta().mul_f32(speed.0.max(f32::EPSILON));
    for mut cradle in cradles.iter_mut() {
        cradle.timer.tick(scaled);
        if !cradle.timer.just_finished() {
            continue;
        }
        let impulse = cradle.impulse;
        if let Some(&first) = cradle.bobs.first() {
            commands.entity(first).insert(ExternalImpulse {
                impulse: Vec2::new(-impulse, 0.0),
                torque_impulse: 0.0,
            });
        }
    }
}

/// Reverse each flipper's joint motor every half period.
fn drive_flippers(
    time: Res<Time>,
    speed: Res<SpeedMultiplier>,
    mut flippers: Query<(&mut Flipper, &mut ImpulseJoint)>,
) {
    let scaled = time.delta().mul_f32(speed.0.max(f32::EPSILON));
    for (mut flipper, mut joint) in flippers.iter_mut() {
        flipper.timer.tick(scaled);
        if !flipper.timer.just_finished() {
            continue;
        }
        flipper.raised = !flipper.raised;
        let target = if flipper.raised {
            flipper.motor_speed
        } else {
            -flipper.motor_speed
        };
        if let Some(rev) = AsMut::<GenericJoint>::as_mut(&mut joint.data).as_revolute_mut() {
            rev.set_motor_velocity(target, 30.0);
        }
    }
}
