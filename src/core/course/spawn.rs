//! Course instantiation: converts the generated [`CourseSpec`] into Rapier
//! bodies, joints and sensors. Runs once at startup; resize never re-runs it
//! (only the display projection follows the window).

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::thread_rng;

use super::layout::{Course, CourseSpec, PartKind, PartShape, WindMotion};
use crate::core::components::{
    kinetic_collision_groups, sensor_collision_groups, world_collision_groups, ConveyorBelt,
    Cradle, CradleBob, Flipper, LayerSeparator, Oscillator, Roamer, Spinner, WindZone,
};
use crate::core::config::GameConfig;
use crate::core::course::generator::generate_course;

pub struct CoursePlugin;

impl Plugin for CoursePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, generate_and_spawn_course);
    }
}

fn generate_and_spawn_course(
    mut commands: Commands,
    windows: Query<&Window>,
    cfg: Res<GameConfig>,
) {
    let width = windows
        .single()
        .map(|w| w.width())
        .unwrap_or(cfg.window.width);
    let mut rng = thread_rng();
    let spec = generate_course(width, &cfg.course, &cfg.wind, &mut rng);
    info!(
        target: "course",
        "generated course: {} statics, {} spinners, {} cradles, {} flippers, {} conveyors, {} pegs, {} wind zones, span {:.0}..{:.0}",
        spec.statics.len(),
        spec.spinners.len(),
        spec.cradles.len(),
        spec.flippers.len(),
        spec.conveyors.len(),
        spec.pegs.len(),
        spec.wind_zones.len(),
        spec.bounds.top,
        spec.bounds.bottom,
    );
    spawn_course(&mut commands, &spec);
    commands.insert_resource(Course(spec));
}

fn collider_for(shape: &PartShape) -> Collider {
    match *shape {
        PartShape::Cuboid { hx, hy } => Collider::cuboid(hx, hy),
        PartShape::Circle { r } => Collider::ball(r),
        PartShape::Triangle { a, b, c } => Collider::triangle(a, b, c),
    }
}

/// Surface friction per part kind; belts grip, spikes and slopes shed.
fn friction_for(kind: PartKind) -> f32 {
    match kind {
        PartKind::Belt => 1.2,
        PartKind::Ramp | PartKind::FinishSlope => 0.05,
        PartKind::Spike => 0.2,
        _ => 0.3,
    }
}

pub fn spawn_course(commands: &mut Commands, spec: &CourseSpec) {
    for part in &spec.statics {
        commands.spawn((
            Transform {
                translation: part.pos.extend(0.0),
                rotation: Quat::from_rotation_z(part.rot),
                ..default()
            },
            GlobalTransform::default(),
            RigidBody::Fixed,
            collider_for(&part.shape),
            Friction::coefficient(friction_for(part.kind)),
            Restitution::coefficient(0.2),
            world_collision_groups(),
        ));
    }

    for spinner in &spec.spinners {
        let anchor = commands
            .spawn((
                Transform::from_translation(spinner.pos.extend(0.0)),
                GlobalTransform::default(),
                RigidBody::Fixed,
            ))
            .id();
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(Vec2::ZERO)
            .local_anchor2(Vec2::ZERO);
        commands.spawn((
            Transform::from_translation(spinner.pos.extend(0.0)),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::cuboid(spinner.half_length, spinner.half_thickness),
            Velocity::angular(spinner.spin),
            ColliderMassProperties::Density(4.0),
            kinetic_collision_groups(),
            Sleeping::disabled(),
            ImpulseJoint::new(anchor, joint),
            Spinner { spin: spinner.spin },
        ));
    }

    for cradle in &spec.cradles {
        let row_half = (cradle.bobs as f32 - 1.0) * cradle.bob_radius;
        let mut bobs = Vec::with_capacity(cradle.bobs as usize);
        for i in 0..cradle.bobs {
            let x = cradle.anchor.x - row_half + i as f32 * cradle.bob_radius * 2.0;
            let anchor_pos = Vec2::new(x, cradle.anchor.y);
            let bob_pos = Vec2::new(x, cradle.anchor.y - cradle.rope_length);
            let anchor = commands
                .spawn((
                    Transform::from_translation(anchor_pos.extend(0.0)),
                    GlobalTransform::default(),
                    RigidBody::Fixed,
                ))
                .id();
            let rope = RevoluteJointBuilder::new()
                .local_anchor1(Vec2::ZERO)
                .local_anchor2(Vec2::new(0.0, cradle.rope_length));
            let bob = commands
                .spawn((
                    Transform::from_translation(bob_pos.extend(0.0)),
                    GlobalTransform::default(),
                    RigidBody::Dynamic,
                    Collider::ball(cradle.bob_radius),
                    Restitution::coefficient(0.95),
                    ColliderMassProperties::Density(6.0),
                    kinetic_collision_groups(),
                    Sleeping::disabled(),
                    ImpulseJoint::new(anchor, rope),
                    CradleBob,
                ))
                .id();
            bobs.push(bob);
        }
        commands.spawn(Cradle {
            bobs,
            timer: Timer::from_seconds(cradle.interval, TimerMode::Repeating),
            impulse: cradle.impulse,
        });
    }

    for flipper in &spec.flippers {
        let anchor = commands
            .spawn((
                Transform::from_translation(flipper.pivot.extend(0.0)),
                GlobalTransform::default(),
                RigidBody::Fixed,
            ))
            .id();
        // bar extends from the pivot toward the center gap
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(Vec2::ZERO)
            .local_anchor2(Vec2::new(-flipper.direction * flipper.half_length, 0.0))
            .limits([-0.6, 0.6])
            .motor_velocity(0.0, 50.0);
        commands.spawn((
            Transform::from_translation(
                (flipper.pivot + Vec2::new(flipper.direction * flipper.half_length, 0.0)).extend(0.0),
            ),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::cuboid(flipper.half_length, flipper.half_thickness),
            ColliderMassProperties::Density(5.0),
            kinetic_collision_groups(),
            Sleeping::disabled(),
            ImpulseJoint::new(anchor, joint),
            Flipper {
                timer: Timer::from_seconds(flipper.period * 0.5, TimerMode::Repeating),
                raised: false,
                motor_speed: 6.0 * flipper.direction,
            },
        ));
    }

    for belt in &spec.conveyors {
        commands.spawn((
            Transform::from_translation(belt.pos.extend(0.0)),
            GlobalTransform::default(),
            RigidBody::Fixed,
            Collider::cuboid(belt.half_length, belt.half_thickness),
            Friction::coefficient(friction_for(PartKind::Belt)),
            world_collision_groups(),
            ActiveEvents::COLLISION_EVENTS,
            ConveyorBelt { speed: belt.speed },
        ));
    }

    for peg in &spec.pegs {
        match peg.oscillation {
            Some(osc) => {
                commands.spawn((
                    Transform::from_translation(peg.pos.extend(0.0)),
                    GlobalTransform::default(),
                    RigidBody::KinematicPositionBased,
                    Collider::ball(peg.radius),
                    kinetic_collision_groups(),
                    Oscillator {
                        origin: peg.pos,
                        amplitude: osc.amplitude,
                        frequency: osc.frequency,
                        phase: osc.phase,
                    },
                ));
            }
            None => {
                commands.spawn((
                    Transform::from_translation(peg.pos.extend(0.0)),
                    GlobalTransform::default(),
                    RigidBody::Fixed,
                    Collider::ball(peg.radius),
                    Restitution::coefficient(0.6),
                    world_collision_groups(),
                ));
            }
        }
    }

    for zone in &spec.wind_zones {
        let mut entity = commands.spawn((
            Transform::from_translation(zone.pos.extend(0.0)),
            GlobalTransform::default(),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(zone.half.x, zone.half.y),
            Sensor,
            sensor_collision_groups(),
            ActiveEvents::COLLISION_EVENTS,
            WindZone { force: zone.force },
        ));
        match zone.motion {
            WindMotion::Oscillate { amplitude, frequency } => {
                entity.insert(Oscillator {
                    origin: zone.pos,
                    amplitude,
                    frequency,
                    phase: 0.0,
                });
            }
            WindMotion::Roam { velocity } => {
                entity.insert(Roamer { velocity });
            }
        }
    }

    for sep in &spec.separators {
        commands.spawn((
            Transform::from_translation(Vec3::new(0.0, sep.y, 0.0)),
            GlobalTransform::default(),
            RigidBody::Fixed,
            Collider::cuboid(sep.half_width, 2.0),
            Sensor,
            sensor_collision_groups(),
            LayerSeparator,
        ));
    }
}
