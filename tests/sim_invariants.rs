//! Headless driver invariants: a minimal Bevy app with the Rapier plugin
//! stepping a fixed dt, exercising the spec's end-to-end scenarios without a
//! window or GPU.

use std::time::Duration;

use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier2d::prelude::*;

use marble_race::core::components::{Marble, MarbleRadius, Species};
use marble_race::core::config::GameConfig;
use marble_race::core::course::layout::{Course, CourseSpec};
use marble_race::gameplay::governor::GovernorPlugin;
use marble_race::gameplay::stuck::{StuckPlugin, StuckTracker};
use marble_race::rendering::metaballs::systems::{pack_marbles, ViewTransform};
use marble_race::rendering::metaballs::MAX_MARBLES;

fn physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, TransformPlugin))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        // fixed dt so stepping is deterministic regardless of wall clock
        .insert_resource(TimestepMode::Fixed {
            dt: 1.0 / 60.0,
            substeps: 1,
        });
    app
}

/// Spec scenario: one water marble at the origin with radius 8 and zero
/// velocity falls under gravity after stepping, and its entry shows up in the
/// field renderer's input list flagged water.
#[test]
fn spawned_marble_falls_and_reaches_the_renderer() {
    let mut app = physics_app();
    let marble = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 0.0, 0.0),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::ball(8.0),
            Velocity::zero(),
            Marble,
            MarbleRadius(8.0),
            Species::Water,
        ))
        .id();

    for _ in 0..120 {
        app.update();
    }

    let transform = app.world().get::<Transform>(marble).unwrap();
    assert!(
        transform.translation.y < -0.5,
        "marble did not fall: y = {}",
        transform.translation.y
    );

    // renderer input list
    let view = ViewTransform {
        viewport: Vec2::new(1000.0, 800.0),
        zoom: 1.4,
        view_y: 0.0,
    };
    let mut input = Vec::new();
    let mut q = app.world_mut().query_filtered::<(&Transform, &MarbleRadius, &Species), With<Marble>>();
    for (t, r, s) in q.iter(app.world()) {
        input.push((t.translation.truncate(), r.0, s.flag()));
    }
    let (packed, dropped) = pack_marbles(input, &view, MAX_MARBLES);
    assert_eq!(packed.len(), 1);
    assert_eq!(dropped, 0);
    assert_eq!(packed[0].data.w, 1.0, "species flag must read water");
    assert!(packed[0].data.z > 8.0, "radius is zoom-scaled into screen px");
}

/// Post-governance speed never exceeds the hard ceiling, whatever the input.
#[test]
fn governor_caps_speed_at_hard_ceiling() {
    let mut app = App::new();
    app.insert_resource(GameConfig::default());
    app.add_plugins(GovernorPlugin);

    let cfg = GameConfig::default();
    let mut entities = Vec::new();
    for i in 0..40 {
        let speed = i as f32 * 150.0; // 0 .. 5850, far past the hard ceiling
        let dir = Vec2::from_angle(i as f32 * 0.7);
        let id = app
            .world_mut()
            .spawn((Marble, Velocity::linear(dir * speed)))
            .id();
        entities.push(id);
    }
    app.update();

    for id in entities {
        let vel = app.world().get::<Velocity>(id).unwrap();
        assert!(
            vel.linvel.length() <= cfg.driver.hard_speed_ceiling + 1e-3,
            "speed {} exceeds hard ceiling",
            vel.linvel.length()
        );
    }
}

fn course_with_finish_at(start_y: f32) -> Course {
    let mut spec = CourseSpec::default();
    spec.finish.start_y = start_y;
    spec.finish.final_platform_y = start_y - 1000.0;
    spec.bounds.half_width = 500.0;
    spec.bounds.bottom = start_y - 1100.0;
    Course(spec)
}

/// A marble motionless for longer than the timeout is moved exactly the
/// teleport distance down-course with its velocity zeroed.
#[test]
fn stuck_marble_teleports_down_course() {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(GameConfig::default());
    app.insert_resource(course_with_finish_at(-10_000.0));
    app.add_plugins(StuckPlugin);

    let start = Vec2::new(12.0, -300.0);
    let marble = app
        .world_mut()
        .spawn((
            Marble,
            Transform::from_translation(start.extend(0.0)),
            Velocity::linear(Vec2::new(0.3, 0.0)),
            StuckTracker::new(start),
        ))
        .id();

    // under the timeout: nothing happens
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(2.0));
    app.update();
    assert_eq!(
        app.world().get::<Transform>(marble).unwrap().translation.y,
        start.y
    );

    // past the timeout: exactly one teleport
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(1.5));
    app.update();
    let transform = app.world().get::<Transform>(marble).unwrap();
    let cfg = GameConfig::default();
    assert_eq!(transform.translation.y, start.y - cfg.driver.teleport_drop);
    let vel = app.world().get::<Velocity>(marble).unwrap();
    assert_eq!(vel.linvel, Vec2::ZERO);
    assert_eq!(vel.angvel, 0.0);
}

/// Past the finish line the tracker is inert; a resting marble stays put.
#[test]
fn finished_marbles_are_never_teleported() {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(GameConfig::default());
    app.insert_resource(course_with_finish_at(-100.0));
    app.add_plugins(StuckPlugin);

    let resting = Vec2::new(0.0, -900.0); // well past the finish line
    let marble = app
        .world_mut()
        .spawn((
            Marble,
            Transform::from_translation(resting.extend(0.0)),
            Velocity::zero(),
            StuckTracker::new(resting),
        ))
        .id();

    for _ in 0..4 {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(2.0));
        app.update();
    }
    assert_eq!(
        app.world().get::<Transform>(marble).unwrap().translation.y,
        resting.y
    );
}
