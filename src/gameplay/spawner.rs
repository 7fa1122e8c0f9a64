use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

use crate::core::components::{marble_collision_groups, Marble, MarbleRadius, Species, SpawnRestitution};
use crate::core::config::GameConfig;
use crate::core::course::layout::Course;
use crate::core::system::system_order::PrePhysicsSet;
use crate::debug::stats::DebugStats;
use crate::gameplay::state::RaceState;
use crate::gameplay::stuck::StuckTracker;
use crate::gameplay::trails::Trail;

pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_spawn_timer)
            .add_systems(Update, emit_marbles.in_set(PrePhysicsSet));
    }
}

#[derive(Resource, Deref, DerefMut)]
struct SpawnTimer(Timer);

fn init_spawn_timer(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(SpawnTimer(Timer::from_seconds(
        cfg.spawn.interval,
        TimerMode::Repeating,
    )));
}

/// Emit marbles along the spawn line while the window is open. The interval is
/// far below a frame, so a single frame tick releases a batch; after the
/// window the course already has enough marbles in flight.
fn emit_marbles(
    mut commands: Commands,
    time: Res<Time>,
    mut race: ResMut<RaceState>,
    mut timer: ResMut<SpawnTimer>,
    cfg: Res<GameConfig>,
    course: Option<Res<Course>>,
    mut stats: ResMut<DebugStats>,
) {
    if !race.started {
        return;
    }
    race.spawn_window.tick(time.delta());
    if !race.spawning_active() {
        return;
    }
    let Some(course) = course else { return };

    timer.tick(time.delta());
    let batch = timer.times_finished_this_tick();
    if batch == 0 {
        return;
    }

    let mut rng = rand::thread_rng();
    let bounds = &course.0.bounds;
    let sc = &cfg.spawn;
    for _ in 0..batch {
        let radius = rng.gen_range(sc.radius_range.min..sc.radius_range.max);
        let x = rng.gen_range(-bounds.half_width + radius..bounds.half_width - radius);
        // staggered above the spawn line so a batch doesn't interpenetrate
        let y = bounds.top + radius + rng.gen_range(0.0..220.0);
        let restitution = rng.gen_range(sc.restitution_range.min..sc.restitution_range.max);
        let species = if rng.gen_bool(0.5) { Species::Water } else { Species::Lava };
        let pos = Vec2::new(x, y);

        commands.spawn((
            Transform::from_translation(pos.extend(0.0)),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::ball(radius),
            Velocity::zero(),
            Restitution::coefficient(restitution),
            Friction::coefficient(sc.friction),
            Damping {
                linear_damping: rng.gen_range(sc.air_damping_range.min..sc.air_damping_range.max),
                angular_damping: 0.0,
            },
            ColliderMassProperties::Density(
                rng.gen_range(sc.density_range.min..sc.density_range.max),
            ),
            ActiveEvents::COLLISION_EVENTS,
            marble_collision_groups(),
            Sleeping::default(),
            ExternalForce::default(),
            (
                Marble,
                MarbleRadius(radius),
                species,
                SpawnRestitution(restitution),
                Trail::default(),
                StuckTracker::new(pos),
            ),
        ));
        stats.spawned_total += 1;
    }
}
