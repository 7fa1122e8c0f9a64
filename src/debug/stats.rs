use bevy::prelude::*;

use crate::core::components::Marble;
#[cfg(feature = "debug")]
use bevy_rapier2d::prelude::Sleeping;

/// Frame counters maintained by the driver and renderer; the logging system is
/// feature-gated, the counters themselves are always available.
#[derive(Resource, Debug, Default)]
pub struct DebugStats {
    pub spawned_total: usize,
    pub marble_count: usize,
    pub awake_count: usize,
    pub marbles_rendered: usize,
    pub marbles_truncated: usize,
}

#[cfg(feature = "debug")]
#[derive(Resource)]
struct LogTimer(Timer);

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugStats>()
            .add_systems(Update, count_marbles);
        #[cfg(feature = "debug")]
        {
            app.insert_resource(LogTimer(Timer::from_seconds(1.0, TimerMode::Repeating)))
                .add_systems(Update, debug_logging_system.after(count_marbles));
        }
    }
}

fn count_marbles(mut stats: ResMut<DebugStats>, marbles: Query<(), With<Marble>>) {
    stats.marble_count = marbles.iter().count();
}

#[cfg(feature = "debug")]
fn debug_logging_system(
    time: Res<Time>,
    mut timer: ResMut<LogTimer>,
    mut stats: ResMut<DebugStats>,
    sleepers: Query<&Sleeping, With<Marble>>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }
    stats.awake_count = sleepers.iter().filter(|s| !s.sleeping).count();
    info!(
        target: "sim",
        "SIM t={:.1}s marbles={} awake={} spawned={} rendered={} trunc={}",
        time.elapsed_secs(),
        stats.marble_count,
        stats.awake_count,
        stats.spawned_total,
        stats.marbles_rendered,
        stats.marbles_truncated
    );
}
