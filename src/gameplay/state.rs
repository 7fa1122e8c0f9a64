//! Race lifecycle state written by the UI layer and read by the driver.

use bevy::prelude::*;

use crate::core::config::GameConfig;
use crate::core::system::system_order::PrePhysicsSet;

/// One-shot race start plus the bounded spawn window. `start` is idempotent:
/// the UI may send the command repeatedly without restarting the window.
#[derive(Resource, Debug)]
pub struct RaceState {
    pub started: bool,
    pub spawn_window: Timer,
}

impl RaceState {
    pub fn new(window_secs: f32) -> Self {
        Self {
            started: false,
            spawn_window: Timer::from_seconds(window_secs, TimerMode::Once),
        }
    }

    pub fn start(&mut self) {
        if !self.started {
            self.started = true;
            info!(target: "race", "race started; spawning for {:.1}s", self.spawn_window.duration().as_secs_f32());
        }
    }

    /// Spawning runs only while started and inside the window.
    pub fn spawning_active(&self) -> bool {
        self.started && !self.spawn_window.finished()
    }
}

/// Global playback speed, clamped to the configured range.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SpeedMultiplier(pub f32);

impl SpeedMultiplier {
    pub fn set_clamped(&mut self, value: f32, min: f32, max: f32) {
        self.0 = value.clamp(min, max);
    }
}

/// Simulation-time clock: advances by `delta * multiplier`, so kinematic
/// animation (oscillating pegs, wind sweep) keeps pace with the physics
/// time scale.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct RaceClock(pub f32);

pub struct StatePlugin;

impl Plugin for StatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RaceClock>()
            .add_systems(Startup, init_state_from_config)
            .add_systems(Update, tick_race_clock.in_set(PrePhysicsSet));
    }
}

fn init_state_from_config(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(RaceState::new(cfg.spawn.window));
    commands.insert_resource(SpeedMultiplier(
        cfg.speed.initial.clamp(cfg.speed.min, cfg.speed.max),
    ));
}

fn tick_race_clock(time: Res<Time>, speed: Res<SpeedMultiplier>, mut clock: ResMut<RaceClock>) {
    clock.0 += time.delta_secs() * speed.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent() {
        let mut race = RaceState::new(10.0);
        assert!(!race.spawning_active());
        race.start();
        let first = race.started;
        race.start();
        assert!(first && race.started);
        assert!(race.spawning_active());
    }

    #[test]
    fn multiplier_clamps_to_range() {
        let mut speed = SpeedMultiplier(1.0);
        speed.set_clamped(99.0, 1.0, 10.0);
        assert_eq!(speed.0, 10.0);
        speed.set_clamped(0.0, 1.0, 10.0);
        assert_eq!(speed.0, 1.0);
    }
}
