use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::config::GameConfig;
use crate::core::system::system_order::PrePhysicsSet;
use crate::gameplay::state::SpeedMultiplier;

pub struct PhysicsSetupPlugin; // our wrapper to configure Rapier & time stepping

impl Plugin for PhysicsSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
            .insert_resource(TimestepMode::Variable {
                max_dt: BASE_DT,
                time_scale: 1.0,
                substeps: 1,
            })
            .add_systems(Startup, configure_gravity)
            .add_systems(Update, govern_substeps.in_set(PrePhysicsSet));
    }
}

const BASE_DT: f32 = 1.0 / 60.0;

fn configure_gravity(
    mut rapier_cfg: Query<&mut RapierConfiguration>,
    game_cfg: Res<GameConfig>,
) {
    for mut cfg in rapier_cfg.iter_mut() {
        cfg.gravity = Vect::new(0.0, game_cfg.gravity.y);
    }
}

/// Sub-stepping stability guard: advance the world by `BASE_DT * multiplier`
/// per frame, split into `ceil(multiplier)` sub-steps so each sub-step's dt
/// stays bounded by `BASE_DT` no matter how high the multiplier goes.
fn govern_substeps(speed: Res<SpeedMultiplier>, mut mode: ResMut<TimestepMode>) {
    if !speed.is_changed() {
        return;
    }
    let multiplier = speed.0.max(1.0);
    *mode = TimestepMode::Variable {
        max_dt: BASE_DT,
        time_scale: multiplier,
        substeps: multiplier.ceil() as usize,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn substep_count_bounds_each_dt() {
        for multiplier in [1.0f32, 1.5, 2.0, 5.0, 9.9, 10.0] {
            let substeps = multiplier.ceil() as usize;
            let frame_advance = super::BASE_DT * multiplier;
            let per_substep = frame_advance / substeps as f32;
            assert!(
                per_substep <= super::BASE_DT + 1e-6,
                "multiplier {multiplier}: sub-step dt {per_substep} exceeds base"
            );
        }
    }
}
