//! Speed governance and restitution settling. The ceilings prevent tunneling
//! and solver blow-ups at high multipliers without slowing normal play; the
//! zero-restitution override stops settled marbles from micro-bouncing on the
//! catch platform forever.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::components::{Marble, SpawnRestitution};
use crate::core::config::GameConfig;
use crate::core::course::layout::Course;
use crate::core::system::system_order::PostPhysicsAdjustSet;

/// Height above the catch platform within which a slow marble counts as settled.
const SETTLE_ZONE: f32 = 50.0;

pub struct GovernorPlugin;

impl Plugin for GovernorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (govern_marble_speed, settle_restitution).in_set(PostPhysicsAdjustSet),
        );
    }
}

/// Post-governance speed for a measured speed `v`: above the hard ceiling the
/// velocity is rescaled to it; between the ceilings a proportional share of
/// the excess is damped away.
pub fn governed_speed(v: f32, soft: f32, hard: f32, damping: f32) -> f32 {
    if v > hard {
        hard
    } else if v > soft {
        let excess = (v - soft) / (hard - soft).max(f32::EPSILON);
        v - (v - soft) * excess * damping.clamp(0.0, 1.0)
    } else {
        v
    }
}

fn govern_marble_speed(
    cfg: Res<GameConfig>,
    mut marbles: Query<&mut Velocity, With<Marble>>,
) {
    let d = &cfg.driver;
    for mut vel in marbles.iter_mut() {
        let v = vel.linvel.length();
        if v <= d.soft_speed_ceiling || v < f32::EPSILON {
            continue;
        }
        let governed = governed_speed(v, d.soft_speed_ceiling, d.hard_speed_ceiling, d.soft_damping);
        vel.linvel *= governed / v;
    }
}

fn settle_restitution(
    cfg: Res<GameConfig>,
    course: Option<Res<Course>>,
    mut marbles: Query<(&Transform, &Velocity, &SpawnRestitution, &mut Restitution), With<Marble>>,
) {
    let Some(course) = course else { return };
    let settle_y = course.0.finish.final_platform_y + SETTLE_ZONE;
    for (transform, vel, spawn, mut restitution) in marbles.iter_mut() {
        let resting = transform.translation.y < settle_y
            && vel.linvel.length() < cfg.driver.settle_speed;
        let target = if resting { 0.0 } else { spawn.0 };
        if restitution.coefficient != target {
            restitution.coefficient = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::governed_speed;

    const SOFT: f32 = 1200.0;
    const HARD: f32 = 2000.0;

    #[test]
    fn below_soft_is_untouched() {
        assert_eq!(governed_speed(800.0, SOFT, HARD, 0.5), 800.0);
    }

    #[test]
    fn above_hard_is_rescaled_to_hard() {
        assert_eq!(governed_speed(5000.0, SOFT, HARD, 0.5), HARD);
    }

    #[test]
    fn between_ceilings_damps_proportionally() {
        let low = governed_speed(1300.0, SOFT, HARD, 0.5);
        let high = governed_speed(1900.0, SOFT, HARD, 0.5);
        assert!(low < 1300.0 && low > SOFT);
        // damping share grows with the excess
        assert!((1900.0 - high) / 1900.0 > (1300.0 - low) / 1300.0);
    }

    #[test]
    fn governed_never_exceeds_hard_ceiling() {
        for v in (0..60).map(|i| i as f32 * 100.0) {
            assert!(governed_speed(v, SOFT, HARD, 1.0) <= HARD);
        }
    }
}
