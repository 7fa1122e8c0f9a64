use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;
use std::collections::VecDeque;

use crate::core::components::Marble;
use crate::core::system::system_order::PostPhysicsAdjustSet;

/// Upper bound on any trail, regardless of speed.
pub const TRAIL_MAX: usize = 40;

/// Recent world positions of one marble, oldest first. Length tracks the
/// marble's current speed: fast marbles stream a long tail, resting marbles
/// none at all.
#[derive(Component, Debug, Default, Clone)]
pub struct Trail {
    pub points: VecDeque<Vec2>,
}

/// `min(40, floor(speed * 2.5))`, never negative.
pub fn trail_cap(speed: f32) -> usize {
    ((speed.max(0.0) * 2.5).floor() as usize).min(TRAIL_MAX)
}

impl Trail {
    pub fn record(&mut self, pos: Vec2, speed: f32) {
        self.points.push_back(pos);
        let cap = trail_cap(speed);
        while self.points.len() > cap {
            self.points.pop_front();
        }
    }
}

pub struct TrailsPlugin;

impl Plugin for TrailsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, capture_trails.in_set(PostPhysicsAdjustSet));
    }
}

/// Sampled once per frame at the post-step boundary.
fn capture_trails(mut marbles: Query<(&Transform, &Velocity, &mut Trail), With<Marble>>) {
    for (transform, vel, mut trail) in marbles.iter_mut() {
        trail.record(transform.translation.truncate(), vel.linvel.length());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_follows_speed_and_saturates() {
        assert_eq!(trail_cap(0.0), 0);
        assert_eq!(trail_cap(1.0), 2);
        assert_eq!(trail_cap(4.4), 11);
        assert_eq!(trail_cap(16.0), 40);
        assert_eq!(trail_cap(1e6), 40);
        assert_eq!(trail_cap(-5.0), 0, "negative speed must not underflow");
    }

    #[test]
    fn oldest_points_evicted_first() {
        let mut trail = Trail::default();
        for i in 0..100 {
            trail.record(Vec2::new(i as f32, 0.0), 8.0); // cap 20
        }
        assert_eq!(trail.points.len(), 20);
        assert_eq!(trail.points.front().unwrap().x, 80.0);
        assert_eq!(trail.points.back().unwrap().x, 99.0);
    }

    #[test]
    fn slowdown_shrinks_existing_trail() {
        let mut trail = Trail::default();
        for i in 0..40 {
            trail.record(Vec2::splat(i as f32), 100.0);
        }
        assert_eq!(trail.points.len(), 40);
        trail.record(Vec2::ZERO, 0.4); // cap 1
        assert_eq!(trail.points.len(), 1);
    }
}
