//! Stuck-marble recovery: a marble that stops making progress against
//! geometry is nudged down-course after a timeout so no race deadlocks.

use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::Marble;
use crate::core::config::GameConfig;
use crate::core::course::layout::Course;
use crate::core::system::system_order::PostPhysicsAdjustSet;

/// Last anchor position and how long the marble has hovered near it.
#[derive(Component, Debug, Clone, Copy)]
pub struct StuckTracker {
    pub anchor: Vec2,
    pub still_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckVerdict {
    Moving,
    Waiting,
    Teleport,
}

impl StuckTracker {
    pub fn new(pos: Vec2) -> Self {
        Self {
            anchor: pos,
            still_secs: 0.0,
        }
    }

    /// Advance the tracker by one frame. Movement of at least `min_distance`
    /// re-anchors; `timeout` seconds without it demands a teleport, after
    /// which the tracker restarts from the new position.
    pub fn observe(&mut self, pos: Vec2, dt: f32, min_distance: f32, timeout: f32) -> StuckVerdict {
        if pos.distance(self.anchor) >= min_distance {
            self.anchor = pos;
            self.still_secs = 0.0;
            return StuckVerdict::Moving;
        }
        self.still_secs += dt;
        if self.still_secs > timeout {
            StuckVerdict::Teleport
        } else {
            StuckVerdict::Waiting
        }
    }
}

pub struct StuckPlugin;

impl Plugin for StuckPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, recover_stuck_marbles.in_set(PostPhysicsAdjustSet));
    }
}

fn recover_stuck_marbles(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    course: Option<Res<Course>>,
    mut marbles: Query<(&mut Transform, &mut Velocity, &mut StuckTracker), With<Marble>>,
) {
    let Some(course) = course else { return };
    let finish_y = course.0.finish.start_y;
    let d = &cfg.driver;
    for (mut transform, mut vel, mut tracker) in marbles.iter_mut() {
        let pos = transform.translation.truncate();
        // past the finish line marbles are allowed to rest forever
        if pos.y < finish_y {
            tracker.anchor = pos;
            tracker.still_secs = 0.0;
            continue;
        }
        if tracker.observe(pos, time.delta_secs(), d.stuck_distance, d.stuck_timeout)
            == StuckVerdict::Teleport
        {
            transform.translation.y -= d.teleport_drop;
            vel.linvel = Vec2::ZERO;
            vel.angvel = 0.0;
            *tracker = StuckTracker::new(transform.translation.truncate());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIST: f32 = 5.0;
    const TIMEOUT: f32 = 3.0;

    #[test]
    fn movement_keeps_resetting_the_clock() {
        let mut t = StuckTracker::new(Vec2::ZERO);
        let mut pos = Vec2::ZERO;
        for _ in 0..100 {
            pos.y -= 6.0;
            assert_eq!(t.observe(pos, 0.5, DIST, TIMEOUT), StuckVerdict::Moving);
        }
        assert_eq!(t.still_secs, 0.0);
    }

    #[test]
    fn sub_threshold_drift_accumulates_to_teleport() {
        let mut t = StuckTracker::new(Vec2::ZERO);
        let pos = Vec2::new(2.0, -2.0); // < 5 px from anchor
        let mut frames = 0;
        loop {
            frames += 1;
            match t.observe(pos, 0.25, DIST, TIMEOUT) {
                StuckVerdict::Teleport => break,
                StuckVerdict::Waiting => {}
                StuckVerdict::Moving => panic!("drift below threshold must not re-anchor"),
            }
            assert!(frames < 100, "never reached teleport");
        }
        assert!(frames as f32 * 0.25 > TIMEOUT);
    }

    #[test]
    fn teleport_is_not_triggered_early() {
        let mut t = StuckTracker::new(Vec2::ZERO);
        assert_eq!(t.observe(Vec2::ZERO, 2.9, DIST, TIMEOUT), StuckVerdict::Waiting);
        assert_eq!(t.observe(Vec2::ZERO, 0.2, DIST, TIMEOUT), StuckVerdict::Teleport);
    }
}
