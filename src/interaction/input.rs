//! Thin input layer standing in for the external UI: it only writes the three
//! resources a real UI would (started flag, speed multiplier, camera mode) and
//! forwards manual scroll.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

use crate::core::config::GameConfig;
use crate::core::system::system_order::PrePhysicsSet;
use crate::gameplay::state::{RaceState, SpeedMultiplier};
use crate::rendering::camera::{CameraFollow, CameraMode};

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (handle_keys, handle_scroll).in_set(PrePhysicsSet),
        );
    }
}

fn handle_keys(
    keys: Res<ButtonInput<KeyCode>>,
    cfg: Res<GameConfig>,
    mut race: ResMut<RaceState>,
    mut speed: ResMut<SpeedMultiplier>,
    mut follow: ResMut<CameraFollow>,
) {
    if keys.just_pressed(KeyCode::Space) {
        race.start();
    }
    if keys.just_pressed(KeyCode::ArrowUp) {
        let next = speed.0 + 0.5;
        speed.set_clamped(next, cfg.speed.min, cfg.speed.max);
        info!(target: "input", "speed multiplier -> {:.1}", speed.0);
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        let next = speed.0 - 0.5;
        speed.set_clamped(next, cfg.speed.min, cfg.speed.max);
        info!(target: "input", "speed multiplier -> {:.1}", speed.0);
    }
    if keys.just_pressed(KeyCode::KeyC) {
        follow.mode = follow.mode.next();
        info!(target: "input", "camera mode -> {}", follow.mode.label());
    }
}

/// Manual scrolling immediately disengages auto-follow.
fn handle_scroll(
    mut wheel: EventReader<MouseWheel>,
    cfg: Res<GameConfig>,
    mut follow: ResMut<CameraFollow>,
) {
    for event in wheel.read() {
        if event.y == 0.0 {
            continue;
        }
        if follow.mode != CameraMode::Off {
            follow.mode = CameraMode::Off;
            follow.target_y = None;
            info!(target: "input", "manual scroll; camera follow off");
        }
        follow.view_y -= event.y * cfg.camera.scroll_speed;
    }
}
