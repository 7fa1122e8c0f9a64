//! Session helpers: optional auto-close timer for headless smoke runs.

use bevy::app::AppExit;
use bevy::prelude::*;

use crate::core::config::GameConfig;

pub struct AutoClosePlugin;

impl Plugin for AutoClosePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, auto_close_when_elapsed);
    }
}

fn auto_close_when_elapsed(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut exit: EventWriter<AppExit>,
) {
    if cfg.window.auto_close > 0.0 && time.elapsed_secs() >= cfg.window.auto_close {
        info!(target: "session", "auto-close after {:.1}s", cfg.window.auto_close);
        exit.write(AppExit::Success);
    }
}
