use bevy::prelude::*;

use crate::core::course::CoursePlugin;
use crate::core::system::system_order::{PostPhysicsAdjustSet, PrePhysicsSet};
use crate::debug::DebugPlugin;
use crate::gameplay::culling::CullingPlugin;
use crate::gameplay::forces::ForcesPlugin;
use crate::gameplay::governor::GovernorPlugin;
use crate::gameplay::spawner::SpawnerPlugin;
use crate::gameplay::state::StatePlugin;
use crate::gameplay::stuck::StuckPlugin;
use crate::gameplay::trails::TrailsPlugin;
use crate::interaction::hud::HudPlugin;
use crate::interaction::input::InputPlugin;
use crate::interaction::session::AutoClosePlugin;
use crate::physics::rapier::PhysicsSetupPlugin;
use crate::rendering::camera::CameraPlugin;
use crate::rendering::gpu_guard::GpuGuardPlugin;
use crate::rendering::metaballs::MetaballsPlugin;
use crate::rendering::overlay::OverlayPlugin;

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (PrePhysicsSet, PostPhysicsAdjustSet.after(PrePhysicsSet)),
        )
        .add_plugins((
            StatePlugin,
            PhysicsSetupPlugin,
            CoursePlugin,
            SpawnerPlugin,
            ForcesPlugin,
            GovernorPlugin,
            StuckPlugin,
            CullingPlugin,
            TrailsPlugin,
            CameraPlugin,
            GpuGuardPlugin,
            MetaballsPlugin,
            OverlayPlugin,
            InputPlugin,
            HudPlugin,
        ))
        .add_plugins((
            DebugPlugin,
            AutoClosePlugin,
        ));
    }
}
