//! Sleep culling: marbles near the viewed slice of the course are forced
//! awake every frame; everything outside the active band may fall asleep in
//! the solver. The driver's spatial grid limits the wake pass to the cells
//! the band actually touches.

use bevy::prelude::*;
use bevy_rapier2d::prelude::Sleeping;

use crate::core::components::Marble;
use crate::core::config::GameConfig;
use crate::core::system::system_order::PrePhysicsSet;
use crate::physics::grid::SpatialGrid;
use crate::rendering::camera::CameraFollow;

pub struct CullingPlugin;

impl Plugin for CullingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_grid).add_systems(
            Update,
            (rebuild_grid, wake_active_band.after(rebuild_grid)).in_set(PrePhysicsSet),
        );
    }
}

fn init_grid(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(SpatialGrid::new(cfg.driver.grid_cell));
}

fn rebuild_grid(mut grid: ResMut<SpatialGrid>, marbles: Query<(Entity, &Transform), With<Marble>>) {
    grid.clear();
    for (entity, transform) in marbles.iter() {
        grid.insert(transform.translation.truncate(), entity);
    }
}

fn wake_active_band(
    grid: Res<SpatialGrid>,
    cfg: Res<GameConfig>,
    follow: Res<CameraFollow>,
    windows: Query<&Window>,
    mut sleepers: Query<&mut Sleeping, With<Marble>>,
) {
    let Ok(window) = windows.single() else { return };
    let view_height = window.height() / cfg.camera.view_zoom;
    let reach = view_height * (0.5 + cfg.driver.wake_band_viewports);
    let y_min = follow.view_y - reach;
    let y_max = follow.view_y + reach;
    for entity in grid.entities_in_band(y_min, y_max) {
        if let Ok(mut sleeping) = sleepers.get_mut(entity) {
            if sleeping.sleeping {
                sleeping.sleeping = false;
            }
        }
    }
}
