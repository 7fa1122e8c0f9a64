//! Per-frame upload: live marble positions are transformed into the pan/zoom
//! viewport and packed into the storage buffer the fragment shader sums over.

use bevy::prelude::*;
use bevy::render::storage::ShaderStorageBuffer;
use bevy::sprite::{Material2dPlugin, MeshMaterial2d};

use super::material::{GpuMarble, MetaballsMaterial, MAX_MARBLES};
use crate::core::components::{Marble, MarbleRadius, Species};
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::debug::stats::DebugStats;
use crate::rendering::camera::CameraFollow;
use crate::rendering::gpu_guard::GpuCapabilities;

/// World → screen mapping for the field renderer: a fixed zoom (> 1) around
/// the track center combined with the camera-driven vertical offset. Screen
/// space is pixels with y down, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub viewport: Vec2,
    pub zoom: f32,
    pub view_y: f32,
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            self.viewport.x * 0.5 + world.x * self.zoom,
            self.viewport.y * 0.5 - (world.y - self.view_y) * self.zoom,
        )
    }
}

/// Pack marbles into GPU form. Deterministic in input order; excess beyond
/// `capacity` is dropped from the tail and reported. Zero marbles is a valid
/// input and yields an empty list.
pub fn pack_marbles(
    marbles: impl IntoIterator<Item = (Vec2, f32, f32)>,
    view: &ViewTransform,
    capacity: usize,
) -> (Vec<GpuMarble>, usize) {
    let mut out = Vec::new();
    let mut dropped = 0usize;
    for (pos, radius, species) in marbles {
        if out.len() < capacity {
            out.push(GpuMarble::new(
                view.world_to_screen(pos),
                radius * view.zoom,
                species,
            ));
        } else {
            dropped += 1;
        }
    }
    (out, dropped)
}

#[derive(Component)]
pub struct MetaballsQuad;

/// Ordered after the camera/driver adjustments so the upload sees this
/// frame's final positions and view offset.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct MetaballsUpdateSet;

pub struct MetaballsPlugin;

impl Plugin for MetaballsPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(target_arch = "wasm32")]
        super::material::register_embedded_shader(app);

        app.add_plugins(Material2dPlugin::<MetaballsMaterial>::default())
            .configure_sets(Update, MetaballsUpdateSet.after(PostPhysicsAdjustSet))
            .add_systems(Startup, setup_metaballs)
            .add_systems(Update, update_metaballs_material.in_set(MetaballsUpdateSet));
    }
}

fn setup_metaballs(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<MetaballsMaterial>>,
    windows: Query<&Window>,
    cfg: Res<GameConfig>,
) {
    let (w, h) = if let Ok(window) = windows.single() {
        (window.width(), window.height())
    } else {
        (cfg.window.width, cfg.window.height)
    };
    // 2x2 quad; the vertex stage passes positions straight through as clip
    // coordinates, so the quad always covers the full surface.
    let mesh_handle = meshes.add(Mesh::from(Rectangle::new(2.0, 2.0)));

    let mut material = MetaballsMaterial::default();
    material.data.v0.z = cfg.metaballs.threshold;
    material.data.v1 = Vec4::new(w, h, cfg.metaballs.noise_scale, cfg.metaballs.noise_time_scale);
    let material_handle = materials.add(material);

    commands.spawn((
        Mesh2d::from(mesh_handle),
        MeshMaterial2d(material_handle),
        Transform::from_xyz(0.0, 0.0, 50.0),
        Visibility::Visible,
        MetaballsQuad,
    ));
}

#[allow(clippy::too_many_arguments)]
fn update_metaballs_material(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    follow: Res<CameraFollow>,
    caps: Option<Res<GpuCapabilities>>,
    windows: Query<&Window>,
    q_marbles: Query<(&Transform, &MarbleRadius, &Species), With<Marble>>,
    q_mat: Query<&MeshMaterial2d<MetaballsMaterial>, With<MetaballsQuad>>,
    mut materials: ResMut<Assets<MetaballsMaterial>>,
    mut buffers: ResMut<Assets<ShaderStorageBuffer>>,
    mut stats: ResMut<DebugStats>,
) {
    // capability gate: a failed probe means we must not drive the pipeline
    if caps.as_ref().is_some_and(|c| !c.ok) {
        return;
    }
    let Ok(handle_comp) = q_mat.single() else { return };
    let Some(mat) = materials.get_mut(&handle_comp.0) else { return };
    let Ok(window) = windows.single() else { return };

    let view = ViewTransform {
        viewport: Vec2::new(window.width(), window.height()),
        zoom: cfg.camera.view_zoom,
        view_y: follow.view_y,
    };
    let (mut marbles_cpu, dropped) = pack_marbles(
        q_marbles
            .iter()
            .map(|(t, r, s)| (t.translation.truncate(), r.0, s.flag())),
        &view,
        MAX_MARBLES,
    );
    stats.marbles_rendered = marbles_cpu.len();
    stats.marbles_truncated = dropped;

    mat.data.v0.x = marbles_cpu.len() as f32;
    mat.data.v0.y = time.elapsed_secs();
    mat.data.v0.z = cfg.metaballs.threshold;
    mat.data.v1 = Vec4::new(
        view.viewport.x,
        view.viewport.y,
        cfg.metaballs.noise_scale,
        cfg.metaballs.noise_time_scale,
    );

    if marbles_cpu.is_empty() {
        // keep one dummy element so the storage binding is never empty;
        // the shader loops over v0.x and draws nothing
        marbles_cpu.push(GpuMarble::default());
    }
    let new_buf = ShaderStorageBuffer::from(marbles_cpu.as_slice());
    if buffers.get(&mat.marbles).is_some() {
        if let Some(b) = buffers.get_mut(&mat.marbles) {
            *b = new_buf;
        }
    } else {
        mat.marbles = buffers.add(new_buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewTransform {
        ViewTransform {
            viewport: Vec2::new(1000.0, 800.0),
            zoom: 1.4,
            view_y: -200.0,
        }
    }

    #[test]
    fn world_to_screen_centers_and_flips_y() {
        let v = view();
        let center = v.world_to_screen(Vec2::new(0.0, -200.0));
        assert_eq!(center, Vec2::new(500.0, 400.0));
        // further down the course (more negative y) is further down the screen
        let below = v.world_to_screen(Vec2::new(0.0, -300.0));
        assert!(below.y > center.y);
    }

    #[test]
    fn pack_is_deterministic_for_identical_input() {
        let v = view();
        let input = vec![
            (Vec2::new(1.0, -2.0), 8.0, 1.0),
            (Vec2::new(-40.0, -900.0), 6.5, 0.0),
            (Vec2::new(333.3, -12.5), 9.9, 1.0),
        ];
        let (a, _) = pack_marbles(input.clone(), &v, MAX_MARBLES);
        let (b, _) = pack_marbles(input, &v, MAX_MARBLES);
        assert_eq!(a, b);
    }

    #[test]
    fn pack_tolerates_zero_marbles() {
        let (packed, dropped) = pack_marbles(Vec::new(), &view(), MAX_MARBLES);
        assert!(packed.is_empty());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn pack_clamps_excess_by_iteration_order() {
        let v = view();
        let input: Vec<_> = (0..10)
            .map(|i| (Vec2::new(i as f32, 0.0), 5.0, 1.0))
            .collect();
        let (packed, dropped) = pack_marbles(input, &v, 4);
        assert_eq!(packed.len(), 4);
        assert_eq!(dropped, 6);
        // the first four inputs survive, in order
        for (i, m) in packed.iter().enumerate() {
            assert_eq!(m.data.x, v.world_to_screen(Vec2::new(i as f32, 0.0)).x);
        }
    }

    #[test]
    fn species_flag_rides_in_w() {
        let (packed, _) = pack_marbles(vec![(Vec2::ZERO, 8.0, 1.0)], &view(), 8);
        assert_eq!(packed[0].data.w, 1.0);
    }
}
