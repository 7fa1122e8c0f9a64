//! Camera targeting and smoothing. Each frame the driver derives a target
//! altitude from the live marbles (leader, straggler, or densest cluster) and
//! the view eases toward it; the easing rate scales with playback speed so
//! fast races track proportionally faster.

use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::Marble;
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::gameplay::state::SpeedMultiplier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Off,
    /// Follow the marble furthest down the course.
    Winner,
    /// Follow the densest cluster's centroid.
    Cluster,
    /// Follow the straggler at the back.
    Loser,
}

impl CameraMode {
    /// UI cycle order: off → winner → cluster → loser → off.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Winner,
            Self::Winner => Self::Cluster,
            Self::Cluster => Self::Loser,
            Self::Loser => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "free",
            Self::Winner => "winner",
            Self::Cluster => "cluster",
            Self::Loser => "loser",
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct CameraFollow {
    pub mode: CameraMode,
    pub target_y: Option<f32>,
    pub view_y: f32,
}

/// Effective per-frame easing factor; saturates at 1 (snap to target).
pub fn smoothing_factor(base: f32, multiplier: f32) -> f32 {
    (base * multiplier.max(0.0).sqrt()).min(1.0)
}

/// One easing step toward the target. For factors in (0, 1] this is a
/// contraction: the view approaches the target monotonically and never
/// overshoots.
pub fn ease(view: f32, target: f32, factor: f32) -> f32 {
    view + (target - view) * factor.clamp(0.0, 1.0)
}

/// Centroid of the minimum-spread window of size `max(10, len / 5)` over the
/// sorted altitudes. Fewer marbles than a window: centroid of all of them.
pub fn cluster_window_centroid(ys: &mut Vec<f32>) -> Option<f32> {
    if ys.is_empty() {
        return None;
    }
    ys.sort_by(|a, b| a.total_cmp(b));
    let window = (ys.len() / 5).max(10).min(ys.len());
    let mut best_start = 0;
    let mut best_spread = f32::INFINITY;
    for start in 0..=(ys.len() - window) {
        let spread = ys[start + window - 1] - ys[start];
        if spread < best_spread {
            best_spread = spread;
            best_start = start;
        }
    }
    let slice = &ys[best_start..best_start + window];
    Some(slice.iter().sum::<f32>() / slice.len() as f32)
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraFollow>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (compute_camera_target, ease_camera_view, sync_camera)
                    .chain()
                    .in_set(PostPhysicsAdjustSet),
            );
    }
}

fn setup_camera(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.spawn((
        Camera2d,
        Transform::from_scale(Vec3::splat(1.0 / cfg.camera.view_zoom)),
    ));
}

fn compute_camera_target(
    mut follow: ResMut<CameraFollow>,
    marbles: Query<&Transform, (With<Marble>, With<Velocity>)>,
) {
    if follow.mode == CameraMode::Off {
        follow.target_y = None;
        return;
    }
    let mut ys: Vec<f32> = marbles.iter().map(|t| t.translation.y).collect();
    follow.target_y = match follow.mode {
        CameraMode::Off => None,
        // y-up world: the winner is the lowest marble
        CameraMode::Winner => ys.iter().copied().min_by(f32::total_cmp),
        CameraMode::Loser => ys.iter().copied().max_by(f32::total_cmp),
        CameraMode::Cluster => cluster_window_centroid(&mut ys),
    };
}

fn ease_camera_view(
    cfg: Res<GameConfig>,
    speed: Res<SpeedMultiplier>,
    mut follow: ResMut<CameraFollow>,
) {
    let Some(target) = follow.target_y else { return };
    let factor = smoothing_factor(cfg.camera.smoothing_base, speed.0);
    follow.view_y = ease(follow.view_y, target, factor);
}

fn sync_camera(follow: Res<CameraFollow>, mut cameras: Query<&mut Transform, With<Camera2d>>) {
    for mut transform in cameras.iter_mut() {
        transform.translation.y = follow.view_y;
        transform.translation.x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_wraps_through_all_four() {
        let mut mode = CameraMode::Off;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![CameraMode::Winner, CameraMode::Cluster, CameraMode::Loser, CameraMode::Off]
        );
    }

    #[test]
    fn easing_is_a_contraction() {
        let target = -500.0;
        for factor in [0.05f32, 0.3, 1.0] {
            let mut view = 100.0;
            let mut last_distance = (target - view as f32).abs();
            for _ in 0..200 {
                let next = ease(view, target, factor);
                // monotonic approach, never overshooting
                assert!((target - next).abs() <= last_distance + 1e-4);
                assert!((next - target).signum() == (view - target).signum() || next == target);
                view = next;
                last_distance = (target - view).abs();
            }
            assert!(last_distance < (100.0f32 - target).abs());
        }
    }

    #[test]
    fn smoothing_scales_with_multiplier_and_saturates() {
        let base = 0.1;
        assert!(smoothing_factor(base, 4.0) > smoothing_factor(base, 1.0));
        assert_eq!(smoothing_factor(base, 10_000.0), 1.0);
    }

    #[test]
    fn cluster_centroid_finds_the_dense_group() {
        // 12 tightly packed near -400, 10 scattered stragglers far apart
        let mut ys: Vec<f32> = (0..12).map(|i| -400.0 + i as f32 * 0.5).collect();
        ys.extend((0..10).map(|i| -3000.0 + i as f32 * 150.0));
        let centroid = cluster_window_centroid(&mut ys).unwrap();
        assert!(
            (-405.0..=-395.0).contains(&centroid),
            "expected the packed group, got {centroid}"
        );
    }

    #[test]
    fn cluster_centroid_handles_small_fields() {
        assert_eq!(cluster_window_centroid(&mut Vec::new()), None);
        let mut three = vec![-10.0, -20.0, -30.0];
        let c = cluster_window_centroid(&mut three).unwrap();
        assert!((c + 20.0).abs() < 1e-4);
    }
}
