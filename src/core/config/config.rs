use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Marble Race".into(),
            auto_close: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GravityConfig {
    pub y: f32,
}
impl Default for GravityConfig {
    fn default() -> Self {
        Self { y: -900.0 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnRange<T> {
    pub min: T,
    pub max: T,
}
impl<T: Default> Default for SpawnRange<T> {
    fn default() -> Self {
        Self {
            min: Default::default(),
            max: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarbleSpawnConfig {
    /// Seconds between marbles while the spawn window is open. Sub-frame
    /// intervals are honored by spawning several marbles per frame.
    pub interval: f32,
    /// Seconds of spawning after the race starts.
    pub window: f32,
    pub radius_range: SpawnRange<f32>,
    pub restitution_range: SpawnRange<f32>,
    pub air_damping_range: SpawnRange<f32>,
    pub density_range: SpawnRange<f32>,
    pub friction: f32,
}
impl Default for MarbleSpawnConfig {
    fn default() -> Self {
        Self {
            interval: 0.002,
            window: 10.0,
            radius_range: SpawnRange { min: 6.0, max: 10.0 },
            restitution_range: SpawnRange { min: 0.35, max: 0.65 },
            air_damping_range: SpawnRange { min: 0.0, max: 0.02 },
            density_range: SpawnRange { min: 0.8, max: 1.2 },
            friction: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CourseConfig {
    /// Corridor iterations = multiplier * 10.
    pub corridor_multiplier: u32,
    pub ramp_height_range: SpawnRange<f32>,
    pub spike_gap_range: SpawnRange<f32>,
    /// Vertical height of each obstacle layer band.
    pub layer_height: f32,
    /// Number of layer bands between corridor and finish.
    pub layer_count: u32,
    /// Bounded rejection-sampling budget per obstacle instance.
    pub placement_attempts: u32,
    /// Horizontal margin kept clear along both walls.
    pub track_margin: f32,
    pub finish_platforms: u32,
}
impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            corridor_multiplier: 1,
            ramp_height_range: SpawnRange { min: 400.0, max: 1200.0 },
            spike_gap_range: SpawnRange { min: 150.0, max: 400.0 },
            layer_height: 600.0,
            layer_count: 7,
            placement_attempts: 50,
            track_margin: 40.0,
            finish_platforms: 6,
        }
    }
}

/// Driver thresholds carried as configuration; the stuck and ceiling values are
/// device-tuned constants with no derivation beyond playtesting.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Minimum movement (px) that counts as progress for stuck detection.
    pub stuck_distance: f32,
    /// Seconds without progress before a marble is teleported.
    pub stuck_timeout: f32,
    /// Down-course teleport distance (px).
    pub teleport_drop: f32,
    /// Speeds between soft and hard ceiling are proportionally damped.
    pub soft_speed_ceiling: f32,
    /// Speeds above this are rescaled down to it.
    pub hard_speed_ceiling: f32,
    /// Fraction of the over-soft excess removed per frame.
    pub soft_damping: f32,
    /// Below this speed a marble on the catch platform is considered settled.
    pub settle_speed: f32,
    /// Active wake band: view height multiples kept awake above and below view.
    pub wake_band_viewports: f32,
    /// Spatial grid cell size (px) for the driver's own broad-phase.
    pub grid_cell: f32,
    /// Horizontal force per unit of belt speed applied to conveyor riders.
    pub conveyor_force_scale: f32,
}
impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            stuck_distance: 5.0,
            stuck_timeout: 3.0,
            teleport_drop: 50.0,
            soft_speed_ceiling: 1200.0,
            hard_speed_ceiling: 2000.0,
            soft_damping: 0.5,
            settle_speed: 1.0,
            wake_band_viewports: 1.0,
            grid_cell: 256.0,
            conveyor_force_scale: 40.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    pub initial: f32,
    pub min: f32,
    pub max: f32,
}
impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 1.0,
            max: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Base smoothing factor; effective factor is min(1, base * sqrt(multiplier)).
    pub smoothing_base: f32,
    /// World-to-screen zoom for the field renderer; must stay > 1.
    pub view_zoom: f32,
    /// Manual wheel scroll speed (px per wheel line).
    pub scroll_speed: f32,
}
impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            smoothing_base: 0.1,
            view_zoom: 1.4,
            scroll_speed: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetaballsConfig {
    /// Field threshold above which a pixel is inside the surface.
    pub threshold: f32,
    /// Spatial scale of the color noise.
    pub noise_scale: f32,
    /// Time scale of the color noise animation.
    pub noise_time_scale: f32,
}
impl Default for MetaballsConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            noise_scale: 0.005,
            noise_time_scale: 0.0125,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindConfig {
    /// Up-course force of the main oscillating zone.
    pub main_force: f32,
    pub main_half_width: f32,
    pub main_half_height: f32,
    pub main_amplitude: f32,
    pub main_frequency: f32,
    /// Extra roaming zones; zero disables them.
    pub roaming_count: u32,
    pub roaming_force: f32,
    pub roaming_speed: f32,
}
impl Default for WindConfig {
    fn default() -> Self {
        Self {
            main_force: 1600.0,
            main_half_width: 140.0,
            main_half_height: 90.0,
            main_amplitude: 220.0,
            main_frequency: 0.08,
            roaming_count: 2,
            roaming_force: 900.0,
            roaming_speed: 70.0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub gravity: GravityConfig,
    pub spawn: MarbleSpawnConfig,
    pub course: CourseConfig,
    pub driver: DriverConfig,
    pub speed: SpeedConfig,
    pub camera: CameraConfig,
    pub metaballs: MetaballsConfig,
    pub wind: WindConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.gravity.y >= 0.0 {
            w.push(format!(
                "gravity.y is non-negative ({}); marbles will not fall",
                self.gravity.y
            ));
        }
        if self.spawn.interval <= 0.0 {
            w.push("spawn.interval must be > 0".into());
        }
        if self.spawn.radius_range.min <= 0.0 {
            w.push("spawn.radius_range.min must be > 0".into());
        }
        fn check_range(w: &mut Vec<String>, label: &str, r: &SpawnRange<f32>) {
            if r.min > r.max {
                w.push(format!("{label} min ({}) greater than max ({})", r.min, r.max));
            }
        }
        check_range(&mut w, "spawn.radius_range", &self.spawn.radius_range);
        check_range(&mut w, "spawn.restitution_range", &self.spawn.restitution_range);
        check_range(&mut w, "spawn.air_damping_range", &self.spawn.air_damping_range);
        check_range(&mut w, "spawn.density_range", &self.spawn.density_range);
        check_range(&mut w, "course.ramp_height_range", &self.course.ramp_height_range);
        check_range(&mut w, "course.spike_gap_range", &self.course.spike_gap_range);
        if self.course.placement_attempts == 0 {
            w.push("course.placement_attempts is 0; every layered obstacle will be skipped".into());
        }
        if self.driver.soft_speed_ceiling > self.driver.hard_speed_ceiling {
            w.push(format!(
                "driver soft ceiling {} above hard ceiling {}",
                self.driver.soft_speed_ceiling, self.driver.hard_speed_ceiling
            ));
        }
        if !(0.0..=1.0).contains(&self.driver.soft_damping) {
            w.push(format!("driver.soft_damping {} outside 0..1", self.driver.soft_damping));
        }
        if self.speed.min < 1.0 || self.speed.max < self.speed.min {
            w.push(format!(
                "speed range [{}, {}] invalid; expected 1 <= min <= max",
                self.speed.min, self.speed.max
            ));
        }
        if self.camera.view_zoom <= 1.0 {
            w.push(format!(
                "camera.view_zoom {} should be > 1 (field is rendered zoomed in)",
                self.camera.view_zoom
            ));
        }
        if !(0.0..=1.0).contains(&self.camera.smoothing_base) {
            w.push(format!(
                "camera.smoothing_base {} outside 0..1; view easing would overshoot",
                self.camera.smoothing_base
            ));
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate_clean() {
        let cfg = GameConfig::default();
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "default config warned: {warnings:?}");
    }

    #[test]
    fn partial_ron_overrides_merge_with_defaults() {
        let cfg: GameConfig =
            ron::from_str("(speed: (max: 5.0), driver: (stuck_timeout: 2.0))").unwrap();
        assert_eq!(cfg.speed.max, 5.0);
        assert_eq!(cfg.driver.stuck_timeout, 2.0);
        // untouched sections keep defaults
        assert_eq!(cfg.spawn.window, 10.0);
        assert_eq!(cfg.course.layer_count, 7);
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let (cfg, err) = GameConfig::load_or_default("definitely/not/here.ron");
        assert!(err.is_some());
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn load_from_file_round_trip() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "(window: (width: 999.0), camera: (view_zoom: 2.0))").unwrap();
        let cfg = GameConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.window.width, 999.0);
        assert_eq!(cfg.camera.view_zoom, 2.0);
    }

    #[test]
    fn validate_flags_inverted_ceilings() {
        let mut cfg = GameConfig::default();
        cfg.driver.soft_speed_ceiling = 3000.0;
        assert!(cfg.validate().iter().any(|w| w.contains("soft ceiling")));
    }
}
