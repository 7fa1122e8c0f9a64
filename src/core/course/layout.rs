//! Course data model: the generator produces a [`CourseSpec`] value once; the
//! spawner instantiates it into physics bodies and never mutates it afterwards.

use bevy::prelude::*;

// =====================================================================================
// Geometry helpers
// =====================================================================================

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Collision shape of a static course part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartShape {
    Cuboid { hx: f32, hy: f32 },
    Circle { r: f32 },
    /// Counter-clockwise triangle, vertices relative to the part position.
    Triangle { a: Vec2, b: Vec2, c: Vec2 },
}

/// What a static part is, for friction/restitution selection and debug draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Wall,
    Ramp,
    Spike,
    Platform,
    FunnelWall,
    Peg,
    Belt,
    FinishSlope,
    CatchPlatform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPart {
    pub kind: PartKind,
    pub pos: Vec2,
    pub rot: f32,
    pub shape: PartShape,
}

impl StaticPart {
    pub fn aabb(&self) -> Aabb2 {
        match self.shape {
            PartShape::Circle { r } => Aabb2::from_center(self.pos, Vec2::splat(r)),
            PartShape::Cuboid { hx, hy } => {
                // extent of a rotated box projected on each axis
                let (s, c) = self.rot.sin_cos();
                let ex = hx * c.abs() + hy * s.abs();
                let ey = hx * s.abs() + hy * c.abs();
                Aabb2::from_center(self.pos, Vec2::new(ex, ey))
            }
            PartShape::Triangle { a, b, c } => {
                let rot = Vec2::from_angle(self.rot);
                let pts = [a, b, c].map(|p| self.pos + rot.rotate(p));
                let mut min = pts[0];
                let mut max = pts[0];
                for p in &pts[1..] {
                    min = min.min(*p);
                    max = max.max(*p);
                }
                Aabb2::new(min, max)
            }
        }
    }
}

// =====================================================================================
// Obstacle archetype specs (runtime lists needed by the driver)
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinnerSpec {
    pub pos: Vec2,
    pub half_length: f32,
    pub half_thickness: f32,
    /// Initial angular velocity (rad/s), sign picks direction.
    pub spin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CradleSpec {
    /// Center of the anchor rail.
    pub anchor: Vec2,
    pub bobs: u32,
    pub rope_length: f32,
    pub bob_radius: f32,
    /// Seconds between impulse kicks to the first bob.
    pub interval: f32,
    pub impulse: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipperSpec {
    /// Pivot position.
    pub pivot: Vec2,
    pub half_length: f32,
    pub half_thickness: f32,
    /// Seconds for a full up/down cycle.
    pub period: f32,
    /// +1 flips counter-clockwise first (left flipper), -1 the mirror.
    pub direction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConveyorSpec {
    pub pos: Vec2,
    pub half_length: f32,
    pub half_thickness: f32,
    /// Signed surface speed; sign is the drive direction.
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillationSpec {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PegSpec {
    pub pos: Vec2,
    pub radius: f32,
    /// Some pegs sweep horizontally around their origin.
    pub oscillation: Option<OscillationSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindMotion {
    /// The main zone oscillates horizontally forever.
    Oscillate { amplitude: f32, frequency: f32 },
    /// Roaming zones drift and deflect off bounds and obstacle footprints.
    Roam { velocity: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindZoneSpec {
    pub pos: Vec2,
    pub half: Vec2,
    pub force: Vec2,
    pub motion: WindMotion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparatorSpec {
    pub y: f32,
    pub half_width: f32,
}

// =====================================================================================
// Layer bookkeeping
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleArchetype {
    Platform,
    Spinner,
    Funnel,
    Plinko,
    Cradle,
    Flipper,
    Conveyor,
}

impl ObstacleArchetype {
    pub const ALL: [Self; 7] = [
        Self::Platform,
        Self::Spinner,
        Self::Funnel,
        Self::Plinko,
        Self::Cradle,
        Self::Flipper,
        Self::Conveyor,
    ];

    /// Target instance count per layer for this archetype.
    pub fn target_count(self) -> u32 {
        match self {
            Self::Platform => 5,
            Self::Spinner => 3,
            Self::Funnel => 2,
            Self::Plinko => 1,
            Self::Cradle => 1,
            Self::Flipper => 2,
            Self::Conveyor => 3,
        }
    }
}

/// A vertical band of the course populated with one obstacle archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerInfo {
    pub y_top: f32,
    pub y_bottom: f32,
    pub archetype: ObstacleArchetype,
    pub target: u32,
    pub placed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishInfo {
    /// Where the finish chute begins; stuck recovery stops below this line.
    pub start_y: f32,
    /// Y of the final flat catch platform surface.
    pub final_platform_y: f32,
    pub final_platform_half_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub half_width: f32,
    /// Spawn line.
    pub top: f32,
    /// Bottom of the catch platform.
    pub bottom: f32,
}

// =====================================================================================
// The full course
// =====================================================================================

#[derive(Debug, Clone, Default)]
pub struct CourseSpec {
    pub statics: Vec<StaticPart>,
    pub spinners: Vec<SpinnerSpec>,
    pub cradles: Vec<CradleSpec>,
    pub flippers: Vec<FlipperSpec>,
    pub conveyors: Vec<ConveyorSpec>,
    pub pegs: Vec<PegSpec>,
    pub wind_zones: Vec<WindZoneSpec>,
    pub separators: Vec<SeparatorSpec>,
    pub layers: Vec<LayerInfo>,
    /// One footprint per committed obstacle instance (corridor, finish and
    /// layered). Placement rejects overlaps against this list; tests assert
    /// pairwise disjointness; roaming wind zones deflect off it.
    pub obstacle_footprints: Vec<Aabb2>,
    pub finish: FinishInfo,
    pub bounds: WorldBounds,
}

impl Default for FinishInfo {
    fn default() -> Self {
        Self {
            start_y: 0.0,
            final_platform_y: 0.0,
            final_platform_half_width: 0.0,
        }
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            half_width: 0.0,
            top: 0.0,
            bottom: 0.0,
        }
    }
}

/// Resource wrapper; inserted once after generation.
#[derive(Resource, Debug, Clone)]
pub struct Course(pub CourseSpec);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_cuboid_aabb_covers_corners() {
        let part = StaticPart {
            kind: PartKind::Ramp,
            pos: Vec2::new(10.0, -20.0),
            rot: std::f32::consts::FRAC_PI_4,
            shape: PartShape::Cuboid { hx: 100.0, hy: 10.0 },
        };
        let bb = part.aabb();
        // at 45 degrees both extents are (hx + hy) / sqrt(2)
        let expect = (100.0 + 10.0) / std::f32::consts::SQRT_2;
        assert!((bb.max.x - part.pos.x - expect).abs() < 1e-3);
        assert!((bb.max.y - part.pos.y - expect).abs() < 1e-3);
    }

    #[test]
    fn triangle_aabb_respects_rotation() {
        let part = StaticPart {
            kind: PartKind::Spike,
            pos: Vec2::ZERO,
            rot: std::f32::consts::FRAC_PI_2,
            shape: PartShape::Triangle {
                a: Vec2::new(-10.0, 0.0),
                b: Vec2::new(10.0, 0.0),
                c: Vec2::new(0.0, 30.0),
            },
        };
        let bb = part.aabb();
        // the 30-high apex now points along -x
        assert!(bb.min.x < -29.0);
        assert!(bb.max.y - 10.0 < 1e-3);
    }

    #[test]
    fn aabb_intersection_is_strict() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let touching = Aabb2::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let overlapping = Aabb2::new(Vec2::new(9.0, 9.0), Vec2::new(12.0, 12.0));
        assert!(!a.intersects(&touching), "edge contact is not overlap");
        assert!(a.intersects(&overlapping));
    }
}
