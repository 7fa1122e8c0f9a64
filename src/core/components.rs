use bevy::prelude::*;
use bevy_rapier2d::prelude::{CollisionGroups, Group};

/// Marker component identifying a marble entity (holds physics body & collider).
#[derive(Component)]
pub struct Marble;

/// Logical radius used both for the collider and the metaball field.
#[derive(Component, Debug, Deref, DerefMut, Copy, Clone)]
pub struct MarbleRadius(pub f32);

/// Cosmetic species assigned by fair coin at spawn. Selects the shader gradient
/// and nothing else.
#[derive(Component, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Species {
    Water,
    Lava,
}

impl Species {
    /// Flag encoding used in the GPU marble buffer (w channel).
    pub fn flag(self) -> f32 {
        match self {
            Species::Water => 1.0,
            Species::Lava => 0.0,
        }
    }
}

/// Restitution chosen at spawn. Never mutated afterwards; the settling system
/// copies it back into the live `Restitution` once a marble leaves the catch
/// platform.
#[derive(Component, Debug, Copy, Clone)]
pub struct SpawnRestitution(pub f32);

// =====================================================================================
// Collision categories
// Every non-static body belongs to exactly one membership group; its filter decides
// what it can hit. Sensors never impede motion (Sensor component), they only report.
// =====================================================================================

/// Static course geometry: walls, ramps, spikes, platforms, pegs, belts.
pub const GROUP_WORLD: Group = Group::GROUP_1;
/// Racing marbles.
pub const GROUP_MARBLE: Group = Group::GROUP_2;
/// Jointed / kinematic obstacles: spinner bars, cradle bobs, flippers, moving pegs.
pub const GROUP_KINETIC: Group = Group::GROUP_3;
/// Non-impeding sensor regions: wind zones, layer separators.
pub const GROUP_SENSOR: Group = Group::GROUP_4;

pub fn marble_collision_groups() -> CollisionGroups {
    CollisionGroups::new(
        GROUP_MARBLE,
        GROUP_WORLD | GROUP_MARBLE | GROUP_KINETIC | GROUP_SENSOR,
    )
}

pub fn world_collision_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_WORLD, GROUP_MARBLE | GROUP_KINETIC)
}

pub fn kinetic_collision_groups() -> CollisionGroups {
    // kinetic-kinetic stays on so cradle bobs carry momentum through the row
    CollisionGroups::new(GROUP_KINETIC, GROUP_MARBLE | GROUP_WORLD | GROUP_KINETIC)
}

pub fn sensor_collision_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_SENSOR, GROUP_MARBLE)
}

// =====================================================================================
// Obstacle runtime components (attached by course spawning)
// =====================================================================================

/// Pinned spinner bar; keeps its initial angular velocity.
#[derive(Component, Debug, Copy, Clone)]
pub struct Spinner {
    pub spin: f32,
}

/// Conveyor belt surface. Riders receive a horizontal force from the signed speed.
#[derive(Component, Debug, Copy, Clone)]
pub struct ConveyorBelt {
    pub speed: f32,
}

/// Invisible force region. The attached collider is a sensor; any marble inside
/// receives `force` scaled by the global speed multiplier.
#[derive(Component, Debug, Copy, Clone)]
pub struct WindZone {
    pub force: Vec2,
}

/// Horizontal oscillation for the main wind zone and animated plinko pegs.
#[derive(Component, Debug, Copy, Clone)]
pub struct Oscillator {
    pub origin: Vec2,
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillator {
    pub fn position_at(&self, t: f32) -> Vec2 {
        let dx = self.amplitude * (std::f32::consts::TAU * self.frequency * t + self.phase).sin();
        Vec2::new(self.origin.x + dx, self.origin.y)
    }
}

/// Roaming wind zone drift; reflected off course bounds and obstacle footprints.
#[derive(Component, Debug, Copy, Clone)]
pub struct Roamer {
    pub velocity: Vec2,
}

/// One bob of a Newton's cradle.
#[derive(Component, Debug, Copy, Clone)]
pub struct CradleBob;

/// Cradle controller: kicks the first bob every `interval`.
#[derive(Component, Debug)]
pub struct Cradle {
    pub bobs: Vec<Entity>,
    pub timer: Timer,
    pub impulse: f32,
}

/// Flipper bar driven by its revolute joint motor, reversing every half period.
#[derive(Component, Debug)]
pub struct Flipper {
    pub timer: Timer,
    pub raised: bool,
    pub motor_speed: f32,
}

/// Between-layer sensor strip; purely for operator/visual calibration.
#[derive(Component, Debug, Copy, Clone)]
pub struct LayerSeparator;
