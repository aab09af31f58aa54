//! Common ECS components

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::CategoryMask;

/// Transform component for position and rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a transform at `position` facing along `direction`
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let rotation = direction
            .try_normalize()
            .map_or(Quat::IDENTITY, |dir| Quat::from_rotation_arc(Vec3::NEG_Z, dir));
        Self { position, rotation }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Distance between two transforms
    pub fn distance(&self, other: &Transform) -> f32 {
        self.position.distance(other.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Velocity component written by locomotion
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What an entity is, resolved once at spawn.
///
/// Perception reads this instead of probing entities for facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled character
    Player,
    /// Autonomous creature of a species
    Mob { species: String },
    /// Scenery, targets, destructibles
    Prop,
}

impl EntityKind {
    /// Prey-list name reserved for players
    pub const PLAYER_TAG: &'static str = "Player";

    /// Spatial category bit of this kind
    pub fn category(&self) -> CategoryMask {
        match self {
            Self::Player => CategoryMask::PLAYER,
            Self::Mob { .. } => CategoryMask::MOB,
            Self::Prop => CategoryMask::PROP,
        }
    }

    /// Name used in prey lists: `"Player"` or the mob's species
    pub fn type_name(&self) -> &str {
        match self {
            Self::Player => Self::PLAYER_TAG,
            Self::Mob { species } => species,
            Self::Prop => "Prop",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Collision volume registered with the spatial index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Capsule { half_height: f32, radius: f32 },
}

impl Default for BodyShape {
    fn default() -> Self {
        Self::Capsule {
            half_height: 0.5,
            radius: 0.4,
        }
    }
}

/// Marks an entity as detectable by casts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub shape: BodyShape,
    pub category: CategoryMask,
}
