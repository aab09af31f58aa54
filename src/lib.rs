//! A headless creature simulation built in Rust
//!
//! This crate provides:
//! - Keyed, pull-based finite state machines
//! - Shape-cast spatial queries with rapier3d
//! - Mob behavior: wandering, patrols, predator/prey chases and flight
//! - Player abilities: projectiles, instant casts and click-to-target
//! - Entity Component System (ECS) architecture with hecs

pub mod ability;
pub mod ai;
pub mod core;
pub mod ecs;
pub mod error;
pub mod input;
pub mod mob;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ability::{AbilityDefinition, AbilityEffect, AbilityStateKey};
    pub use crate::ai::{State, StateKey, StateMachine};
    pub use crate::core::{Blueprint, BlueprintKind, GameEvent, Scenario, SimConfig, Simulation};
    pub use crate::ecs::{Attributes, BodyShape, EntityKind, Name, Transform, Velocity, World};
    pub use crate::error::{ConfigError, SimError};
    pub use crate::input::{Input, InputAction};
    pub use crate::mob::{Hunt, MobProfile, MobStateKey};
    pub use crate::physics::{Cast, CastKind, CategoryMask, SpatialIndex};
    pub use glam::{Quat, Vec3};
}
