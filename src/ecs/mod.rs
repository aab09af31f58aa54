//! Entity Component System module
//!
//! Built on top of the hecs ECS library. Generational entity handles double
//! as the weak references behavior states keep to other entities.

mod attributes;
mod components;
mod world;

pub use attributes::{Attribute, AttributeKind, Attributes};
pub use components::{Body, BodyShape, EntityKind, Name, Transform, Velocity};
pub use world::World;
