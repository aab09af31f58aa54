//! Autonomous mob behavior
//!
//! Each mob carries a [`MobBrain`]: a static [`MobProfile`], runtime
//! [`MobMemory`] and a four-state machine (Idle, Moving, Patrol, Chasing).
//! Perception runs before the machine ticks, while a perceiving state is
//! active.

mod brain;
mod context;
mod memory;
mod perception;
mod profile;
mod states;

pub use brain::{MobBrain, dispatch_trigger, update_mobs};
pub use context::MobContext;
pub use memory::{BiteCooldown, Hunt, MobMemory};
pub use perception::check_chase_conditions;
pub use profile::MobProfile;
pub use states::{ChasingState, IdleState, MobMachine, MobState, MobStateKey, WalkState, mob_machine};
