//! Player abilities
//!
//! An [`AbilityHolder`] component carries the held [`AbilityDefinition`]
//! and a three-state machine (Ready, Casting, Launching). Hits are found
//! with the spatial index and effects are queued as commands.

mod definition;
mod holder;
mod states;
mod system;

pub use definition::{AbilityDefinition, AbilityEffect, Dispatch};
pub use holder::{AbilityHolder, AbilitySlot, Resolution};
pub use states::{
    AbilityContext, AbilityMachine, AbilityState, AbilityStateKey, CastingState, LaunchingState,
    ReadyState, ability_machine,
};
pub use system::update_abilities;
