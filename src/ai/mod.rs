//! AI module
//!
//! Provides the keyed finite state machine and the locomotion collaborator
//! behavior states drive.

mod fsm;
mod locomotion;

pub use fsm::{
    FsmError, State, StateKey, StateMachine, StateMachineBuilder, Transition, TriggerPhase,
};
pub use locomotion::{
    Arrive, Flee, Locomotion, SteeringAgent, SteeringBehavior, SteeringOutput,
};
