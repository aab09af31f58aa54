//! Core simulation module
//!
//! Contains the Simulation driver, its clock, per-tick frame, command and
//! event queues, debug overlay and scenario files

mod commands;
mod debug;
mod events;
mod frame;
mod scenario;
mod simulation;
mod time;

pub use commands::{Command, CommandBuffer};
pub use debug::{CastGizmo, DebugDraw, DebugOverlay};
pub use events::{EventQueue, GameEvent};
pub use frame::Frame;
pub use scenario::{Blueprint, BlueprintKind, Scenario};
pub use simulation::{SimConfig, Simulation};
pub use time::Time;
