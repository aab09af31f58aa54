//! Input handling module
//!
//! Tracks logical actions and the camera/cursor the player aims with.

mod state;

pub use state::{Input, InputAction};
