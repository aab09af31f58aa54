//! Spatial query module
//!
//! Built on top of rapier3d

mod cast;
mod spatial;
mod trigger;

pub use cast::{Cast, CastError, CastKind, CategoryMask};
pub use spatial::{Detection, SpatialIndex};
pub use trigger::{TriggerEvent, TriggerVolume};
