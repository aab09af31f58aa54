//! Per-tick view of the simulation shared by every state context

use hecs::Entity;
use rand::rngs::StdRng;

use crate::core::{Command, CommandBuffer, DebugOverlay, EventQueue, GameEvent, Time};
use crate::ecs::{Transform, World};
use crate::input::Input;
use crate::physics::{Cast, Detection, SpatialIndex};

/// Borrowed simulation services for one tick.
///
/// The world and spatial index are read-only: writes to other entities go
/// through `commands` and are applied after every machine has ticked.
pub struct Frame<'w> {
    pub world: &'w World,
    pub spatial: &'w SpatialIndex,
    pub time: &'w Time,
    pub input: &'w Input,
    pub rng: &'w mut StdRng,
    pub commands: &'w mut CommandBuffer,
    pub events: &'w mut EventQueue,
    pub debug: &'w mut DebugOverlay,
}

impl Frame<'_> {
    /// Shorter-lived copy, for building one entity's context
    pub fn reborrow(&mut self) -> Frame<'_> {
        Frame {
            world: self.world,
            spatial: self.spatial,
            time: self.time,
            input: self.input,
            rng: &mut *self.rng,
            commands: &mut *self.commands,
            events: &mut *self.events,
            debug: &mut *self.debug,
        }
    }

    /// Length of this tick in seconds
    pub fn dt(&self) -> f32 {
        self.time.delta_seconds()
    }

    /// Simulated seconds at the start of this tick
    pub fn now(&self) -> f64 {
        self.time.elapsed_seconds()
    }

    /// Run a cast, reporting it to the debug overlay when enabled
    pub fn detect(&mut self, origin: &Transform, cast: &Cast, exclude: Option<Entity>) -> Detection {
        if self.debug.enabled {
            self.spatial
                .detect_traced(origin, cast, exclude, &mut *self.debug)
        } else {
            self.spatial.detect(origin, cast, exclude)
        }
    }

    pub fn command(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Queue an animation cue for `entity`
    pub fn animate(&mut self, entity: Entity, name: &'static str) {
        self.events.push(GameEvent::AnimationTrigger { entity, name });
    }
}
