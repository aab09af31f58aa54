//! Deferred cross-entity writes
//!
//! A state may only mutate its own entity directly. Anything that touches
//! another entity is queued here and applied by the simulation once every
//! machine has ticked.

use hecs::Entity;

/// A write against another entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Remove health from `target`
    Damage {
        target: Entity,
        amount: f32,
        source: Option<Entity>,
    },
    /// Restore health to `target`
    Heal {
        target: Entity,
        amount: f32,
        source: Option<Entity>,
    },
    /// Tell a mob it is being hunted
    NotifyPredator { prey: Entity, predator: Entity },
}

impl Command {
    /// Entity the command is applied to
    #[must_use]
    pub fn target(&self) -> Entity {
        match *self {
            Self::Damage { target, .. } | Self::Heal { target, .. } => target,
            Self::NotifyPredator { prey, .. } => prey,
        }
    }
}

/// Commands queued during one tick.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Take every queued command, in push order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands, in push order
    #[must_use]
    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());

        let mut buffer = CommandBuffer::new();
        buffer.push(Command::Damage {
            target: a,
            amount: 3.0,
            source: Some(b),
        });
        buffer.push(Command::NotifyPredator {
            prey: b,
            predator: a,
        });

        let targets: Vec<Entity> = buffer.drain().map(|c| c.target()).collect();
        assert_eq!(targets, vec![a, b]);
        assert!(buffer.is_empty());
    }
}
