//! Event Queue for the Presentation Layer
//!
//! Behavior states report what happened (state changes, animation cues,
//! damage, ability resolutions) through a double-buffered queue. The
//! simulation swaps buffers at the end of each tick, so after `tick()`
//! returns the queue exposes exactly the events of that tick.
//!
//! # Example
//!
//! ```ignore
//! sim.tick(dt);
//! for event in sim.events.iter() {
//!     if let GameEvent::StateChanged { entity, to, .. } = event {
//!         animator.play(*entity, to);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

// ============================================================================
// Event Types
// ============================================================================

/// Simulation events consumed by presentation (animation, UI, audio).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Behavior Events
    // -------------------------------------------------------------------------
    /// A state machine switched its active state.
    StateChanged {
        entity: Entity,
        /// Machine label ("mob", "ability")
        machine: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// A state asked for an animation cue.
    AnimationTrigger { entity: Entity, name: &'static str },

    /// A mob locked onto a target.
    TargetAcquired {
        hunter: Entity,
        target: Entity,
        /// Whether the target is a player
        player: bool,
    },

    /// A mob dropped its target (timeout, death, or escape).
    TargetLost { hunter: Entity, target: Entity },

    // -------------------------------------------------------------------------
    // Combat Events
    // -------------------------------------------------------------------------
    /// An entity took damage.
    EntityDamaged {
        entity: Entity,
        /// Amount of damage actually dealt
        amount: f32,
        source: Option<Entity>,
    },

    /// An entity was healed.
    EntityHealed {
        entity: Entity,
        amount: f32,
        source: Option<Entity>,
    },

    /// An entity ran out of health and was removed.
    EntityDestroyed {
        entity: Entity,
        destroyer: Option<Entity>,
    },

    /// An ability applied its effect.
    AbilityResolved {
        caster: Entity,
        /// Where the effect was applied
        position: Vec3,
        /// Number of entities affected
        hits: usize,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed during a tick become readable after the next `swap()`.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events of the last completed tick
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be published at the next swap.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Publish pending events and start a fresh pending buffer.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over published events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Drain all published events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any published events.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of published events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events waiting for the next swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and published).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity() -> Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        queue.push(GameEvent::AnimationTrigger {
            entity,
            name: "Bite",
        });
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            queue.iter().next(),
            Some(GameEvent::AnimationTrigger { name: "Bite", .. })
        ));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        queue.push(GameEvent::EntityDamaged {
            entity,
            amount: 1.0,
            source: None,
        });
        queue.swap();

        queue.push(GameEvent::EntityDamaged {
            entity,
            amount: 2.0,
            source: None,
        });

        let amounts: Vec<f32> = queue
            .iter()
            .filter_map(|event| match event {
                GameEvent::EntityDamaged { amount, .. } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![1.0]);

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_event_queue_drain_and_clear() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        queue.push(GameEvent::TargetLost {
            hunter: entity,
            target: entity,
        });
        queue.push(GameEvent::EntityDestroyed {
            entity,
            destroyer: None,
        });
        queue.swap();

        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());

        queue.push(GameEvent::AnimationTrigger {
            entity,
            name: "Idle",
        });
        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
