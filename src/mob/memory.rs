//! Per-mob runtime memory shared by the behavior states

use glam::Vec3;
use hecs::Entity;

/// The single pursuit a mob may have at a time.
///
/// A mob hunts either a player or another mob, never both, so the two
/// targets live in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hunt {
    Player(Entity),
    Prey(Entity),
}

impl Hunt {
    /// Entity being pursued
    #[must_use]
    pub fn target(self) -> Entity {
        match self {
            Self::Player(e) | Self::Prey(e) => e,
        }
    }

    #[must_use]
    pub fn is_player(self) -> bool {
        matches!(self, Self::Player(_))
    }
}

/// Rate limit on bites.
///
/// A bite is allowed when none happened yet, or when at least `cooldown`
/// seconds passed since the last one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiteCooldown {
    last_bite_at: Option<f64>,
}

impl BiteCooldown {
    /// Whether a bite at `now` is allowed
    #[must_use]
    pub fn ready(&self, now: f64, cooldown: f32) -> bool {
        self.last_bite_at
            .is_none_or(|last| now - last >= f64::from(cooldown))
    }

    /// Record a bite at `now` if allowed
    pub fn try_bite(&mut self, now: f64, cooldown: f32) -> bool {
        if self.ready(now, cooldown) {
            self.last_bite_at = Some(now);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn last_bite_at(&self) -> Option<f64> {
        self.last_bite_at
    }
}

/// Mutable per-mob values read and written by its states.
#[derive(Debug, Clone, Default)]
pub struct MobMemory {
    hunt: Option<Hunt>,
    /// Mob currently hunting this one
    pub predator: Option<Entity>,
    /// Seconds spent in the current Idle stay
    pub idle_elapsed: f32,
    pub bite: BiteCooldown,
    /// Next patrol point to visit
    pub patrol_index: usize,
    /// Entity touching this mob's contact volume
    pub contact: Option<Entity>,
}

impl MobMemory {
    #[must_use]
    pub fn hunt(&self) -> Option<Hunt> {
        self.hunt
    }

    /// Player currently hunted
    #[must_use]
    pub fn current_player_target(&self) -> Option<Entity> {
        match self.hunt {
            Some(Hunt::Player(e)) => Some(e),
            _ => None,
        }
    }

    /// Mob currently hunted
    #[must_use]
    pub fn current_chase_target(&self) -> Option<Entity> {
        match self.hunt {
            Some(Hunt::Prey(e)) => Some(e),
            _ => None,
        }
    }

    /// Lock onto a player, replacing any prey
    pub fn lock_player(&mut self, player: Entity) {
        self.hunt = Some(Hunt::Player(player));
    }

    /// Lock onto a mob, replacing any player
    pub fn lock_prey(&mut self, prey: Entity) {
        self.hunt = Some(Hunt::Prey(prey));
    }

    /// Drop the current hunt
    pub fn clear_hunt(&mut self) -> Option<Hunt> {
        self.contact = None;
        self.hunt.take()
    }

    /// Whether the mob is hunting or being hunted
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.hunt.is_some() || self.predator.is_some()
    }

    /// Next patrol point, advancing the cursor
    pub fn next_patrol_point(&mut self, points: &[Vec3]) -> Option<Vec3> {
        if points.is_empty() {
            return None;
        }
        let point = points[self.patrol_index % points.len()];
        self.patrol_index = (self.patrol_index + 1) % points.len();
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> (Entity, Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    #[test]
    fn test_bite_cooldown() {
        let mut bite = BiteCooldown::default();

        assert!(bite.try_bite(0.0, 1.0));
        assert!(!bite.try_bite(0.5, 1.0));
        assert!(bite.try_bite(1.1, 1.0));
        assert_eq!(bite.last_bite_at(), Some(1.1));
    }

    #[test]
    fn test_bite_cooldown_late_in_a_long_run() {
        // Ten hours in, where a single-precision clock no longer resolves
        // sub-millisecond steps
        let start = 36_000.0;
        let mut bite = BiteCooldown::default();

        assert!(bite.try_bite(start, 0.25));
        assert!(!bite.try_bite(start + 0.2, 0.25));
        assert!(bite.try_bite(start + 0.25, 0.25));
    }

    #[test]
    fn test_single_hunt() {
        let (player, rabbit) = entities();
        let mut memory = MobMemory::default();

        memory.lock_prey(rabbit);
        memory.lock_player(player);

        assert_eq!(memory.current_player_target(), Some(player));
        assert_eq!(memory.current_chase_target(), None);

        assert_eq!(memory.clear_hunt(), Some(Hunt::Player(player)));
        assert!(!memory.is_engaged());
    }

    #[test]
    fn test_patrol_points_cycle() {
        let points = [Vec3::X, Vec3::Z];
        let mut memory = MobMemory::default();

        assert_eq!(memory.next_patrol_point(&points), Some(Vec3::X));
        assert_eq!(memory.next_patrol_point(&points), Some(Vec3::Z));
        assert_eq!(memory.next_patrol_point(&points), Some(Vec3::X));
        assert_eq!(memory.next_patrol_point(&[]), None);
    }
}
