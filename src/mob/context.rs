//! Borrowed view of one mob handed to its states

use glam::Vec3;
use hecs::Entity;

use crate::ai::Locomotion;
use crate::core::{Frame, GameEvent};
use crate::ecs::{AttributeKind, Attributes, Transform};
use crate::physics::Cast;

use super::memory::{Hunt, MobMemory};
use super::profile::MobProfile;

/// Everything a mob state may read or write during one tick.
///
/// The mob's own memory, attributes and locomotion are borrowed mutably.
/// Other entities are only visible through `frame.world` and written
/// through `frame.commands`.
pub struct MobContext<'w> {
    pub entity: Entity,
    /// Transform at the start of the tick
    pub transform: Transform,
    pub profile: &'w MobProfile,
    pub memory: &'w mut MobMemory,
    pub attributes: &'w mut Attributes,
    pub nav: &'w mut dyn Locomotion,
    pub frame: Frame<'w>,
}

impl MobContext<'_> {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Current value of one of the mob's attributes
    #[inline]
    pub fn attribute(&self, kind: AttributeKind) -> f32 {
        self.attributes.current(kind)
    }

    /// Detection volume shrunk or grown to the current detection radius
    pub fn detection(&self) -> Cast {
        let reach = self.attributes.max(AttributeKind::DetectionRadius);
        if reach <= 0.0 {
            return self.profile.detection;
        }
        self.profile
            .detection
            .scaled(self.attribute(AttributeKind::DetectionRadius) / reach)
    }

    /// Distance at which a fleeing mob feels safe
    pub fn escape_distance(&self) -> f32 {
        self.attribute(AttributeKind::EscapeDistance)
    }

    /// Whether the mob tracks stamina and has none left
    pub fn is_exhausted(&self) -> bool {
        self.attributes.max(AttributeKind::Stamina) > 0.0
            && self.attribute(AttributeKind::Stamina) <= 0.0
    }

    /// Head for `point` at the current speed
    pub fn move_to(&mut self, point: Vec3) {
        let speed = self.attribute(AttributeKind::Speed);
        self.nav.set_speed(speed);
        self.nav.request_destination(point);
    }

    /// Position of `target` if it is still alive
    pub fn position_of(&self, target: Entity) -> Option<Vec3> {
        if !self.frame.world.is_alive(target) {
            return None;
        }
        self.frame.world.transform(target).map(|t| t.position)
    }

    /// Drop the current hunt and stop moving
    pub fn lose_target(&mut self) {
        if let Some(hunt) = self.memory.clear_hunt() {
            log::debug!(
                "{:?} lost {:?} {:?}",
                self.entity,
                if hunt.is_player() { "player" } else { "prey" },
                hunt.target()
            );
            self.frame.emit(GameEvent::TargetLost {
                hunter: self.entity,
                target: hunt.target(),
            });
        }
        self.nav.reset_path();
    }

    /// Clear references to entities that no longer exist, and to a
    /// predator left beyond the escape distance
    pub fn forget_stale_references(&mut self) {
        if let Some(predator) = self.memory.predator {
            match self.position_of(predator) {
                None => {
                    log::trace!("{:?} forgets dead predator {:?}", self.entity, predator);
                    self.memory.predator = None;
                }
                Some(threat) if threat.distance(self.position()) > self.escape_distance() => {
                    log::debug!("{:?} escaped from {:?}", self.entity, predator);
                    self.memory.predator = None;
                }
                Some(_) => {}
            }
        }

        if let Some(hunt) = self.memory.hunt()
            && !self.frame.world.is_alive(hunt.target())
        {
            log::trace!("{:?} forgets dead target {:?}", self.entity, hunt.target());
            self.lose_target();
        }
    }

    /// Lock onto a target and announce it
    pub fn acquire(&mut self, hunt: Hunt) {
        match hunt {
            Hunt::Player(player) => self.memory.lock_player(player),
            Hunt::Prey(prey) => self.memory.lock_prey(prey),
        }
        self.frame.emit(GameEvent::TargetAcquired {
            hunter: self.entity,
            target: hunt.target(),
            player: hunt.is_player(),
        });
    }
}
