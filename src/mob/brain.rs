//! Mob brain component and its per-tick system

use hecs::Entity;

use crate::ai::{Locomotion, StateKey, SteeringAgent, TriggerPhase};
use crate::core::{Frame, GameEvent};
use crate::ecs::Attributes;
use crate::error::SimError;

use super::context::MobContext;
use super::memory::MobMemory;
use super::perception;
use super::profile::MobProfile;
use super::states::{MobMachine, MobStateKey, mob_machine};

/// Behavior of one mob: static profile, runtime memory and its machine.
pub struct MobBrain {
    pub profile: MobProfile,
    pub memory: MobMemory,
    machine: MobMachine,
}

impl MobBrain {
    /// Validate the profile and build the machine.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid profile or incomplete machine.
    pub fn new(profile: MobProfile) -> Result<Self, SimError> {
        profile.validate()?;
        Ok(Self {
            profile,
            memory: MobMemory::default(),
            machine: mob_machine()?,
        })
    }

    /// Key of the active state
    #[must_use]
    pub fn state(&self) -> MobStateKey {
        self.machine.current_key()
    }

    #[must_use]
    pub fn machine(&self) -> &MobMachine {
        &self.machine
    }
}

impl std::fmt::Debug for MobBrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobBrain")
            .field("species", &self.profile.species)
            .field("state", &self.state())
            .field("memory", &self.memory)
            .finish()
    }
}

/// Tick every mob's machine.
pub fn update_mobs(frame: &mut Frame<'_>) {
    let mobs: Vec<Entity> = frame
        .world
        .query::<&MobBrain>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in mobs {
        with_context(frame, entity, |machine, ctx| {
            ctx.forget_stale_references();
            if machine.current_key().perceives() {
                perception::check_chase_conditions(ctx);
            }

            if let Some(transition) = machine.tick(ctx) {
                log::debug!(
                    "{:?} ({}) {} -> {}",
                    ctx.entity,
                    ctx.profile.species,
                    transition.from.name(),
                    transition.to.name()
                );
                ctx.frame.emit(GameEvent::StateChanged {
                    entity: ctx.entity,
                    machine: machine.label(),
                    from: transition.from.name(),
                    to: transition.to.name(),
                });
            }
            machine.late_update(ctx);
        });
    }
}

/// Forward a trigger overlap to a mob's active state.
pub fn dispatch_trigger(frame: &mut Frame<'_>, entity: Entity, phase: TriggerPhase, other: Entity) {
    with_context(frame, entity, |machine, ctx| {
        machine.on_trigger(phase, ctx, other);
    });
}

/// Borrow a mob's brain, attributes and agent, then run `f` with its context
fn with_context(
    frame: &mut Frame<'_>,
    entity: Entity,
    f: impl FnOnce(&mut MobMachine, &mut MobContext<'_>),
) {
    let world = frame.world;
    let Some(transform) = world.transform(entity) else {
        log::warn!("mob {entity:?} has no transform");
        return;
    };
    let Ok(mut brain) = world.borrow_mut::<MobBrain>(entity) else {
        return;
    };
    let Ok(mut attributes) = world.borrow_mut::<Attributes>(entity) else {
        log::warn!("mob {entity:?} has no attributes");
        return;
    };
    let Ok(mut agent) = world.borrow_mut::<SteeringAgent>(entity) else {
        log::warn!("mob {entity:?} has no steering agent");
        return;
    };

    let MobBrain {
        profile,
        memory,
        machine,
    } = &mut *brain;
    let nav: &mut dyn Locomotion = &mut *agent;
    let mut ctx = MobContext {
        entity,
        transform,
        profile,
        memory,
        attributes: &mut *attributes,
        nav,
        frame: frame.reborrow(),
    };
    f(machine, &mut ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Cast, CategoryMask};

    #[test]
    fn test_invalid_profile_aborts_setup() {
        let profile = MobProfile {
            detection: Cast::sphere(-1.0, CategoryMask::ALL),
            ..MobProfile::new("Wolf")
        };

        assert!(matches!(MobBrain::new(profile), Err(SimError::Config(_))));
    }

    #[test]
    fn test_new_brain_is_idle() {
        let brain = MobBrain::new(MobProfile::new("Wolf")).unwrap();
        assert_eq!(brain.state(), MobStateKey::Idle);
        assert!(brain.memory.hunt().is_none());
    }
}
