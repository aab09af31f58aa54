//! Mob behavior states
//!
//! Four keys share three state types: Moving and Patrol are the same walk
//! with a different destination source.
//!
//! ```text
//!          idle_time            arrived / timed out
//!   Idle ───────────► Moving ─────────────────────► Idle
//!     │               Patrol
//!     │                 │ target locked
//!     │ target locked   ▼
//!     └────────────► Chasing ──── lost / timed out ──► Idle
//! ```

use std::f32::consts::TAU;

use glam::Vec3;
use hecs::Entity;
use rand::Rng;
use serde::Serialize;

use crate::ai::{Flee, FsmError, State, StateKey, StateMachine};
use crate::core::Command;
use crate::ecs::AttributeKind;

use super::context::MobContext;

/// States of the mob machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MobStateKey {
    Idle,
    Moving,
    Patrol,
    Chasing,
}

impl StateKey for MobStateKey {
    const ALL: &'static [Self] = &[Self::Idle, Self::Moving, Self::Patrol, Self::Chasing];

    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Moving => "Moving",
            Self::Patrol => "Patrol",
            Self::Chasing => "Chasing",
        }
    }
}

impl MobStateKey {
    /// Whether perception runs before this state ticks.
    ///
    /// Chasing always holds a hunt, so scanning there could only relock a
    /// target the state just gave up on.
    #[must_use]
    pub fn perceives(self) -> bool {
        matches!(self, Self::Moving | Self::Patrol)
    }
}

/// Trait object type of every mob state.
pub type MobState = dyn for<'w> State<MobStateKey, MobContext<'w>> + Send + Sync;

/// State machine driving one mob.
pub type MobMachine = StateMachine<MobStateKey, MobState>;

/// Build a mob machine starting in Idle.
///
/// # Errors
///
/// Fails if a key is left without a state.
pub fn mob_machine() -> Result<MobMachine, FsmError> {
    MobMachine::builder("mob")
        .state(MobStateKey::Idle, Box::new(IdleState))
        .state(MobStateKey::Moving, Box::new(WalkState::moving()))
        .state(MobStateKey::Patrol, Box::new(WalkState::patrol()))
        .state(MobStateKey::Chasing, Box::new(ChasingState::default()))
        .build(MobStateKey::Idle)
}

// ============================================================================
// Idle
// ============================================================================

/// Stand still until the idle time runs out, recovering stamina.
#[derive(Debug, Default)]
pub struct IdleState;

impl<'w> State<MobStateKey, MobContext<'w>> for IdleState {
    fn enter(&mut self, ctx: &mut MobContext<'w>) {
        ctx.memory.idle_elapsed = 0.0;
        ctx.nav.reset_path();
        ctx.frame.animate(ctx.entity, "Idle");
    }

    fn update(&mut self, ctx: &mut MobContext<'w>) {
        let dt = ctx.frame.dt();
        ctx.memory.idle_elapsed += dt;
        ctx.attributes.modify(AttributeKind::Stamina, dt);
    }

    fn next_state(&self, ctx: &MobContext<'w>) -> MobStateKey {
        if ctx.memory.hunt().is_some() {
            MobStateKey::Chasing
        } else if ctx.memory.predator.is_some() {
            // Prey does not wait out its idle time
            MobStateKey::Moving
        } else if ctx.memory.idle_elapsed >= ctx.profile.idle_time {
            if ctx.profile.patrols() {
                MobStateKey::Patrol
            } else {
                MobStateKey::Moving
            }
        } else {
            MobStateKey::Idle
        }
    }
}

// ============================================================================
// Moving / Patrol
// ============================================================================

/// Walk to one destination, bounded by `max_walk_time`.
///
/// While a predator is known the destination is replaced every tick by a
/// point away from it. The predator itself is forgotten by
/// [`MobContext::forget_stale_references`] once out of escape distance.
#[derive(Debug)]
pub struct WalkState {
    key: MobStateKey,
    elapsed: f32,
    finished: bool,
}

impl WalkState {
    /// Walk to a random point
    #[must_use]
    pub fn moving() -> Self {
        Self {
            key: MobStateKey::Moving,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Walk to the next patrol point
    #[must_use]
    pub fn patrol() -> Self {
        Self {
            key: MobStateKey::Patrol,
            ..Self::moving()
        }
    }

    fn escape_point(ctx: &MobContext<'_>, threat: Vec3) -> Vec3 {
        let mut fallback = ctx.transform.forward();
        fallback.y = 0.0;
        Flee::new(threat, 1.0).escape_point(
            ctx.position(),
            ctx.escape_distance(),
            fallback.try_normalize().unwrap_or(Vec3::X),
        )
    }

    fn wander_point(ctx: &mut MobContext<'_>) -> Vec3 {
        let angle = ctx.frame.rng.gen_range(0.0..TAU);
        let radius = ctx.profile.wander_distance * ctx.frame.rng.gen_range(0.0..=1.0f32).sqrt();
        ctx.position() + Vec3::new(angle.cos(), 0.0, angle.sin()) * radius
    }

    /// Re-aim away from the predator
    fn keep_fleeing(ctx: &mut MobContext<'_>, predator: Entity) {
        if let Some(threat) = ctx.position_of(predator) {
            let point = Self::escape_point(ctx, threat);
            ctx.move_to(point);
        }
    }
}

impl<'w> State<MobStateKey, MobContext<'w>> for WalkState {
    fn enter(&mut self, ctx: &mut MobContext<'w>) {
        self.elapsed = 0.0;
        self.finished = false;

        let threat = ctx.memory.predator.and_then(|p| ctx.position_of(p));
        let destination = match threat {
            Some(threat) => Self::escape_point(ctx, threat),
            None => {
                let patrol = if self.key == MobStateKey::Patrol {
                    ctx.memory.next_patrol_point(&ctx.profile.patrol_points)
                } else {
                    None
                };
                match patrol {
                    Some(point) => point,
                    None => Self::wander_point(ctx),
                }
            }
        };
        ctx.move_to(destination);
        ctx.frame.animate(ctx.entity, "Walk");
    }

    fn update(&mut self, ctx: &mut MobContext<'w>) {
        self.elapsed += ctx.frame.dt();

        if let Some(predator) = ctx.memory.predator {
            Self::keep_fleeing(ctx, predator);
        }

        if self.elapsed >= ctx.profile.max_walk_time {
            log::trace!("{:?} gave up walking after {:.2}s", ctx.entity, self.elapsed);
            ctx.memory.predator = None;
            ctx.nav.reset_path();
            self.finished = true;
            return;
        }

        if ctx.memory.predator.is_none() && ctx.nav.has_reached_destination() {
            self.finished = true;
        }
    }

    fn next_state(&self, ctx: &MobContext<'w>) -> MobStateKey {
        if ctx.memory.hunt().is_some() {
            MobStateKey::Chasing
        } else if self.finished {
            MobStateKey::Idle
        } else {
            self.key
        }
    }
}

// ============================================================================
// Chasing
// ============================================================================

/// Pursue and bite the hunted entity.
///
/// The pursuit ends when the target dies, leaves the chase distance, the
/// chase time runs out, or the mob runs out of stamina.
#[derive(Debug, Default)]
pub struct ChasingState {
    elapsed: f32,
}

impl<'w> State<MobStateKey, MobContext<'w>> for ChasingState {
    fn enter(&mut self, ctx: &mut MobContext<'w>) {
        self.elapsed = 0.0;
        ctx.frame.animate(ctx.entity, "Run");
    }

    fn update(&mut self, ctx: &mut MobContext<'w>) {
        self.elapsed += ctx.frame.dt();

        let Some(hunt) = ctx.memory.hunt() else {
            return;
        };
        let target = hunt.target();
        let Some(target_position) = ctx.position_of(target) else {
            ctx.lose_target();
            return;
        };
        let distance = ctx.position().distance(target_position);
        if distance > ctx.attribute(AttributeKind::ChaseDistance) {
            log::debug!("{:?} lets {:?} get away", ctx.entity, target);
            ctx.lose_target();
            return;
        }
        ctx.move_to(target_position);

        let in_reach =
            ctx.memory.contact == Some(target) || distance <= ctx.profile.attack_distance;
        if in_reach
            && ctx
                .memory
                .bite
                .try_bite(ctx.frame.now(), ctx.profile.bite_cooldown)
        {
            log::info!(
                "{:?} bites {:?} for {}",
                ctx.entity,
                target,
                ctx.profile.bite_damage
            );
            ctx.frame.command(Command::Damage {
                target,
                amount: ctx.profile.bite_damage,
                source: Some(ctx.entity),
            });
            ctx.frame.animate(ctx.entity, "Bite");
        }

        ctx.attributes.modify(AttributeKind::Stamina, -ctx.frame.dt());
        let bounded = !hunt.is_player() || ctx.profile.player_has_max_chase_time;
        if bounded && self.elapsed >= ctx.profile.max_chase_time {
            log::debug!("{:?} gave up the chase after {:.2}s", ctx.entity, self.elapsed);
            ctx.lose_target();
        } else if ctx.is_exhausted() {
            log::debug!("{:?} is too tired to keep chasing", ctx.entity);
            ctx.lose_target();
        }
    }

    fn exit(&mut self, ctx: &mut MobContext<'w>) {
        ctx.memory.contact = None;
    }

    fn next_state(&self, ctx: &MobContext<'w>) -> MobStateKey {
        if ctx.memory.hunt().is_some() {
            MobStateKey::Chasing
        } else {
            MobStateKey::Idle
        }
    }

    fn on_trigger_enter(&mut self, ctx: &mut MobContext<'w>, other: Entity) {
        if ctx.memory.hunt().map(|h| h.target()) == Some(other) {
            ctx.memory.contact = Some(other);
        }
    }

    fn on_trigger_stay(&mut self, ctx: &mut MobContext<'w>, other: Entity) {
        self.on_trigger_enter(ctx, other);
    }

    fn on_trigger_exit(&mut self, ctx: &mut MobContext<'w>, other: Entity) {
        if ctx.memory.contact == Some(other) {
            ctx.memory.contact = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_starts_idle() {
        let machine = mob_machine().unwrap();
        assert_eq!(machine.current_key(), MobStateKey::Idle);
        assert!(!machine.is_started());
    }

    #[test]
    fn test_perceiving_states() {
        assert!(!MobStateKey::Idle.perceives());
        assert!(MobStateKey::Patrol.perceives());
        assert!(!MobStateKey::Chasing.perceives());
    }
}
