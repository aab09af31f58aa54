//! Ability casting states
//!
//! Ready accepts the trigger and resolves instant abilities itself.
//! Launching flies a virtual projectile; Casting waits for a confirmed
//! click. Both give up when the held ability is replaced mid-flight.

use glam::Vec3;
use hecs::Entity;
use serde::Serialize;

use crate::ai::{FsmError, State, StateKey, StateMachine};
use crate::core::{Command, Frame, GameEvent};
use crate::ecs::Transform;
use crate::input::InputAction;
use crate::physics::Cast;

use super::definition::{AbilityEffect, Dispatch};
use super::holder::{AbilitySlot, Resolution};

/// States of the ability machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AbilityStateKey {
    Ready,
    Casting,
    Launching,
}

impl StateKey for AbilityStateKey {
    const ALL: &'static [Self] = &[Self::Ready, Self::Casting, Self::Launching];

    fn name(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Casting => "Casting",
            Self::Launching => "Launching",
        }
    }
}

/// Vertical share of the camera direction kept by free projectiles
const VERTICAL_DAMPING: f32 = 0.25;

/// Everything an ability state may read or write during one tick.
pub struct AbilityContext<'w> {
    pub caster: Entity,
    /// Caster transform at the start of the tick
    pub transform: Transform,
    pub slot: &'w mut AbilitySlot,
    pub frame: Frame<'w>,
}

impl AbilityContext<'_> {
    /// Detect with every cast at `origin` and apply `effect` to the hits
    fn resolve_at(&mut self, origin: &Transform, casts: &[Cast], effect: AbilityEffect) {
        let mut targets: Vec<Entity> = Vec::new();
        for cast in casts {
            for hit in self.frame.detect(origin, cast, Some(self.caster)) {
                if !targets.contains(&hit) {
                    targets.push(hit);
                }
            }
        }
        self.apply(origin.position, targets, effect);
    }

    /// Queue `effect` on each target and record the resolution
    fn apply(&mut self, position: Vec3, targets: Vec<Entity>, effect: AbilityEffect) {
        for &target in &targets {
            let command = match effect {
                AbilityEffect::Damage(amount) => Command::Damage {
                    target,
                    amount,
                    source: Some(self.caster),
                },
                AbilityEffect::Heal(amount) => Command::Heal {
                    target,
                    amount,
                    source: Some(self.caster),
                },
            };
            self.frame.command(command);
        }

        log::info!(
            "{:?} resolved ability at {:?} on {} target(s)",
            self.caster,
            position,
            targets.len()
        );
        self.frame.emit(GameEvent::AbilityResolved {
            caster: self.caster,
            position,
            hits: targets.len(),
        });
        self.slot.record(Resolution { position, targets });
    }

    fn use_pressed(&self) -> bool {
        self.frame.input.is_just_pressed(InputAction::UseAbility) && self.slot.is_ready()
    }

    fn dispatch(&self) -> Option<Dispatch> {
        self.slot.definition().map(|definition| definition.dispatch())
    }
}

/// Trait object type of every ability state.
pub type AbilityState = dyn for<'w> State<AbilityStateKey, AbilityContext<'w>> + Send + Sync;

/// State machine driving one ability holder.
pub type AbilityMachine = StateMachine<AbilityStateKey, AbilityState>;

/// Build an ability machine starting in Ready.
///
/// # Errors
///
/// Fails if a key is left without a state.
pub fn ability_machine() -> Result<AbilityMachine, FsmError> {
    AbilityMachine::builder("ability")
        .state(AbilityStateKey::Ready, Box::new(ReadyState))
        .state(AbilityStateKey::Casting, Box::new(CastingState::default()))
        .state(AbilityStateKey::Launching, Box::new(LaunchingState::default()))
        .build(AbilityStateKey::Ready)
}

// ============================================================================
// Ready
// ============================================================================

/// Accepts the trigger; resolves multi-target and fixed-position abilities.
#[derive(Debug, Default)]
pub struct ReadyState;

impl<'w> State<AbilityStateKey, AbilityContext<'w>> for ReadyState {
    fn update(&mut self, ctx: &mut AbilityContext<'w>) {
        if !ctx.use_pressed() {
            return;
        }
        let Some(definition) = ctx.slot.definition().cloned() else {
            return;
        };
        let Some(effect) = definition.effect else {
            return;
        };

        let origin = ctx.transform;
        match definition.dispatch() {
            Dispatch::MultiTarget => {
                for cast in &definition.casts {
                    ctx.resolve_at(&origin, std::slice::from_ref(cast), effect);
                }
            }
            Dispatch::FixedPosition => ctx.resolve_at(&origin, &definition.casts, effect),
            Dispatch::Launch | Dispatch::ClickToTarget => return,
        }
        ctx.frame.animate(ctx.caster, "Cast");
        ctx.slot.consume_use();
    }

    fn next_state(&self, ctx: &AbilityContext<'w>) -> AbilityStateKey {
        if !ctx.use_pressed() {
            return AbilityStateKey::Ready;
        }
        match ctx.dispatch() {
            Some(Dispatch::Launch) => AbilityStateKey::Launching,
            Some(Dispatch::ClickToTarget) => AbilityStateKey::Casting,
            _ => AbilityStateKey::Ready,
        }
    }
}

// ============================================================================
// Launching
// ============================================================================

/// A virtual projectile travelling along the camera direction.
///
/// Resolves on the first hit. When the life span runs out without a hit the
/// effect still resolves at the final position.
#[derive(Debug, Default)]
pub struct LaunchingState {
    generation: u64,
    position: Vec3,
    direction: Vec3,
    elapsed: f32,
    finished: bool,
    resolved: bool,
}

impl LaunchingState {
    fn direction(ctx: &AbilityContext<'_>, fixed_to_ground: bool) -> Vec3 {
        let mut direction = ctx.frame.input.view().forward();
        if fixed_to_ground {
            direction.y = 0.0;
        } else {
            direction.y *= VERTICAL_DAMPING;
        }
        direction
            .try_normalize()
            .unwrap_or_else(|| ctx.transform.forward())
    }
}

impl<'w> State<AbilityStateKey, AbilityContext<'w>> for LaunchingState {
    fn enter(&mut self, ctx: &mut AbilityContext<'w>) {
        let fixed_to_ground = ctx
            .slot
            .definition()
            .is_some_and(|definition| definition.is_fixed_to_ground);

        self.generation = ctx.slot.generation();
        self.position = ctx.transform.position;
        self.direction = Self::direction(ctx, fixed_to_ground);
        self.elapsed = 0.0;
        self.finished = false;
        self.resolved = false;

        ctx.slot.in_progress = true;
        ctx.frame.animate(ctx.caster, "Launch");
    }

    fn update(&mut self, ctx: &mut AbilityContext<'w>) {
        if ctx.slot.generation() != self.generation {
            self.finished = true;
            return;
        }
        let Some(definition) = ctx.slot.definition().cloned() else {
            self.finished = true;
            return;
        };
        let (Some(effect), Some(hit_test)) = (definition.effect, definition.primary_cast().copied())
        else {
            self.finished = true;
            return;
        };

        // Never fly past the life span
        let step = ctx.frame.dt().min(definition.life_span - self.elapsed).max(0.0);
        self.elapsed += step;
        self.position += self.direction * definition.speed * step;
        let projectile = Transform::looking_along(self.position, self.direction);
        ctx.slot.target = Some(projectile);

        let hits = ctx.frame.detect(&projectile, &hit_test, Some(ctx.caster));
        if !hits.is_empty() {
            log::debug!("projectile of {:?} hit after {:.2}s", ctx.caster, self.elapsed);
            ctx.resolve_at(&projectile, &definition.casts, effect);
            self.resolved = true;
        } else if self.elapsed >= definition.life_span {
            log::debug!("projectile of {:?} expired, resolving in place", ctx.caster);
            ctx.resolve_at(&projectile, &definition.casts, effect);
            self.resolved = true;
        }
        self.finished = self.resolved;
    }

    fn exit(&mut self, ctx: &mut AbilityContext<'w>) {
        if ctx.slot.generation() != self.generation {
            return;
        }
        ctx.slot.in_progress = false;
        ctx.slot.target = None;
        if self.resolved {
            ctx.slot.consume_use();
        }
    }

    fn next_state(&self, _ctx: &AbilityContext<'w>) -> AbilityStateKey {
        if self.finished {
            AbilityStateKey::Ready
        } else {
            AbilityStateKey::Launching
        }
    }
}

// ============================================================================
// Casting
// ============================================================================

/// Waits, without limit, for the player to confirm or cancel a target.
#[derive(Debug, Default)]
pub struct CastingState {
    generation: u64,
    finished: bool,
    resolved: bool,
}

impl CastingState {
    /// One ray from the view along the pointer, up to the primary cast range
    fn confirm(ctx: &mut AbilityContext<'_>) -> bool {
        let Some(definition) = ctx.slot.definition().cloned() else {
            return false;
        };
        let (Some(effect), Some(range)) = (definition.effect, definition.primary_cast().copied())
        else {
            return false;
        };

        let view = *ctx.frame.input.view();
        let direction = ctx.frame.input.pointer_direction();
        let origin = Transform::looking_along(view.position, direction);
        let ray = Cast::ray(range.size, range.mask);

        let hit = ctx.frame.detect(&origin, &ray, Some(ctx.caster)).first().copied();
        let world = ctx.frame.world;
        let (position, targets) = match hit.and_then(|e| world.transform(e).map(|t| (e, t))) {
            Some((entity, transform)) => {
                ctx.slot.target = Some(transform);
                (transform.position, vec![entity])
            }
            None => (view.position + direction * range.size, Vec::new()),
        };
        ctx.apply(position, targets, effect);
        true
    }
}

impl<'w> State<AbilityStateKey, AbilityContext<'w>> for CastingState {
    fn enter(&mut self, ctx: &mut AbilityContext<'w>) {
        self.generation = ctx.slot.generation();
        self.finished = false;
        self.resolved = false;
        ctx.slot.is_waiting_for_click = true;
        ctx.slot.in_progress = true;
        ctx.frame.animate(ctx.caster, "Aim");
    }

    fn update(&mut self, ctx: &mut AbilityContext<'w>) {
        if ctx.slot.generation() != self.generation {
            self.finished = true;
            return;
        }

        let input = ctx.frame.input;
        if input.is_just_pressed(InputAction::Cancel) {
            log::debug!("{:?} cancelled target selection", ctx.caster);
            self.finished = true;
        } else if input.is_just_pressed(InputAction::ConfirmTarget) {
            self.resolved = Self::confirm(ctx);
            self.finished = true;
        }
    }

    fn exit(&mut self, ctx: &mut AbilityContext<'w>) {
        if ctx.slot.generation() != self.generation {
            return;
        }
        ctx.slot.is_waiting_for_click = false;
        ctx.slot.in_progress = false;
        if self.resolved {
            ctx.slot.consume_use();
        }
    }

    fn next_state(&self, _ctx: &AbilityContext<'w>) -> AbilityStateKey {
        if self.finished {
            AbilityStateKey::Ready
        } else {
            AbilityStateKey::Casting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_starts_ready() {
        let machine = ability_machine().unwrap();
        assert_eq!(machine.current_key(), AbilityStateKey::Ready);
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = AbilityStateKey::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["Ready", "Casting", "Launching"]);
    }
}
