//! Keyed Finite State Machine for Entity Behavior
//!
//! Provides a generic state container driven once per simulation tick.
//! Each machine holds a fixed set of states addressed by an enumerable key.
//! Transitions are pull-based: the active state alone decides which key
//! comes next, so there is no global transition table.
//!
//! # Design Principles
//!
//! - **Decentralized transitions**: `State::next_state` is asked every tick
//! - **Fail fast**: every key must be registered when the machine is built
//! - **Single active state**: only the current state is updated or receives
//!   trigger callbacks
//! - **Borrowed context**: states never own the entity data they decide over
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = StateMachine::<MobStateKey, MobState>::builder("mob")
//!     .state(MobStateKey::Idle, Box::new(IdleState))
//!     .state(MobStateKey::Moving, Box::new(WalkState::moving()))
//!     .build(MobStateKey::Idle)?;
//!
//! if let Some(transition) = fsm.tick(&mut ctx) {
//!     log::debug!("{transition:?}");
//! }
//! ```

use std::fmt;
use std::hash::Hash;

use hecs::Entity;
use rustc_hash::FxHashMap;

// ============================================================================
// State Keys
// ============================================================================

/// Identifier of one state inside a machine.
///
/// The set of keys is finite and known at configuration time, which lets
/// the builder verify that every key has a registered state.
pub trait StateKey: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Every key of this machine type.
    const ALL: &'static [Self];

    /// Stable name for logging and presentation bindings.
    fn name(self) -> &'static str;
}

// ============================================================================
// State Trait
// ============================================================================

/// A state in a keyed state machine.
///
/// The lifecycle is:
///
/// 1. `enter()` - Called once when this state becomes active
/// 2. `update()` - Called each tick while `next_state()` returns this state's key
/// 3. `late_update()` - Called after the tick's update or transition
/// 4. `exit()` - Called once when leaving this state
pub trait State<K, Ctx: ?Sized> {
    /// Called when entering this state.
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called each tick while this state stays active.
    fn update(&mut self, _ctx: &mut Ctx) {}

    /// Called after the machine's tick has completed.
    fn late_update(&mut self, _ctx: &mut Ctx) {}

    /// Called when exiting this state.
    fn exit(&mut self, _ctx: &mut Ctx) {}

    /// Key of the state that should be active this tick.
    ///
    /// Must be total: return the state's own key to stay.
    fn next_state(&self, ctx: &Ctx) -> K;

    /// Another entity started overlapping this entity's trigger volume.
    fn on_trigger_enter(&mut self, _ctx: &mut Ctx, _other: Entity) {}

    /// Another entity is still overlapping this entity's trigger volume.
    fn on_trigger_stay(&mut self, _ctx: &mut Ctx, _other: Entity) {}

    /// Another entity stopped overlapping this entity's trigger volume.
    fn on_trigger_exit(&mut self, _ctx: &mut Ctx, _other: Entity) {}
}

/// Phase of a trigger overlap forwarded to the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerPhase {
    Enter,
    Stay,
    Exit,
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors detected while building a machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsmError {
    /// A key of the machine has no registered state.
    #[error("state machine `{machine}` has no state registered for key `{key}`")]
    MissingState {
        machine: &'static str,
        key: &'static str,
    },
    /// The same key was registered twice.
    #[error("state machine `{machine}` registers key `{key}` more than once")]
    DuplicateState {
        machine: &'static str,
        key: &'static str,
    },
}

// ============================================================================
// Transition
// ============================================================================

/// A completed state change reported by [`StateMachine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<K> {
    pub from: K,
    pub to: K,
}

// ============================================================================
// Builder
// ============================================================================

/// Collects the states of a machine before validation.
pub struct StateMachineBuilder<K: StateKey, S: ?Sized> {
    label: &'static str,
    states: FxHashMap<K, Box<S>>,
    duplicate: Option<K>,
}

impl<K: StateKey, S: ?Sized> StateMachineBuilder<K, S> {
    /// Register the state for `key`.
    #[must_use]
    pub fn state(mut self, key: K, state: Box<S>) -> Self {
        if self.states.insert(key, state).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(key);
        }
        self
    }

    /// Validate the key set and produce the machine.
    ///
    /// # Errors
    ///
    /// Returns an error if a key was registered twice or any key of `K`
    /// (including `initial`) has no state.
    pub fn build(self, initial: K) -> Result<StateMachine<K, S>, FsmError> {
        if let Some(key) = self.duplicate {
            return Err(FsmError::DuplicateState {
                machine: self.label,
                key: key.name(),
            });
        }

        if let Some(missing) = K::ALL
            .iter()
            .chain(std::iter::once(&initial))
            .find(|key| !self.states.contains_key(key))
        {
            return Err(FsmError::MissingState {
                machine: self.label,
                key: missing.name(),
            });
        }

        Ok(StateMachine {
            label: self.label,
            states: self.states,
            current: initial,
            started: false,
            transitioning: false,
        })
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// A keyed state machine that owns its states and tracks the active one.
///
/// # Type Parameters
///
/// - `K`: the machine's key type
/// - `S`: the stored state type, usually a `dyn State<K, Ctx>` object
pub struct StateMachine<K: StateKey, S: ?Sized> {
    /// Machine label used in logs and errors
    label: &'static str,
    /// Every state of the machine, keyed by its identifier
    states: FxHashMap<K, Box<S>>,
    /// Key of the active state
    current: K,
    /// Whether the initial state has been entered
    started: bool,
    /// Guard against re-entrant transitions
    transitioning: bool,
}

impl<K: StateKey, S: ?Sized> StateMachine<K, S> {
    /// Start building a machine with the given label.
    #[must_use]
    pub fn builder(label: &'static str) -> StateMachineBuilder<K, S> {
        StateMachineBuilder {
            label,
            states: FxHashMap::default(),
            duplicate: None,
        }
    }

    /// Run one tick of the machine.
    ///
    /// Enters the initial state on the first tick. Then asks the active
    /// state for the next key: the same key runs `update()`, a different
    /// key exits the active state and enters the new one.
    pub fn tick<Ctx: ?Sized>(&mut self, ctx: &mut Ctx) -> Option<Transition<K>>
    where
        S: State<K, Ctx>,
    {
        if self.transitioning {
            return None;
        }

        if !self.started {
            self.started = true;
            if let Some(state) = self.states.get_mut(&self.current) {
                state.enter(ctx);
            }
        }

        let next = self.states.get(&self.current)?.next_state(ctx);

        if next == self.current {
            if let Some(state) = self.states.get_mut(&self.current) {
                state.update(ctx);
            }
            return None;
        }

        let from = self.current;
        self.transition_to(next, ctx);
        (self.current == next).then_some(Transition { from, to: next })
    }

    /// Call `late_update()` on the active state.
    pub fn late_update<Ctx: ?Sized>(&mut self, ctx: &mut Ctx)
    where
        S: State<K, Ctx>,
    {
        if let Some(state) = self.states.get_mut(&self.current) {
            state.late_update(ctx);
        }
    }

    /// Force a transition to `next`.
    ///
    /// Always performs a full exit/enter cycle, even when `next` is already
    /// the active key.
    pub fn transition_to<Ctx: ?Sized>(&mut self, next: K, ctx: &mut Ctx)
    where
        S: State<K, Ctx>,
    {
        if self.transitioning {
            return;
        }
        if !self.states.contains_key(&next) {
            log::error!(
                "state machine `{}` asked for unregistered key {:?}",
                self.label,
                next
            );
            return;
        }

        self.transitioning = true;

        if self.started
            && let Some(state) = self.states.get_mut(&self.current)
        {
            state.exit(ctx);
        }

        self.current = next;
        self.started = true;

        if let Some(state) = self.states.get_mut(&next) {
            state.enter(ctx);
        }

        self.transitioning = false;
    }

    /// Forward a trigger callback to the active state only.
    pub fn on_trigger<Ctx: ?Sized>(&mut self, phase: TriggerPhase, ctx: &mut Ctx, other: Entity)
    where
        S: State<K, Ctx>,
    {
        let Some(state) = self.states.get_mut(&self.current) else {
            return;
        };
        match phase {
            TriggerPhase::Enter => state.on_trigger_enter(ctx, other),
            TriggerPhase::Stay => state.on_trigger_stay(ctx, other),
            TriggerPhase::Exit => state.on_trigger_exit(ctx, other),
        }
    }

    /// Key of the active state.
    #[must_use]
    pub fn current_key(&self) -> K {
        self.current
    }

    /// Check if the machine is in the given state.
    #[must_use]
    pub fn is_in_state(&self, key: K) -> bool {
        self.current == key
    }

    /// Whether the initial state has been entered.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Machine label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<K: StateKey, S: ?Sized> fmt::Debug for StateMachine<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("label", &self.label)
            .field("current", &self.current.name())
            .field("states", &self.states.len())
            .field("started", &self.started)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Light {
        Green,
        Red,
    }

    impl StateKey for Light {
        const ALL: &'static [Self] = &[Light::Green, Light::Red];

        fn name(self) -> &'static str {
            match self {
                Light::Green => "Green",
                Light::Red => "Red",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        wanted: Option<Light>,
        entered: Vec<Light>,
        exited: Vec<Light>,
        updates: usize,
        late_updates: usize,
        triggers: Vec<(Light, TriggerPhase)>,
    }

    struct Lamp(Light);

    impl State<Light, Recorder> for Lamp {
        fn enter(&mut self, ctx: &mut Recorder) {
            ctx.entered.push(self.0);
        }

        fn update(&mut self, ctx: &mut Recorder) {
            ctx.updates += 1;
        }

        fn late_update(&mut self, ctx: &mut Recorder) {
            ctx.late_updates += 1;
        }

        fn exit(&mut self, ctx: &mut Recorder) {
            ctx.exited.push(self.0);
        }

        fn next_state(&self, ctx: &Recorder) -> Light {
            ctx.wanted.unwrap_or(self.0)
        }

        fn on_trigger_enter(&mut self, ctx: &mut Recorder, _other: Entity) {
            ctx.triggers.push((self.0, TriggerPhase::Enter));
        }

        fn on_trigger_exit(&mut self, ctx: &mut Recorder, _other: Entity) {
            ctx.triggers.push((self.0, TriggerPhase::Exit));
        }
    }

    type LampMachine = StateMachine<Light, dyn State<Light, Recorder>>;

    fn lamp_machine() -> LampMachine {
        LampMachine::builder("lamp")
            .state(Light::Green, Box::new(Lamp(Light::Green)))
            .state(Light::Red, Box::new(Lamp(Light::Red)))
            .build(Light::Green)
            .unwrap()
    }

    fn some_entity() -> Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_initial_state_entered_on_first_tick() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();

        assert!(!fsm.is_started());
        assert!(fsm.tick(&mut ctx).is_none());

        assert!(fsm.is_started());
        assert_eq!(ctx.entered, vec![Light::Green]);
        assert_eq!(ctx.updates, 1);
    }

    #[test]
    fn test_missing_state_fails_at_build() {
        let result = LampMachine::builder("lamp")
            .state(Light::Green, Box::new(Lamp(Light::Green)))
            .build(Light::Green);

        assert_eq!(
            result.unwrap_err(),
            FsmError::MissingState {
                machine: "lamp",
                key: "Red"
            }
        );
    }

    #[test]
    fn test_duplicate_state_fails_at_build() {
        let result = LampMachine::builder("lamp")
            .state(Light::Green, Box::new(Lamp(Light::Green)))
            .state(Light::Red, Box::new(Lamp(Light::Red)))
            .state(Light::Red, Box::new(Lamp(Light::Red)))
            .build(Light::Green);

        assert!(matches!(
            result,
            Err(FsmError::DuplicateState { key: "Red", .. })
        ));
    }

    #[test]
    fn test_pull_transition_exits_before_enter() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();
        fsm.tick(&mut ctx);

        ctx.wanted = Some(Light::Red);
        let transition = fsm.tick(&mut ctx);

        assert_eq!(
            transition,
            Some(Transition {
                from: Light::Green,
                to: Light::Red
            })
        );
        assert_eq!(ctx.exited, vec![Light::Green]);
        assert_eq!(ctx.entered, vec![Light::Green, Light::Red]);
        // Transition tick does not also update
        assert_eq!(ctx.updates, 1);
        assert!(fsm.is_in_state(Light::Red));
    }

    #[test]
    fn test_next_state_is_stable_without_changes() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();

        for _ in 0..5 {
            assert!(fsm.tick(&mut ctx).is_none());
        }

        assert_eq!(fsm.current_key(), Light::Green);
        assert_eq!(ctx.updates, 5);
        assert!(ctx.exited.is_empty());
    }

    #[test]
    fn test_transition_to_same_state_is_full_cycle() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();
        fsm.tick(&mut ctx);

        fsm.transition_to(Light::Green, &mut ctx);

        assert_eq!(ctx.exited, vec![Light::Green]);
        assert_eq!(ctx.entered, vec![Light::Green, Light::Green]);
    }

    #[test]
    fn test_forced_transition_before_start_skips_exit() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();

        fsm.transition_to(Light::Red, &mut ctx);

        assert!(ctx.exited.is_empty());
        assert_eq!(ctx.entered, vec![Light::Red]);
        assert!(fsm.is_in_state(Light::Red));
    }

    #[test]
    fn test_triggers_reach_active_state_only() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();
        let other = some_entity();
        fsm.tick(&mut ctx);

        fsm.on_trigger(TriggerPhase::Enter, &mut ctx, other);
        fsm.transition_to(Light::Red, &mut ctx);
        fsm.on_trigger(TriggerPhase::Exit, &mut ctx, other);
        // Lamp ignores Stay
        fsm.on_trigger(TriggerPhase::Stay, &mut ctx, other);

        assert_eq!(
            ctx.triggers,
            vec![
                (Light::Green, TriggerPhase::Enter),
                (Light::Red, TriggerPhase::Exit)
            ]
        );
    }

    #[test]
    fn test_late_update_runs_on_active_state() {
        let mut fsm = lamp_machine();
        let mut ctx = Recorder::default();
        fsm.tick(&mut ctx);
        fsm.late_update(&mut ctx);

        assert_eq!(ctx.late_updates, 1);
    }
}
