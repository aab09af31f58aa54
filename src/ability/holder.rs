//! Ability ownership and lifecycle

use glam::Vec3;
use hecs::Entity;

use crate::ecs::Transform;
use crate::error::{ConfigError, SimError};

use super::definition::AbilityDefinition;
use super::states::{AbilityMachine, AbilityStateKey, ability_machine};

/// Outcome of the last resolved use.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Where the effect was applied
    pub position: Vec3,
    /// Entities the effect was applied to
    pub targets: Vec<Entity>,
}

/// The ability an entity currently holds and its transient progress.
#[derive(Debug, Clone, Default)]
pub struct AbilitySlot {
    definition: Option<AbilityDefinition>,
    uses_left: Option<u32>,
    /// Transform of the last confirmed target
    pub target: Option<Transform>,
    pub is_waiting_for_click: bool,
    pub in_progress: bool,
    last_resolution: Option<Resolution>,
    /// Bumped whenever the held ability changes
    generation: u64,
}

impl AbilitySlot {
    /// Pick up an ability, replacing the held one.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition cannot resolve.
    pub fn acquire(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        definition.validate()?;
        log::debug!("acquired ability `{}`", definition.name);
        self.uses_left = definition.uses;
        self.definition = Some(definition);
        self.reset();
        Ok(())
    }

    /// Drop the held ability
    pub fn clear(&mut self) {
        if let Some(definition) = self.definition.take() {
            log::debug!("cleared ability `{}`", definition.name);
        }
        self.uses_left = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.target = None;
        self.is_waiting_for_click = false;
        self.in_progress = false;
        self.generation += 1;
    }

    #[must_use]
    pub fn definition(&self) -> Option<&AbilityDefinition> {
        self.definition.as_ref()
    }

    /// Whether a trigger would be accepted
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|definition| definition.effect.is_some())
    }

    #[must_use]
    pub fn uses_left(&self) -> Option<u32> {
        self.uses_left
    }

    /// Spend one use, clearing the ability when none are left
    pub fn consume_use(&mut self) {
        let Some(uses) = self.uses_left.as_mut() else {
            return;
        };
        *uses = uses.saturating_sub(1);
        if *uses == 0 {
            self.clear();
        }
    }

    pub fn record(&mut self, resolution: Resolution) {
        self.last_resolution = Some(resolution);
    }

    #[must_use]
    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    /// Changes whenever the held ability is acquired, replaced or cleared
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Component giving an entity an ability slot and its machine.
pub struct AbilityHolder {
    pub slot: AbilitySlot,
    pub(crate) machine: AbilityMachine,
}

impl AbilityHolder {
    /// Empty holder in Ready.
    ///
    /// # Errors
    ///
    /// Fails if the machine is incomplete.
    pub fn new() -> Result<Self, SimError> {
        Ok(Self {
            slot: AbilitySlot::default(),
            machine: ability_machine()?,
        })
    }

    /// Holder already carrying `definition`.
    ///
    /// # Errors
    ///
    /// Fails for an invalid definition or incomplete machine.
    pub fn with_definition(definition: AbilityDefinition) -> Result<Self, SimError> {
        let mut holder = Self::new()?;
        holder.slot.acquire(definition)?;
        Ok(holder)
    }

    /// Key of the active state
    #[must_use]
    pub fn state(&self) -> AbilityStateKey {
        self.machine.current_key()
    }
}

impl std::fmt::Debug for AbilityHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityHolder")
            .field("slot", &self.slot)
            .field("state", &self.state())
            .finish()
    }
}
