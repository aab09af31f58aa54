//! Static ability configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::physics::{Cast, CategoryMask};

/// What an ability does to each entity it hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityEffect {
    Damage(f32),
    Heal(f32),
}

/// How a triggered ability resolves, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One resolution per cast, all at once
    MultiTarget,
    /// Projectile flight
    Launch,
    /// Resolved on the caster
    FixedPosition,
    /// Wait for a confirmed click, then ray cast
    ClickToTarget,
}

/// Data describing one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityDefinition {
    pub name: String,
    pub number_of_targets: u32,
    pub should_launch: bool,
    pub is_fixed_position: bool,
    /// Keep projectiles on the ground plane
    pub is_fixed_to_ground: bool,
    /// Projectile speed in units per second
    pub speed: f32,
    /// Projectile flight time in seconds
    pub life_span: f32,
    /// Hit volumes; the first one is the hit-test and click range
    pub casts: Vec<Cast>,
    pub effect: Option<AbilityEffect>,
    /// Number of uses before the ability is cleared; `None` is unlimited
    pub uses: Option<u32>,
}

impl Default for AbilityDefinition {
    fn default() -> Self {
        Self {
            name: String::from("Ability"),
            number_of_targets: 1,
            should_launch: false,
            is_fixed_position: false,
            is_fixed_to_ground: false,
            speed: 10.0,
            life_span: 2.0,
            casts: vec![Cast::sphere(1.0, CategoryMask::MOB | CategoryMask::PROP)],
            effect: Some(AbilityEffect::Damage(10.0)),
            uses: None,
        }
    }
}

impl AbilityDefinition {
    /// Ability with default tuning
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Projectile ability
    #[must_use]
    pub fn launched(mut self, speed: f32, life_span: f32) -> Self {
        self.should_launch = true;
        self.speed = speed;
        self.life_span = life_span;
        self
    }

    /// Ability resolved on the caster
    #[must_use]
    pub fn fixed_position(mut self) -> Self {
        self.is_fixed_position = true;
        self
    }

    /// Replace the hit volumes
    #[must_use]
    pub fn with_casts(mut self, casts: Vec<Cast>) -> Self {
        self.casts = casts;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: AbilityEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = Some(uses);
        self
    }

    /// Resolution path taken when triggered
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        if self.number_of_targets > 1 {
            Dispatch::MultiTarget
        } else if self.should_launch {
            Dispatch::Launch
        } else if self.is_fixed_position {
            Dispatch::FixedPosition
        } else {
            Dispatch::ClickToTarget
        }
    }

    /// Cast used for projectile hit tests and click range
    #[must_use]
    pub fn primary_cast(&self) -> Option<&Cast> {
        self.casts.first()
    }

    /// Reject definitions that cannot resolve.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty cast list, invalid casts, or negative
    /// speed or life span.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.casts.is_empty() {
            return Err(ConfigError::NoCasts(self.name.clone()));
        }
        ConfigError::non_negative("speed", self.speed)?;
        ConfigError::non_negative("life_span", self.life_span)?;
        for cast in &self.casts {
            ConfigError::cast("casts", cast.validate())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_priority() {
        let base = AbilityDefinition::new("Bolt");
        assert_eq!(base.dispatch(), Dispatch::ClickToTarget);
        assert_eq!(base.clone().fixed_position().dispatch(), Dispatch::FixedPosition);

        let launched = base.clone().fixed_position().launched(10.0, 2.0);
        assert_eq!(launched.dispatch(), Dispatch::Launch);

        let multi = AbilityDefinition {
            number_of_targets: 3,
            ..launched
        };
        assert_eq!(multi.dispatch(), Dispatch::MultiTarget);
    }

    #[test]
    fn test_empty_casts_rejected() {
        let ability = AbilityDefinition::new("Dud").with_casts(Vec::new());
        assert!(matches!(ability.validate(), Err(ConfigError::NoCasts(name)) if name == "Dud"));
    }
}
