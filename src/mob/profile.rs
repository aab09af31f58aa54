//! Static per-species mob configuration

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ecs::EntityKind;
use crate::error::ConfigError;
use crate::physics::{Cast, CategoryMask};

/// Tuning values a mob's behavior states read.
///
/// Loaded before the mob spawns and never changed afterwards. Speed,
/// detection reach, chase and escape distances and stamina seed the mob's
/// [`Attributes`](crate::ecs::Attributes), which the states read at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobProfile {
    /// Species name other mobs list as prey
    pub species: String,
    /// Radius of random wander destinations
    pub wander_distance: f32,
    /// Longest a single walk may take before giving up
    pub max_walk_time: f32,
    /// Time spent idle before walking again
    pub idle_time: f32,
    /// Perception volume
    pub detection: Cast,
    /// Accepted prey: `"Player"` and/or species names
    pub prey: Vec<String>,
    /// Distance at which a fleeing mob considers itself safe
    pub escape_max_distance: f32,
    /// Longest pursuit before giving up
    pub max_chase_time: f32,
    /// Whether `max_chase_time` also bounds pursuits of players
    pub player_has_max_chase_time: bool,
    /// A pursuit ends once the target is farther than this
    pub chase_distance: f32,
    /// Seconds of pursuit before exhaustion, recovered while idle; 0 never tires
    pub stamina: f32,
    pub bite_damage: f32,
    /// Minimum time between two bites
    pub bite_cooldown: f32,
    /// Reach of a bite
    pub attack_distance: f32,
    /// Top speed of the mob's locomotion
    pub move_speed: f32,
    /// Points visited in order by the Patrol state; empty means wander
    pub patrol_points: Vec<Vec3>,
    /// Contact volume reporting trigger overlaps
    pub contact: Option<Cast>,
}

impl Default for MobProfile {
    fn default() -> Self {
        Self {
            species: String::from("Critter"),
            wander_distance: 8.0,
            max_walk_time: 6.0,
            idle_time: 3.0,
            detection: Cast::sphere(10.0, CategoryMask::PLAYER | CategoryMask::MOB),
            prey: Vec::new(),
            escape_max_distance: 15.0,
            max_chase_time: 10.0,
            player_has_max_chase_time: true,
            chase_distance: 20.0,
            stamina: 0.0,
            bite_damage: 5.0,
            bite_cooldown: 1.0,
            attack_distance: 1.5,
            move_speed: 3.5,
            patrol_points: Vec::new(),
            contact: None,
        }
    }
}

impl MobProfile {
    /// Profile for a species with default tuning
    #[must_use]
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Default::default()
        }
    }

    /// Add an accepted prey name
    #[must_use]
    pub fn hunting(mut self, prey: impl Into<String>) -> Self {
        self.prey.push(prey.into());
        self
    }

    /// Whether players are acceptable prey
    #[must_use]
    pub fn hunts_players(&self) -> bool {
        self.hunts(EntityKind::PLAYER_TAG)
    }

    /// Whether `type_name` is acceptable prey
    #[must_use]
    pub fn hunts(&self, type_name: &str) -> bool {
        self.prey.iter().any(|prey| prey == type_name)
    }

    /// Whether patrol points are configured
    #[must_use]
    pub fn patrols(&self) -> bool {
        !self.patrol_points.is_empty()
    }

    /// Reject values the behavior states cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite timers and distances,
    /// or invalid casts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::non_negative("wander_distance", self.wander_distance)?;
        ConfigError::non_negative("max_walk_time", self.max_walk_time)?;
        ConfigError::non_negative("idle_time", self.idle_time)?;
        ConfigError::non_negative("escape_max_distance", self.escape_max_distance)?;
        ConfigError::non_negative("max_chase_time", self.max_chase_time)?;
        ConfigError::non_negative("chase_distance", self.chase_distance)?;
        ConfigError::non_negative("stamina", self.stamina)?;
        ConfigError::non_negative("bite_damage", self.bite_damage)?;
        ConfigError::non_negative("bite_cooldown", self.bite_cooldown)?;
        ConfigError::non_negative("attack_distance", self.attack_distance)?;
        ConfigError::non_negative("move_speed", self.move_speed)?;
        ConfigError::cast("detection", self.detection.validate())?;
        if let Some(contact) = &self.contact {
            ConfigError::cast("contact", contact.validate())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prey_matching() {
        let wolf = MobProfile::new("Wolf").hunting("Player").hunting("Rabbit");

        assert!(wolf.hunts_players());
        assert!(wolf.hunts("Rabbit"));
        assert!(!wolf.hunts("Bear"));
        assert!(!MobProfile::new("Rabbit").hunts_players());
    }

    #[test]
    fn test_validate_rejects_negative_timer() {
        let profile = MobProfile {
            max_chase_time: -1.0,
            ..MobProfile::new("Wolf")
        };

        assert!(matches!(
            profile.validate(),
            Err(ConfigError::Negative {
                field: "max_chase_time",
                ..
            })
        ));
        assert!(MobProfile::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let profile: MobProfile =
            ron::from_str(r#"(species: "Boar", prey: ["Player"], idle_time: 1.5)"#).unwrap();

        assert_eq!(profile.species, "Boar");
        assert_eq!(profile.idle_time, 1.5);
        assert!(profile.hunts_players());
        assert_eq!(profile.bite_cooldown, MobProfile::default().bite_cooldown);
    }
}
