//! Scenario files
//!
//! A scenario lists the entities a simulation starts with. Saved and loaded
//! in RON (Rusty Object Notation) or JSON.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ability::AbilityDefinition;
use crate::core::SimConfig;
use crate::ecs::{BodyShape, Transform};
use crate::error::ConfigError;
use crate::mob::MobProfile;
use crate::physics::{Cast, CategoryMask};

/// What a blueprint spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlueprintKind {
    Player,
    Mob(MobProfile),
    Prop,
}

/// A serializable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Optional entity name
    #[serde(default)]
    pub name: Option<String>,
    pub kind: BlueprintKind,
    #[serde(default)]
    pub transform: Transform,
    /// Starting and maximum health; the kind's default when absent
    #[serde(default)]
    pub health: Option<f32>,
    /// Collision volume; the kind's default when absent
    #[serde(default)]
    pub body: Option<BodyShape>,
    /// Ability held from the start
    #[serde(default)]
    pub ability: Option<AbilityDefinition>,
}

impl Blueprint {
    /// Blueprint of `kind` at `position`
    #[must_use]
    pub fn new(kind: BlueprintKind, position: Vec3) -> Self {
        Self {
            name: None,
            kind,
            transform: Transform::from_position(position),
            health: None,
            body: None,
            ability: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_ability(mut self, ability: AbilityDefinition) -> Self {
        self.ability = Some(ability);
        self
    }
}

/// A serializable starting setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Scenario version for compatibility
    pub version: u32,
    #[serde(default)]
    pub config: SimConfig,
    /// All entities in the scenario
    pub entities: Vec<Blueprint>,
}

impl Scenario {
    /// Create a new empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            config: SimConfig::default(),
            entities: Vec::new(),
        }
    }

    /// Add an entity to the scenario
    pub fn add(&mut self, blueprint: Blueprint) -> usize {
        let index = self.entities.len();
        self.entities.push(blueprint);
        index
    }

    /// Parse a scenario from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Ron(e.to_string()))
    }

    /// Render the scenario as pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save the scenario to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Load a scenario from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save the scenario to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a scenario from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load by file extension: `.json` as JSON, anything else as RON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    /// Get the number of entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scenario is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Built-in meadow: a player with a bolt, a wolf on patrol and two rabbits
    #[must_use]
    pub fn demo() -> Self {
        let mut scenario = Self::new("Meadow");

        let bolt = AbilityDefinition::new("Bolt")
            .launched(12.0, 1.5)
            .with_casts(vec![Cast::sphere(1.0, CategoryMask::MOB | CategoryMask::PROP)]);
        scenario.add(
            Blueprint::new(BlueprintKind::Player, Vec3::ZERO)
                .named("Player")
                .with_ability(bolt),
        );

        let wolf = MobProfile {
            patrol_points: vec![Vec3::new(8.0, 0.0, 8.0), Vec3::new(-8.0, 0.0, 8.0)],
            idle_time: 1.0,
            contact: Some(Cast::sphere(1.2, CategoryMask::PLAYER | CategoryMask::MOB)),
            ..MobProfile::new("Wolf").hunting("Player").hunting("Rabbit")
        };
        scenario.add(
            Blueprint::new(BlueprintKind::Mob(wolf), Vec3::new(0.0, 0.0, 14.0)).named("Wolf"),
        );

        let rabbit = MobProfile {
            move_speed: 4.5,
            detection: Cast::sphere(6.0, CategoryMask::MOB),
            ..MobProfile::new("Rabbit")
        };
        for (i, x) in [-6.0, 5.0].into_iter().enumerate() {
            scenario.add(
                Blueprint::new(BlueprintKind::Mob(rabbit.clone()), Vec3::new(x, 0.0, 10.0))
                    .named(format!("Rabbit {}", i + 1)),
            );
        }

        scenario.add(
            Blueprint::new(BlueprintKind::Prop, Vec3::new(3.0, 0.0, -6.0)).named("Stump"),
        );
        scenario
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_serialization_ron() {
        let scenario = Scenario::demo();

        let ron_str = scenario.to_ron_string().unwrap();
        assert!(ron_str.contains("Wolf"));

        let loaded = Scenario::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_scenario_serialization_json() {
        let mut scenario = Scenario::new("JSON Test");
        scenario.add(Blueprint::new(BlueprintKind::Prop, Vec3::X).named("Crate"));

        let json_str = serde_json::to_string(&scenario).unwrap();

        let loaded: Scenario = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded.name, "JSON Test");
        assert_eq!(loaded.entities[0].name.as_deref(), Some("Crate"));
        assert_eq!(loaded.config, SimConfig::default());
    }

    #[test]
    fn test_minimal_ron() {
        let text = r#"(
            name: "Tiny",
            version: 1,
            entities: [
                (kind: Player),
                (kind: Mob((species: "Wolf", prey: ["Player"])), transform: (position: (0.0, 0.0, 5.0), rotation: (0.0, 0.0, 0.0, 1.0))),
            ],
        )"#;

        let scenario = Scenario::from_ron_str(text).unwrap();
        assert_eq!(scenario.entity_count(), 2);
        assert!(matches!(&scenario.entities[1].kind, BlueprintKind::Mob(p) if p.hunts_players()));
    }

    #[test]
    fn test_bad_ron_is_config_error() {
        assert!(matches!(
            Scenario::from_ron_str("(name: 3)"),
            Err(ConfigError::Ron(_))
        ));
    }
}
