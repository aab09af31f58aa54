//! Simulation driver and fixed-step tick loop

use hecs::Entity;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::ability::{self, AbilityDefinition, AbilityHolder, AbilitySlot, AbilityStateKey};
use crate::ai::SteeringAgent;
use crate::core::scenario::{Blueprint, BlueprintKind, Scenario};
use crate::core::{Command, CommandBuffer, DebugOverlay, EventQueue, Frame, GameEvent, Time};
use crate::ecs::{
    AttributeKind, Attributes, Body, BodyShape, EntityKind, Name, Transform, Velocity, World,
};
use crate::error::SimError;
use crate::input::Input;
use crate::mob::{self, MobBrain, MobMemory, MobProfile, MobStateKey};
use crate::physics::{CastKind, SpatialIndex, TriggerEvent, TriggerVolume};

const PLAYER_HEALTH: f32 = 100.0;
const MOB_HEALTH: f32 = 50.0;
const PROP_HEALTH: f32 = 30.0;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed of the simulation RNG
    pub seed: u64,
    /// Tick length used by [`Simulation::run`]
    pub fixed_dt: f32,
    /// Record cast gizmos in the debug overlay
    pub debug_draw: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            fixed_dt: 1.0 / 60.0,
            debug_draw: false,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the fixed tick length
    pub fn with_fixed_dt(mut self, dt: f32) -> Self {
        self.fixed_dt = dt;
        self
    }

    /// Enable or disable cast gizmos
    pub fn with_debug_draw(mut self, enabled: bool) -> Self {
        self.debug_draw = enabled;
        self
    }
}

/// Owns the world and runs every machine once per tick.
///
/// Each `tick` runs, in order: spatial sync, trigger tracking, mob brains,
/// ability holders, command application, locomotion, input clear and event
/// swap. After `tick` returns, `events` holds exactly that tick's events.
pub struct Simulation {
    config: SimConfig,
    /// ECS world
    pub world: World,
    /// Spatial index mirrored from the world
    pub spatial: SpatialIndex,
    /// Events of the last completed tick
    pub events: EventQueue,
    /// Input state read by ability machines
    pub input: Input,
    /// Cast gizmos and debug text
    pub debug: DebugOverlay,
    time: Time,
    commands: CommandBuffer,
    rng: StdRng,
    triggers: Vec<TriggerEvent>,
}

impl Simulation {
    /// Create an empty simulation
    pub fn new(config: SimConfig) -> Self {
        log::info!("Starting simulation (seed {:#x})", config.seed);
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            debug: DebugOverlay::new(config.debug_draw),
            config,
            world: World::new(),
            spatial: SpatialIndex::new(),
            events: EventQueue::new(),
            input: Input::new(),
            time: Time::new(),
            commands: CommandBuffer::new(),
            triggers: Vec::new(),
        }
    }

    /// Create a simulation populated from a scenario
    ///
    /// # Errors
    ///
    /// Returns an error if any blueprint fails to spawn
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, SimError> {
        let mut sim = Self::new(scenario.config.clone());
        sim.load_scenario(scenario)?;
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Spawn every blueprint of `scenario`, in order
    ///
    /// # Errors
    ///
    /// Returns an error if any blueprint fails to spawn
    pub fn load_scenario(&mut self, scenario: &Scenario) -> Result<Vec<Entity>, SimError> {
        log::info!(
            "Loading scenario `{}` ({} entities)",
            scenario.name,
            scenario.entity_count()
        );
        scenario
            .entities
            .iter()
            .map(|blueprint| self.spawn_blueprint(blueprint))
            .collect()
    }

    /// Spawn one blueprint
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid profile or ability
    pub fn spawn_blueprint(&mut self, blueprint: &Blueprint) -> Result<Entity, SimError> {
        let transform = blueprint.transform;
        let entity = match &blueprint.kind {
            BlueprintKind::Player => self.spawn_player(transform),
            BlueprintKind::Mob(profile) => self.spawn_mob(profile.clone(), transform)?,
            BlueprintKind::Prop => {
                self.spawn_prop(transform, blueprint.body.unwrap_or_default())
            }
        };

        if let Some(health) = blueprint.health {
            self.set_health(entity, health)?;
        }
        if let Some(shape) = blueprint.body
            && let Ok(mut body) = self.world.get_mut::<Body>(entity)
        {
            body.shape = shape;
        }
        if let Some(name) = &blueprint.name {
            self.world.insert(entity, (Name::new(name.clone()),)).ok();
        }
        if let Some(ability) = &blueprint.ability {
            self.give_ability(entity, ability.clone())?;
        }
        Ok(entity)
    }

    /// Spawn a player
    pub fn spawn_player(&mut self, transform: Transform) -> Entity {
        let entity = self.world.spawn((
            transform,
            Velocity::default(),
            EntityKind::Player,
            Body {
                shape: BodyShape::default(),
                category: EntityKind::Player.category(),
            },
            Attributes::with_health(PLAYER_HEALTH),
        ));
        log::debug!("Spawned player {entity:?}");
        entity
    }

    /// Spawn a mob driven by `profile`
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid
    pub fn spawn_mob(&mut self, profile: MobProfile, transform: Transform) -> Result<Entity, SimError> {
        let attributes = Attributes::with_health(MOB_HEALTH)
            .with(AttributeKind::Speed, profile.move_speed)
            .with(AttributeKind::DetectionRadius, detection_reach(&profile))
            .with(AttributeKind::ChaseDistance, profile.chase_distance)
            .with(AttributeKind::EscapeDistance, profile.escape_max_distance)
            .with(AttributeKind::Stamina, profile.stamina);
        let kind = EntityKind::Mob {
            species: profile.species.clone(),
        };
        let body = Body {
            shape: BodyShape::default(),
            category: kind.category(),
        };
        let agent = SteeringAgent::new(attributes.max(AttributeKind::Speed));
        let contact = profile.contact.map(TriggerVolume::new);
        let species = profile.species.clone();
        let brain = MobBrain::new(profile)?;

        let entity = self.world.spawn((
            transform,
            Velocity::default(),
            kind,
            body,
            attributes,
            agent,
            brain,
        ));
        if let Some(contact) = contact {
            self.world.insert(entity, (contact,)).ok();
        }
        log::debug!("Spawned mob {entity:?} ({species})");
        Ok(entity)
    }

    /// Spawn a destructible prop
    pub fn spawn_prop(&mut self, transform: Transform, shape: BodyShape) -> Entity {
        self.world.spawn((
            transform,
            EntityKind::Prop,
            Body {
                shape,
                category: EntityKind::Prop.category(),
            },
            Attributes::with_health(PROP_HEALTH),
        ))
    }

    /// Reset an entity's health to a new maximum
    ///
    /// # Errors
    ///
    /// Returns an error if the entity has no attributes
    pub fn set_health(&mut self, entity: Entity, health: f32) -> Result<(), SimError> {
        let mut attributes = self
            .world
            .get_mut::<Attributes>(entity)
            .map_err(|_| SimError::MissingComponent {
                entity,
                component: "Attributes",
            })?;
        *attributes = attributes.clone().with(AttributeKind::Health, health);
        Ok(())
    }

    /// Pick up an ability, replacing any held one
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid definition or a missing entity
    pub fn give_ability(&mut self, entity: Entity, definition: AbilityDefinition) -> Result<(), SimError> {
        if let Ok(mut holder) = self.world.get_mut::<AbilityHolder>(entity) {
            holder.slot.acquire(definition)?;
            return Ok(());
        }
        let holder = AbilityHolder::with_definition(definition)?;
        self.world
            .insert(entity, (holder,))
            .map_err(|_| SimError::NoSuchEntity(entity))
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.time.begin_tick(dt);
        if self.debug.enabled {
            self.debug.clear();
        }

        self.spatial.sync(&self.world);
        self.track_triggers();

        {
            let mut frame = self.frame();
            mob::update_mobs(&mut frame);
            ability::update_abilities(&mut frame);
        }

        self.apply_commands();
        self.move_agents();

        self.input.update();
        self.events.swap();
        self.time.end_tick();
    }

    /// Run `ticks` fixed-length ticks
    pub fn run(&mut self, ticks: u32) {
        let dt = self.config.fixed_dt;
        for _ in 0..ticks {
            self.tick(dt);
        }
    }

    fn frame(&mut self) -> Frame<'_> {
        Frame {
            world: &self.world,
            spatial: &self.spatial,
            time: &self.time,
            input: &self.input,
            rng: &mut self.rng,
            commands: &mut self.commands,
            events: &mut self.events,
            debug: &mut self.debug,
        }
    }

    /// Diff trigger overlaps and forward them to the owners' machines
    fn track_triggers(&mut self) {
        let mut triggers = std::mem::take(&mut self.triggers);
        triggers.clear();

        for (entity, (transform, volume)) in self
            .world
            .query_mut::<(&Transform, &mut TriggerVolume)>()
        {
            volume.refresh(entity, transform, &self.spatial, &mut triggers);
        }

        if !triggers.is_empty() {
            let mut frame = self.frame();
            for trigger in &triggers {
                mob::dispatch_trigger(&mut frame, trigger.owner, trigger.phase, trigger.other);
            }
        }
        self.triggers = triggers;
    }

    /// Apply queued cross-entity writes, then remove the dead
    fn apply_commands(&mut self) {
        let mut destroyed: Vec<(Entity, Option<Entity>)> = Vec::new();

        for command in self.commands.drain() {
            match command {
                Command::Damage {
                    target,
                    amount,
                    source,
                } => {
                    let Ok(mut attributes) = self.world.get_mut::<Attributes>(target) else {
                        log::trace!("damage to {target:?} dropped: no attributes");
                        continue;
                    };
                    if !attributes.is_alive() {
                        continue;
                    }
                    let dealt = attributes.apply_damage(amount);
                    let died = !attributes.is_alive();
                    drop(attributes);

                    self.events.push(GameEvent::EntityDamaged {
                        entity: target,
                        amount: dealt,
                        source,
                    });
                    if died {
                        destroyed.push((target, source));
                    }
                }
                Command::Heal {
                    target,
                    amount,
                    source,
                } => {
                    let Ok(mut attributes) = self.world.get_mut::<Attributes>(target) else {
                        continue;
                    };
                    let healed = attributes.heal(amount);
                    drop(attributes);
                    self.events.push(GameEvent::EntityHealed {
                        entity: target,
                        amount: healed,
                        source,
                    });
                }
                Command::NotifyPredator { prey, predator } => {
                    if let Ok(mut brain) = self.world.get_mut::<MobBrain>(prey) {
                        log::debug!("{prey:?} is hunted by {predator:?}");
                        brain.memory.predator = Some(predator);
                    }
                }
            }
        }

        for (entity, destroyer) in destroyed {
            if self.world.despawn(entity).is_ok() {
                log::info!("{entity:?} destroyed by {destroyer:?}");
                self.spatial.remove(entity);
                self.events
                    .push(GameEvent::EntityDestroyed { entity, destroyer });
            }
        }
    }

    fn move_agents(&mut self) {
        let dt = self.time.delta_seconds();
        for (_, (transform, velocity, agent)) in self
            .world
            .query_mut::<(&mut Transform, &mut Velocity, &mut SteeringAgent)>()
        {
            agent.step(transform, velocity, dt);
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Active state of a mob's machine
    pub fn mob_state(&self, entity: Entity) -> Option<MobStateKey> {
        self.world.get::<MobBrain>(entity).ok().map(|brain| brain.state())
    }

    /// Active state of an entity's ability machine
    pub fn ability_state(&self, entity: Entity) -> Option<AbilityStateKey> {
        self.world
            .get::<AbilityHolder>(entity)
            .ok()
            .map(|holder| holder.state())
    }

    /// Copy of a mob's memory
    pub fn mob_memory(&self, entity: Entity) -> Option<MobMemory> {
        self.world
            .get::<MobBrain>(entity)
            .ok()
            .map(|brain| brain.memory.clone())
    }

    /// Copy of an entity's ability slot
    pub fn ability_slot(&self, entity: Entity) -> Option<AbilitySlot> {
        self.world
            .get::<AbilityHolder>(entity)
            .ok()
            .map(|holder| holder.slot.clone())
    }

    /// Current health, if the entity has attributes
    pub fn health(&self, entity: Entity) -> Option<f32> {
        self.world
            .get::<Attributes>(entity)
            .ok()
            .map(|attributes| attributes.current(AttributeKind::Health))
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Farthest distance the detection cast can reach
fn detection_reach(profile: &MobProfile) -> f32 {
    let cast = &profile.detection;
    match cast.kind {
        CastKind::Sphere | CastKind::Ray => cast.size,
        CastKind::Capsule => cast.size + cast.radius,
        CastKind::Box => cast.box_size.length() * 0.5,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_config_builders() {
        let config = SimConfig::default()
            .with_seed(7)
            .with_fixed_dt(0.5)
            .with_debug_draw(true);

        assert_eq!(config.seed, 7);
        assert_eq!(config.fixed_dt, 0.5);
        assert!(config.debug_draw);
    }

    #[test]
    fn test_invalid_mob_is_not_spawned() {
        let mut sim = Simulation::default();
        let profile = MobProfile {
            idle_time: -1.0,
            ..MobProfile::new("Wolf")
        };

        assert!(sim.spawn_mob(profile, Transform::default()).is_err());
        assert!(sim.world.is_empty());
    }

    #[test]
    fn test_lethal_damage_despawns() {
        let mut sim = Simulation::default();
        let prop = sim.spawn_prop(Transform::default(), BodyShape::default());
        sim.commands.push(Command::Damage {
            target: prop,
            amount: 1000.0,
            source: None,
        });

        sim.apply_commands();
        sim.events.swap();

        assert!(!sim.world.contains(prop));
        assert!(sim.events.iter().any(|e| matches!(
            e,
            GameEvent::EntityDestroyed { entity, .. } if *entity == prop
        )));
    }

    #[test]
    fn test_mob_wanders_after_idle_time() {
        let mut sim = Simulation::default();
        let profile = MobProfile {
            idle_time: 0.5,
            ..MobProfile::new("Deer")
        };
        let deer = sim
            .spawn_mob(profile, Transform::from_position(Vec3::ZERO))
            .unwrap();

        sim.tick(0.25);
        assert_eq!(sim.mob_state(deer), Some(MobStateKey::Idle));

        sim.tick(0.25);
        sim.tick(0.25);
        assert_eq!(sim.mob_state(deer), Some(MobStateKey::Moving));
        assert!(sim
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::StateChanged { to: "Moving", .. })));
    }

    #[test]
    fn test_give_ability_replaces() {
        let mut sim = Simulation::default();
        let player = sim.spawn_player(Transform::default());

        sim.give_ability(player, AbilityDefinition::new("Rock")).unwrap();
        sim.give_ability(player, AbilityDefinition::new("Stick")).unwrap();

        let slot = sim.ability_slot(player).unwrap();
        assert_eq!(slot.definition().map(|d| d.name.as_str()), Some("Stick"));
        assert_eq!(sim.ability_state(player), Some(AbilityStateKey::Ready));
    }
}
