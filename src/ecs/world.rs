//! World wrapper around hecs

use hecs::Entity;

use crate::ecs::{Attributes, Transform};

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Add components to an existing entity
    pub fn insert(
        &mut self,
        entity: Entity,
        components: impl hecs::DynamicBundle,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert(entity, components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Borrow a component mutably through a shared world.
    ///
    /// Borrows are checked at runtime per archetype column, so the caller
    /// must not hold another borrow of `T` in the same archetype.
    pub fn borrow_mut<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Whether an entity exists and, if it has attributes, is still alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        if !self.inner.contains(entity) {
            return false;
        }
        self.get::<Attributes>(entity)
            .map_or(true, |attrs| attrs.is_alive())
    }

    /// Copy of an entity's transform, if it has one
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<Transform>(entity).ok().map(|t| *t)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_follows_health_and_despawn() {
        let mut world = World::new();
        let healthy = world.spawn((Attributes::with_health(5.0),));
        let dead = world.spawn((Attributes::with_health(0.0),));
        let prop = world.spawn((Transform::default(),));

        assert!(world.is_alive(healthy));
        assert!(!world.is_alive(dead));
        assert!(world.is_alive(prop));

        world.despawn(healthy).unwrap();
        assert!(!world.is_alive(healthy));
    }

    #[test]
    fn test_borrow_mut_through_shared_world() {
        let mut world = World::new();
        let a = world.spawn((Attributes::with_health(5.0), Transform::default()));

        {
            let shared = &world;
            let mut attrs = shared.borrow_mut::<Attributes>(a).unwrap();
            attrs.apply_damage(2.0);
            // A different component type can be read while attributes are borrowed
            assert!(shared.transform(a).is_some());
        }

        assert_eq!(
            world
                .get::<Attributes>(a)
                .unwrap()
                .current(crate::ecs::AttributeKind::Health),
            3.0
        );
    }
}
