//! Shape-cast queries against detectable entities, using rapier3d

use std::cell::Cell;

use glam::{Quat, Vec3};
use hecs::Entity;
use rapier3d::geometry::{Group, InteractionGroups};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::parry::shape::{Ball, Capsule, Cuboid, Shape};
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::DebugDraw;
use crate::ecs::{Body, BodyShape, Transform, World};
use crate::physics::{Cast, CastKind};

/// Entities returned by a cast, in query order
pub type Detection = SmallVec<[Entity; 8]>;

/// Convert glam Quat to rapier3d UnitQuaternion
fn quat_to_rapier(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn isometry(position: Vec3, rotation: Quat) -> Isometry<f32> {
    Isometry::from_parts(
        Translation3::new(position.x, position.y, position.z),
        quat_to_rapier(rotation),
    )
}

fn query_groups(cast: &Cast) -> InteractionGroups {
    InteractionGroups::new(Group::ALL, Group::from_bits_truncate(cast.mask.bits()))
}

fn body_groups(body: &Body) -> InteractionGroups {
    InteractionGroups::new(Group::from_bits_truncate(body.category.bits()), Group::ALL)
}

fn body_shape(shape: &BodyShape) -> SharedShape {
    match *shape {
        BodyShape::Sphere { radius } => SharedShape::ball(radius),
        BodyShape::Box { half_extents } => {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        BodyShape::Capsule {
            half_height,
            radius,
        } => SharedShape::capsule_y(half_height, radius),
    }
}

/// Spatial index of every detectable entity.
///
/// Colliders mirror entity transforms and are refreshed by [`SpatialIndex::sync`].
/// Queries are pure reads; invalid origins and degenerate casts yield
/// empty results rather than errors.
pub struct SpatialIndex {
    /// Physics pipeline, stepped only to refresh query structures
    pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase
    broad_phase: DefaultBroadPhase,
    /// Narrow phase
    narrow_phase: NarrowPhase,
    /// Rigid body set (entities are parentless colliders)
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,
    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,
    /// CCD solver
    ccd_solver: CCDSolver,
    /// Query pipeline for overlap and ray casts
    query_pipeline: QueryPipeline,
    /// Integration parameters
    integration_parameters: IntegrationParameters,
    /// Collider of each registered entity
    handles: FxHashMap<Entity, ColliderHandle>,
    /// Number of queries served, for diagnostics
    queries: Cell<u64>,
}

impl SpatialIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            handles: FxHashMap::default(),
            queries: Cell::new(0),
        }
    }

    /// Mirror the world: register new bodies, move existing ones and drop
    /// colliders of despawned entities.
    pub fn sync(&mut self, world: &World) {
        for (entity, (transform, body)) in world.query::<(&Transform, &Body)>().iter() {
            let pose = isometry(transform.position, transform.rotation);
            match self.handles.get(&entity) {
                Some(handle) => {
                    if let Some(collider) = self.collider_set.get_mut(*handle) {
                        collider.set_position(pose);
                        collider.set_collision_groups(body_groups(body));
                    }
                }
                None => {
                    let collider = ColliderBuilder::new(body_shape(&body.shape))
                        .position(pose)
                        .sensor(true)
                        .collision_groups(body_groups(body))
                        .user_data(u128::from(entity.to_bits().get()))
                        .build();
                    let handle = self.collider_set.insert(collider);
                    self.handles.insert(entity, handle);
                    log::trace!("registered {entity:?} with the spatial index");
                }
            }
        }

        let stale: Vec<Entity> = self
            .handles
            .keys()
            .copied()
            .filter(|entity| world.get::<Body>(*entity).is_err())
            .collect();
        for entity in stale {
            self.remove(entity);
        }

        self.refresh();
    }

    /// Drop an entity's collider
    pub fn remove(&mut self, entity: Entity) {
        if let Some(handle) = self.handles.remove(&entity) {
            self.collider_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                false,
            );
        }
    }

    /// Rebuild broad phase and query structures after collider changes
    fn refresh(&mut self) {
        self.pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Whether an entity is registered
    pub fn contains(&self, entity: Entity) -> bool {
        self.handles.contains_key(&entity)
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Total number of non-degenerate queries performed
    pub fn query_count(&self) -> u64 {
        self.queries.get()
    }

    fn entity_of(&self, handle: ColliderHandle) -> Option<Entity> {
        let collider = self.collider_set.get(handle)?;
        Entity::from_bits(u64::try_from(collider.user_data).ok()?)
    }

    /// Detect entities inside `cast`, performed from `origin`.
    ///
    /// `exclude` is typically the caster itself. Ray casts return at most
    /// the nearest hit.
    pub fn detect(&self, origin: &Transform, cast: &Cast, exclude: Option<Entity>) -> Detection {
        let mut found = Detection::new();
        if cast.is_degenerate() {
            return found;
        }
        self.queries.set(self.queries.get() + 1);

        let mut filter = QueryFilter::default().groups(query_groups(cast));
        if let Some(handle) = exclude.and_then(|entity| self.handles.get(&entity)) {
            filter = filter.exclude_collider(*handle);
        }

        let (center, rotation) = cast.world_pose(origin);
        let forward = rotation * Vec3::NEG_Z;

        match cast.kind {
            CastKind::Sphere => {
                let ball = Ball::new(cast.size);
                self.overlap(&isometry(center, rotation), &ball, filter, &mut found);
            }
            CastKind::Box => {
                let half = cast.box_size * 0.5;
                let cuboid = Cuboid::new(vector![half.x, half.y, half.z]);
                self.overlap(&isometry(center, rotation), &cuboid, filter, &mut found);
            }
            CastKind::Capsule => {
                let end = center + forward * cast.size;
                let capsule = Capsule::new(
                    point![center.x, center.y, center.z],
                    point![end.x, end.y, end.z],
                    cast.radius,
                );
                self.overlap(&Isometry::identity(), &capsule, filter, &mut found);
            }
            CastKind::Ray => {
                let ray = Ray::new(
                    point![center.x, center.y, center.z],
                    vector![forward.x, forward.y, forward.z],
                );
                let hit = self.query_pipeline.cast_ray(
                    &self.rigid_body_set,
                    &self.collider_set,
                    &ray,
                    cast.size,
                    true,
                    filter,
                );
                if let Some(entity) = hit.and_then(|(handle, _)| self.entity_of(handle)) {
                    found.push(entity);
                }
            }
        }

        found
    }

    /// Detect from an entity's own transform.
    ///
    /// Returns an empty result when the origin entity has no transform.
    pub fn detect_from(&self, world: &World, origin: Entity, cast: &Cast) -> Detection {
        match world.transform(origin) {
            Some(transform) => self.detect(&transform, cast, Some(origin)),
            None => Detection::new(),
        }
    }

    /// [`SpatialIndex::detect`] that also reports the volume to a debug hook
    pub fn detect_traced(
        &self,
        origin: &Transform,
        cast: &Cast,
        exclude: Option<Entity>,
        debug: &mut dyn DebugDraw,
    ) -> Detection {
        let found = self.detect(origin, cast, exclude);
        debug.draw_cast(origin, cast, found.len());
        found
    }

    fn overlap(
        &self,
        pose: &Isometry<f32>,
        shape: &dyn Shape,
        filter: QueryFilter,
        found: &mut Detection,
    ) {
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            pose,
            shape,
            filter,
            |handle| {
                if let Some(entity) = self.entity_of(handle) {
                    found.push(entity);
                }
                true
            },
        );
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::CategoryMask;

    fn spawn_ball(world: &mut World, position: Vec3, category: CategoryMask) -> Entity {
        world.spawn((
            Transform::from_position(position),
            Body {
                shape: BodyShape::Sphere { radius: 0.5 },
                category,
            },
        ))
    }

    fn scene() -> (World, SpatialIndex, [Entity; 3]) {
        let mut world = World::new();
        let near = spawn_ball(&mut world, Vec3::new(0.0, 0.0, -3.0), CategoryMask::MOB);
        let far = spawn_ball(&mut world, Vec3::new(0.0, 0.0, -12.0), CategoryMask::MOB);
        let player = spawn_ball(&mut world, Vec3::new(2.0, 0.0, 0.0), CategoryMask::PLAYER);
        let mut index = SpatialIndex::new();
        index.sync(&world);
        (world, index, [near, far, player])
    }

    #[test]
    fn test_sphere_respects_radius_and_mask() {
        let (_, index, [near, far, player]) = scene();
        let origin = Transform::default();

        let mobs = index.detect(&origin, &Cast::sphere(5.0, CategoryMask::MOB), None);
        assert_eq!(mobs.as_slice(), &[near]);

        let everyone = index.detect(&origin, &Cast::sphere(5.0, CategoryMask::ALL), None);
        assert!(everyone.contains(&near));
        assert!(everyone.contains(&player));
        assert!(!everyone.contains(&far));
    }

    #[test]
    fn test_ray_returns_nearest_only() {
        let (_, index, [near, _, _]) = scene();
        let hits = index.detect(
            &Transform::default(),
            &Cast::ray(50.0, CategoryMask::ALL),
            None,
        );

        assert_eq!(hits.as_slice(), &[near]);
    }

    #[test]
    fn test_capsule_reaches_along_forward() {
        let (_, index, [near, far, player]) = scene();
        let hits = index.detect(
            &Transform::default(),
            &Cast::capsule(15.0, 0.5, CategoryMask::ALL),
            None,
        );

        assert!(hits.contains(&near));
        assert!(hits.contains(&far));
        assert!(!hits.contains(&player));
    }

    #[test]
    fn test_box_uses_half_extents() {
        let (_, index, [near, _, player]) = scene();
        let cast = Cast::cuboid(Vec3::new(2.0, 2.0, 2.0), CategoryMask::ALL)
            .with_offset(Vec3::new(0.0, 0.0, -3.0));

        let hits = index.detect(&Transform::default(), &cast, None);

        assert_eq!(hits.as_slice(), &[near]);
        assert!(!hits.contains(&player));
    }

    #[test]
    fn test_degenerate_casts_are_empty() {
        let (_, index, _) = scene();
        let origin = Transform::default();

        assert!(index
            .detect(&origin, &Cast::sphere(0.0, CategoryMask::ALL), None)
            .is_empty());
        assert!(index
            .detect(&origin, &Cast::sphere(50.0, CategoryMask::NONE), None)
            .is_empty());
        assert_eq!(index.query_count(), 0);
    }

    #[test]
    fn test_exclude_and_invalid_origin() {
        let (mut world, index, [near, _, _]) = scene();
        let cast = Cast::sphere(1.0, CategoryMask::ALL);

        assert!(index.detect_from(&world, near, &cast).is_empty());

        world.despawn(near).unwrap();
        assert!(index.detect_from(&world, near, &cast).is_empty());
    }

    #[test]
    fn test_sync_drops_despawned_entities() {
        let (mut world, mut index, [near, _, _]) = scene();
        assert_eq!(index.len(), 3);

        world.despawn(near).unwrap();
        index.sync(&world);

        assert_eq!(index.len(), 2);
        assert!(!index.contains(near));
    }

    #[test]
    fn test_sync_follows_moved_entities() {
        let (mut world, mut index, [near, _, _]) = scene();
        if let Ok(mut transform) = world.get_mut::<Transform>(near) {
            transform.position = Vec3::new(30.0, 0.0, 0.0);
        }
        index.sync(&world);

        let hits = index.detect(
            &Transform::default(),
            &Cast::sphere(5.0, CategoryMask::MOB),
            None,
        );
        assert!(hits.is_empty());
    }
}
