//! Casts read back from config must detect exactly what they did before

use wildwood::ecs::Body;
use wildwood::hecs::Entity;
use wildwood::prelude::*;

fn body(kind: EntityKind) -> Body {
    Body {
        shape: BodyShape::default(),
        category: kind.category(),
    }
}

/// A caster at the origin facing -Z, surrounded by a mix of entities
fn scene() -> (World, SpatialIndex, Entity) {
    let mut world = World::new();
    let caster = world.spawn((Transform::default(), body(EntityKind::Player)));

    let mob = EntityKind::Mob {
        species: "Rabbit".into(),
    };
    for (x, z) in [(0.0, -3.0), (1.5, -6.0), (-4.0, -2.0), (0.0, 4.0), (6.0, -6.0)] {
        world.spawn((
            Transform::from_position(Vec3::new(x, 0.0, z)),
            body(mob.clone()),
        ));
    }
    for (x, z) in [(0.2, -4.5), (-1.0, -8.0)] {
        world.spawn((
            Transform::from_position(Vec3::new(x, 0.0, z)),
            body(EntityKind::Prop),
        ));
    }

    let mut spatial = SpatialIndex::new();
    spatial.sync(&world);
    (world, spatial, caster)
}

fn casts() -> Vec<Cast> {
    vec![
        Cast::sphere(4.5, CategoryMask::MOB | CategoryMask::PROP),
        Cast::capsule(7.0, 1.0, CategoryMask::MOB).with_offset(Vec3::new(0.5, 0.0, 0.0)),
        Cast::cuboid(Vec3::new(4.0, 2.0, 6.0), CategoryMask::PROP | CategoryMask::MOB)
            .with_offset(Vec3::new(0.0, 0.0, -5.0))
            .with_rotation(Quat::from_rotation_y(0.3)),
        Cast::ray(20.0, CategoryMask::PROP),
    ]
}

fn detect_sorted(spatial: &SpatialIndex, world: &World, caster: Entity, cast: &Cast) -> Vec<Entity> {
    let mut found = spatial.detect_from(world, caster, cast).to_vec();
    found.sort();
    found
}

#[test]
fn test_ron_roundtrip_detects_the_same_entities() {
    let (world, spatial, caster) = scene();

    for cast in casts() {
        let text = ron::to_string(&cast).unwrap();
        let loaded: Cast = ron::from_str(&text).unwrap();

        assert_eq!(loaded, cast);
        let before = detect_sorted(&spatial, &world, caster, &cast);
        assert!(!before.is_empty(), "{cast:?} found nothing");
        assert_eq!(detect_sorted(&spatial, &world, caster, &loaded), before);
    }
}

#[test]
fn test_json_roundtrip_detects_the_same_entities() {
    let (world, spatial, caster) = scene();

    for cast in casts() {
        let text = serde_json::to_string(&cast).unwrap();
        let loaded: Cast = serde_json::from_str(&text).unwrap();

        assert_eq!(
            detect_sorted(&spatial, &world, caster, &loaded),
            detect_sorted(&spatial, &world, caster, &cast)
        );
    }
}

#[test]
fn test_mask_filters_categories() {
    let (world, spatial, caster) = scene();

    let props = detect_sorted(&spatial, &world, caster, &Cast::sphere(50.0, CategoryMask::PROP));
    let everything = detect_sorted(&spatial, &world, caster, &Cast::sphere(50.0, CategoryMask::ALL));

    assert_eq!(props.len(), 2);
    // Caster excluded
    assert_eq!(everything.len(), 7);
}

#[test]
fn test_ray_stops_at_nearest() {
    let (world, spatial, caster) = scene();

    let hits = detect_sorted(&spatial, &world, caster, &Cast::ray(20.0, CategoryMask::ALL));
    let nearest = world
        .query::<&Transform>()
        .iter()
        .find(|(_, t)| t.position == Vec3::new(0.0, 0.0, -3.0))
        .map(|(e, _)| e);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits.first().copied(), nearest);
}
