use std::collections::HashSet;

use bevy::{
    ecs::entity::EntityHashMap,
    prelude::*,
};
use bevy_snapshot::{
    Error,
    prelude::*,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Component, NamedComponent, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
struct Position {
    x: i32,
    y: i32,
}

#[derive(Component, NamedComponent, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
struct Velocity {
    dx: i32,
    dy: i32,
}

#[derive(Component, NamedComponent, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[snapshot(name = "label")]
struct Label(String);

#[derive(Component, Serialize, Deserialize, Default, Debug, PartialEq)]
struct Unregistered(u8);

fn registry() -> ComponentRegistry {
    let mut builder = ComponentRegistry::builder();
    builder
        .register_set::<(Position, Velocity, Label)>()
        .unwrap();
    builder.build()
}

fn save_entity<F: Format>(
    world: &World,
    registry: &ComponentRegistry,
    entity: Entity,
    filter: impl Fn(&str) -> bool,
) -> Vec<u8> {
    let mut buf = Vec::new();

    {
        let mut archive = F::writer(&mut buf);

        SnapshotWriter::new(world)
            .registry(registry)
            .filter(filter)
            .save_entity(&mut *archive, entity)
            .unwrap();

        archive.finish().unwrap();
    }

    buf
}

fn save_world<F: Format>(world: &World, registry: &ComponentRegistry) -> Vec<u8> {
    let mut buf = Vec::new();

    {
        let mut archive = F::writer(&mut buf);

        SnapshotWriter::new(world)
            .registry(registry)
            .save_world(&mut *archive)
            .unwrap();

        archive.finish().unwrap();
    }

    buf
}

fn round_trip<F: Format>() {
    let registry = registry();
    let mut world = World::new();

    let source = world
        .spawn((
            Position { x: 1, y: 2 },
            Velocity { dx: -3, dy: 4 },
            Label("hero".into()),
        ))
        .id();

    let buf = save_entity::<F>(&world, &registry, source, accept_all);
    let target = world.spawn_empty().id();

    let mut archive = F::reader(&*buf).unwrap();

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .load_into(&mut *archive, target)
        .unwrap();

    assert_eq!(world.get::<Position>(target), Some(&Position { x: 1, y: 2 }));
    assert_eq!(
        world.get::<Velocity>(target),
        Some(&Velocity { dx: -3, dy: 4 })
    );
    assert_eq!(world.get::<Label>(target), Some(&Label("hero".into())));
}

#[test]
fn test_round_trip_binary() {
    round_trip::<RMPFormat>();
}

#[test]
fn test_round_trip_text() {
    round_trip::<JSONFormat>();
}

#[test]
fn test_position_scenario() {
    let registry = registry();
    let mut world = World::new();

    let source = world.spawn(Position { x: 1, y: 2 }).id();
    let buf = save_entity::<RMPFormat>(&world, &registry, source, accept_all);

    let target = world.spawn_empty().id();
    let mut archive = BinaryReader::new(&*buf);

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .load_into(&mut archive, target)
        .unwrap();

    assert_eq!(world.get::<Position>(target), Some(&Position { x: 1, y: 2 }));
}

#[test]
fn test_save_filter() {
    let registry = registry();
    let mut world = World::new();

    let source = world
        .spawn((Position { x: 5, y: 6 }, Velocity { dx: 1, dy: 1 }))
        .id();

    let buf = save_entity::<RMPFormat>(&world, &registry, source, |name| name != "velocity");

    let target = world.spawn_empty().id();
    let mut archive = BinaryReader::new(&*buf);

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .load_into(&mut archive, target)
        .unwrap();

    assert_eq!(world.get::<Position>(target), Some(&Position { x: 5, y: 6 }));
    assert!(world.get::<Velocity>(target).is_none());
}

fn load_filter_keeps_position<F: Format>() {
    let registry = registry();
    let mut world = World::new();

    let source = world
        .spawn((
            Position { x: 1, y: 1 },
            Velocity { dx: 2, dy: 2 },
            Label("skipped".into()),
        ))
        .id();

    let mut buf = Vec::new();

    {
        let mut archive = F::writer(&mut buf);

        SnapshotWriter::new(&world)
            .registry(&registry)
            .save_entity(&mut *archive, source)
            .unwrap();

        archive.field("sentinel", &42u32).unwrap();
        archive.finish().unwrap();
    }

    let target = world.spawn_empty().id();
    let mut archive = F::reader(&*buf).unwrap();

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .filter(|name| name == "velocity")
        .load_into(&mut *archive, target)
        .unwrap();

    assert!(world.get::<Position>(target).is_none());
    assert!(world.get::<Label>(target).is_none());
    assert_eq!(
        world.get::<Velocity>(target),
        Some(&Velocity { dx: 2, dy: 2 })
    );

    // Filtered components were still consumed.
    assert_eq!(archive.field::<u32>(Some("sentinel")).unwrap(), 42);
}

#[test]
fn test_load_filter_binary() {
    load_filter_keeps_position::<RMPFormat>();
}

#[test]
fn test_load_filter_text() {
    load_filter_keeps_position::<JSONFormat>();
}

#[test]
fn test_empty_record() {
    let registry = registry();
    let mut world = World::new();

    let source = world.spawn_empty().id();

    let record = SnapshotWriter::new(&world)
        .registry(&registry)
        .record(source)
        .unwrap();

    assert_eq!(record.entity, source);
    assert!(record.components.is_empty());

    let buf = save_entity::<JSONFormat>(&world, &registry, source, accept_all);
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(value["e_count"], 1);
    assert_eq!(
        value[source.to_bits().to_string()]["components"],
        serde_json::json!([])
    );

    let target = world.spawn(Position { x: 0, y: 0 }).id();
    let mut archive = JSONFormat::reader(&*buf).unwrap();

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .load_into(&mut *archive, target)
        .unwrap();

    assert_eq!(world.get::<Position>(target), Some(&Position { x: 0, y: 0 }));
}

#[test]
fn test_unregistered_on_save_is_skipped() {
    let registry = registry();
    let mut world = World::new();

    let source = world
        .spawn((Position { x: 3, y: 4 }, Unregistered(7)))
        .id();

    let record = SnapshotWriter::new(&world)
        .registry(&registry)
        .record(source)
        .unwrap();

    let names = record
        .components
        .iter()
        .map(|value| value.name())
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["position"]);

    let buf = save_entity::<RMPFormat>(&world, &registry, source, accept_all);

    let target = world.spawn_empty().id();
    let mut archive = BinaryReader::new(&*buf);

    SnapshotReader::new(&mut world)
        .registry(&registry)
        .load_into(&mut archive, target)
        .unwrap();

    assert_eq!(world.get::<Position>(target), Some(&Position { x: 3, y: 4 }));
    assert!(world.get::<Unregistered>(target).is_none());
}

#[test]
fn test_unregistered_on_load_fails() {
    let registry = registry();
    let mut world = World::new();

    let source = world.spawn(Velocity { dx: 1, dy: 2 }).id();
    let buf = save_entity::<JSONFormat>(&world, &registry, source, accept_all);

    let mut builder = ComponentRegistry::builder();
    builder.register_named::<Position>().unwrap();
    let partial = builder.build();

    let target = world.spawn_empty().id();
    let mut archive = JSONFormat::reader(&*buf).unwrap();

    let result = SnapshotReader::new(&mut world)
        .registry(&partial)
        .load_into(&mut *archive, target);

    match result {
        Err(Error::Lookup { name }) => assert_eq!(name, "velocity"),
        other => panic!("expected a lookup error, got {other:?}"),
    }

    assert!(world.get::<Velocity>(target).is_none());
}

#[test]
fn test_missing_registry() {
    let mut world = World::new();
    let entity = world.spawn(Position { x: 1, y: 1 }).id();

    let mut archive = BinaryWriter::new(Vec::new());

    assert!(matches!(
        SnapshotWriter::new(&world).save_entity(&mut archive, entity),
        Err(Error::MissingRegistry)
    ));
}

#[test]
fn test_missing_source_entity() {
    let registry = registry();
    let mut world = World::new();

    let entity = world.spawn_empty().id();
    world.despawn(entity);

    let mut archive = BinaryWriter::new(Vec::new());

    assert!(matches!(
        SnapshotWriter::new(&world)
            .registry(&registry)
            .save_entity(&mut archive, entity),
        Err(Error::MissingEntity { .. })
    ));
}

#[test]
fn test_load_into_missing_target() {
    let registry = registry();
    let mut world = World::new();

    let source = world.spawn(Position { x: 1, y: 1 }).id();
    let buf = save_entity::<RMPFormat>(&world, &registry, source, accept_all);

    let target = world.spawn_empty().id();
    world.despawn(target);

    let mut archive = BinaryReader::new(&*buf);

    assert!(matches!(
        SnapshotReader::new(&mut world)
            .registry(&registry)
            .load_into(&mut archive, target),
        Err(Error::MissingEntity { .. })
    ));
}

#[test]
fn test_load_into_without_records() {
    let registry = registry();
    let mut world = World::new();

    let mut buf = Vec::new();

    {
        let mut archive = BinaryWriter::new(&mut buf);
        let archive: &mut dyn ArchiveWriter = &mut archive;

        archive.field("e_count", &0u64).unwrap();
        archive.finish().unwrap();
    }

    let target = world.spawn_empty().id();
    let mut archive = BinaryReader::new(&*buf);

    assert!(matches!(
        SnapshotReader::new(&mut world)
            .registry(&registry)
            .load_into(&mut archive, target),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_truncated_archive() {
    let registry = registry();
    let mut world = World::new();

    let source = world.spawn(Position { x: 1, y: 1 }).id();
    let buf = save_entity::<RMPFormat>(&world, &registry, source, accept_all);

    let target = world.spawn_empty().id();
    let mut archive = BinaryReader::new(&buf[..buf.len() - 1]);

    assert!(matches!(
        SnapshotReader::new(&mut world)
            .registry(&registry)
            .load_into(&mut archive, target),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_oversized_component_list() -> anyhow::Result<()> {
    let registry = registry();
    let mut world = World::new();
    let target = world.spawn_empty().id();

    let mut buf = Vec::new();
    rmp_serde::encode::write(&mut buf, &1u64)?;
    rmp_serde::encode::write(&mut buf, &0u64)?;
    rmp_serde::encode::write(&mut buf, &u64::MAX)?;

    let mut archive = BinaryReader::new(&*buf);

    assert!(matches!(
        SnapshotReader::new(&mut world)
            .registry(&registry)
            .load_into(&mut archive, target),
        Err(Error::Format(_))
    ));
    assert!(world.get::<Position>(target).is_none());

    Ok(())
}

#[test]
fn test_read_record() {
    let registry = registry();
    let mut world = World::new();

    let source = world
        .spawn((Position { x: 8, y: 9 }, Label("raw".into())))
        .id();

    let buf = save_entity::<JSONFormat>(&world, &registry, source, accept_all);
    let mut archive = JSONFormat::reader(&*buf).unwrap();

    assert_eq!(archive.field::<u64>(Some("e_count")).unwrap(), 1);

    let record = SnapshotReader::new(&mut world)
        .registry(&registry)
        .read_record(&mut *archive)
        .unwrap();

    assert_eq!(record.entity, source.to_bits());
    assert_eq!(record.recorded_entity(), Some(source));

    let names = record
        .components
        .iter()
        .map(|value| value.name().to_owned())
        .collect::<HashSet<_>>();

    assert_eq!(names, HashSet::from(["position".to_owned(), "label".to_owned()]));

    let position = record
        .components
        .iter()
        .find_map(|value| value.try_typed::<Position>())
        .unwrap();

    assert_eq!(position, &Position { x: 8, y: 9 });
}

fn world_with_two_entities() -> (World, Entity, Entity) {
    let mut world = World::new();

    let first = world.spawn(Position { x: 1, y: 1 }).id();
    let second = world
        .spawn((Position { x: 2, y: 2 }, Label("second".into())))
        .id();

    (world, first, second)
}

fn whole_world<F: Format>() {
    let registry = registry();
    let (world, first, second) = world_with_two_entities();

    let buf = save_world::<F>(&world, &registry);

    let mut other = World::new();
    let existing = other.spawn(Position { x: 9, y: 9 }).id();

    let mut entity_map = EntityHashMap::default();
    entity_map.insert(first, existing);

    let mut archive = F::reader(&*buf).unwrap();

    let loaded = SnapshotReader::new(&mut other)
        .registry(&registry)
        .entity_map(&mut entity_map)
        .load_world(&mut *archive)
        .unwrap();

    assert_eq!(loaded.len(), world.iter_entities().count());
    assert_eq!(entity_map.get(&first).copied(), Some(existing));
    assert!(loaded.contains(&existing));

    let fresh = entity_map.get(&second).copied().unwrap();

    assert_ne!(fresh, existing);
    assert!(loaded.contains(&fresh));
    assert_eq!(other.get::<Position>(existing), Some(&Position { x: 1, y: 1 }));
    assert_eq!(other.get::<Position>(fresh), Some(&Position { x: 2, y: 2 }));
    assert_eq!(other.get::<Label>(fresh), Some(&Label("second".into())));

    // Loading again through the same map reuses the mapped entities.
    let count = other.iter_entities().count();
    let mut archive = F::reader(&*buf).unwrap();

    let reloaded = SnapshotReader::new(&mut other)
        .registry(&registry)
        .entity_map(&mut entity_map)
        .load_world(&mut *archive)
        .unwrap();

    assert_eq!(other.iter_entities().count(), count);
    assert_eq!(
        reloaded.iter().collect::<HashSet<_>>(),
        loaded.iter().collect::<HashSet<_>>()
    );
}

#[test]
fn test_whole_world_binary() {
    whole_world::<RMPFormat>();
}

#[test]
fn test_whole_world_text() {
    whole_world::<JSONFormat>();
}

#[test]
fn test_whole_world_without_map_spawns() {
    let registry = registry();
    let (world, ..) = world_with_two_entities();

    let buf = save_world::<RMPFormat>(&world, &registry);

    let mut other = World::new();
    let bystander = other.spawn(Position { x: 0, y: 0 }).id();

    let mut archive = RMPFormat::reader(&*buf).unwrap();

    let loaded = SnapshotReader::new(&mut other)
        .registry(&registry)
        .load_world(&mut *archive)
        .unwrap();

    assert_eq!(loaded.len(), world.iter_entities().count());
    assert!(!loaded.contains(&bystander));
    assert_eq!(
        other.get::<Position>(bystander),
        Some(&Position { x: 0, y: 0 })
    );
}

#[test]
fn test_load_into_takes_first_record_only() {
    let registry = registry();
    let (world, ..) = world_with_two_entities();

    let buf = save_world::<RMPFormat>(&world, &registry);

    let mut other = World::new();
    let target = other.spawn_empty().id();
    let count = other.iter_entities().count();
    let mut archive = RMPFormat::reader(&*buf).unwrap();

    SnapshotReader::new(&mut other)
        .registry(&registry)
        .load_into(&mut *archive, target)
        .unwrap();

    assert!(other.get::<Position>(target).is_some());
    assert_eq!(other.iter_entities().count(), count);
}
