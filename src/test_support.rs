//! Shared fixtures for unit tests: small hand-built maps and a definition
//! table covering every thing family.

use crate::config::SimConfig;
use crate::game::{DefTable, World};
use crate::math::Vec2;
use crate::world::{LineSpec, MapData, SectorSpec, ThingSpawn, TriggerSpec};

/// Index of the line shared by the two rooms of `ledge_map`
pub const LEDGE_LINE: usize = 3;

fn sector(floor: f32, ceiling: f32, vertices: &[usize]) -> SectorSpec {
    SectorSpec {
        bottom: floor.min(0.0),
        floor,
        ceiling,
        top: ceiling,
        floor_texture: Some(1),
        ceiling_texture: Some(2),
        vertices: vertices.to_vec(),
    }
}

fn wall(a: usize, b: usize, sector: usize) -> LineSpec {
    LineSpec { a, b, top: None, middle: Some(3), bottom: None, plus: Some(sector), minus: None }
}

fn ledge(a: usize, b: usize, plus: usize, minus: usize) -> LineSpec {
    LineSpec { a, b, top: Some(4), middle: None, bottom: Some(4), plus: Some(plus), minus: Some(minus) }
}

fn vertices(points: &[(f32, f32)]) -> Vec<Vec2> {
    points.iter().map(|&(x, z)| Vec2::new(x, z)).collect()
}

/// Two 8x8 rooms side by side along x. Room 0 floor 0, room 1 floor
/// `high_floor`, both ceilings 4. The shared line carries an interact trigger.
pub fn ledge_map(high_floor: f32) -> MapData {
    MapData {
        vertices: vertices(&[(0.0, 0.0), (8.0, 0.0), (16.0, 0.0), (16.0, 8.0), (8.0, 8.0), (0.0, 8.0)]),
        sectors: vec![
            sector(0.0, 4.0, &[0, 1, 4, 5]),
            sector(high_floor, 4.0, &[1, 2, 3, 4]),
        ],
        lines: vec![
            wall(0, 1, 0),
            wall(4, 5, 0),
            wall(5, 0, 0),
            ledge(1, 4, 0, 1),
            wall(1, 2, 1),
            wall(2, 3, 1),
            wall(3, 4, 1),
        ],
        triggers: vec![TriggerSpec {
            line: LEDGE_LINE,
            event: "interact-line".into(),
            params: vec!["door".into(), "1".into()],
        }],
        ..Default::default()
    }
}

pub fn two_room_map() -> MapData {
    ledge_map(0.25)
}

/// A 16x16 room with a raised, solid-walled pillar sector at 6..10.
pub fn nested_map() -> MapData {
    let pillar = |a, b| LineSpec { a, b, top: None, middle: Some(3), bottom: Some(4), plus: Some(1), minus: Some(0) };
    MapData {
        vertices: vertices(&[
            (0.0, 0.0), (16.0, 0.0), (16.0, 16.0), (0.0, 16.0),
            (6.0, 6.0), (10.0, 6.0), (10.0, 10.0), (6.0, 10.0),
        ]),
        sectors: vec![
            sector(0.0, 4.0, &[0, 1, 2, 3]),
            sector(1.0, 4.0, &[4, 5, 6, 7]),
        ],
        lines: vec![
            wall(0, 1, 0),
            wall(1, 2, 0),
            wall(2, 3, 0),
            wall(3, 0, 0),
            pillar(4, 5),
            pillar(5, 6),
            pillar(6, 7),
            pillar(7, 4),
        ],
        ..Default::default()
    }
}

/// Three sectors meeting at (8, 8): rooms 0 and 1 side by side below z = 8,
/// room 2 spanning the full width above it.
pub fn three_way_map() -> MapData {
    MapData {
        vertices: vertices(&[
            (0.0, 0.0), (8.0, 0.0), (16.0, 0.0), (16.0, 8.0), (8.0, 8.0), (0.0, 8.0),
            (16.0, 16.0), (0.0, 16.0),
        ]),
        sectors: vec![
            sector(0.0, 4.0, &[0, 1, 4, 5]),
            sector(0.25, 3.5, &[1, 2, 3, 4]),
            sector(0.4, 3.8, &[5, 3, 6, 7]),
        ],
        lines: vec![
            wall(0, 1, 0),
            wall(5, 0, 0),
            wall(1, 2, 1),
            wall(2, 3, 1),
            ledge(1, 4, 0, 1),
            ledge(5, 4, 2, 0),
            ledge(4, 3, 2, 1),
            wall(3, 6, 2),
            wall(6, 7, 2),
            wall(7, 5, 2),
        ],
        ..Default::default()
    }
}

/// A diamond room centered on the origin with corners 12 units out, so two
/// walls run diagonally through negative z.
pub fn diamond_map() -> MapData {
    MapData {
        vertices: vertices(&[(-12.0, 0.0), (0.0, -12.0), (12.0, 0.0), (0.0, 12.0)]),
        sectors: vec![sector(0.0, 4.0, &[0, 1, 2, 3])],
        lines: vec![wall(0, 1, 0), wall(1, 2, 0), wall(2, 3, 0), wall(3, 0, 0)],
        ..Default::default()
    }
}

const TEST_DEFS: &str = r#"{
    "hero": (class: Hero, group: Human, box: 0.5, height: 1.0, health: 100, speed: 0.12, sight: 30.0,
        animations: {"idle": [0], "move": [1, 2, 3, 4], "punch": [5, 6, 7], "death": [8, 9, 10]},
        attacks: [(name: "punch", range: 0.5, reaction: 0, damage: 10, animation: "punch",
            fire_frame: 1, sound: Some("swing"), sound_frame: 0)],
        sounds: (pain: Some("hero-pain"), death: Some("hero-death")),
        blood: Some("blood"), death_effect: Some("gib")),
    "imp": (class: Monster, group: Demon, box: 0.5, height: 1.2, health: 40, speed: 0.08, sight: 20.0,
        animations: {"idle": [11], "move": [11, 12], "claw": [13, 14, 15], "throw": [16, 17, 18],
            "death": [19, 20, 21]},
        attacks: [
            (name: "claw", range: 0.6, reaction: 30, damage: 6, damage_variance: 3, animation: "claw",
                fire_frame: 2, sound: Some("claw"), sound_frame: 1),
            (name: "fireball", range: 12.0, reaction: 60, damage: 10, damage_variance: 5, animation: "throw",
                fire_frame: 2, sound: Some("imp-throw"), sound_frame: 0, projectile: Some("fireball")),
        ],
        sounds: (wake: Some("imp-wake"), pain: Some("imp-pain"), death: Some("imp-death")),
        blood: Some("blood"), death_effect: Some("gib")),
    "villager": (class: Npc, group: Neutral, box: 0.5, height: 1.0, health: 30,
        animations: {"idle": [30], "death": [31, 32, 33]},
        sounds: (pain: Some("villager-pain"), death: Some("villager-death")),
        blood: Some("blood"), death_effect: Some("gib")),
    "fireball": (class: Missile, box: 0.2, height: 0.4, speed: 0.3, gravity: Some(0.0),
        animations: {"idle": [80, 81]},
        sounds: (impact: Some("boom")), explosion: Some("puff")),
    "puff": (class: Particle, box: 0.1, height: 0.2, gravity: Some(0.0),
        animations: {"idle": [50, 51]}),
    "blood": (class: Particle, box: 0.05, height: 0.05,
        animations: {"idle": [40, 41, 42]}),
    "gib": (class: Particle, box: 0.1, height: 0.1,
        animations: {"idle": [90, 91, 92, 93, 94, 95, 96, 97, 98, 99]}),
    "medkit": (class: Medkit, box: 0.3, height: 0.3, amount: 25,
        animations: {"idle": [60]}, sounds: (pickup: Some("pickup"))),
    "armor": (class: Armor, box: 0.3, height: 0.3, amount: 50,
        animations: {"idle": [61]}, sounds: (pickup: Some("pickup"))),
    "tree": (class: Tree, box: 0.5, height: 3.0, animations: {"idle": [70]}),
}"#;

pub fn test_defs() -> DefTable {
    DefTable::from_ron(TEST_DEFS).unwrap()
}

fn world_from(mut data: MapData, spawns: &[(&str, f32, f32)]) -> World {
    data.things = spawns
        .iter()
        .map(|&(name, x, z)| ThingSpawn { name: name.to_string(), x, z, rotation: 0.0 })
        .collect();
    World::new(data, test_defs(), SimConfig::default()).unwrap()
}

/// World on `two_room_map`; the first spawn should be the hero.
pub fn test_world(spawns: &[(&str, f32, f32)]) -> World {
    world_from(two_room_map(), spawns)
}

pub fn ledge_map_world(high_floor: f32, spawns: &[(&str, f32, f32)]) -> World {
    world_from(ledge_map(high_floor), spawns)
}

pub fn three_way_world(spawns: &[(&str, f32, f32)]) -> World {
    world_from(three_way_map(), spawns)
}

pub fn diamond_world(spawns: &[(&str, f32, f32)]) -> World {
    world_from(diamond_map(), spawns)
}

pub fn nested_world(spawns: &[(&str, f32, f32)]) -> World {
    world_from(nested_map(), spawns)
}
