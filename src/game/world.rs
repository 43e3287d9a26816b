//! Game World
//!
//! The World is the root of the simulation:
//! - Sector graph and grid (static geometry, broad-phase buckets)
//! - Thing arena and the stable update order
//! - Event queues the host drains after each tick
//! - Camera, hero input and the seeded RNG
//!
//! One `update()` call is one fixed tick. Things update in spawn order;
//! anything spawned during a tick is first updated on the next one.

use std::collections::HashMap;
use std::rc::Rc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, trace};
use crate::config::{ConfigError, SimConfig};
use crate::math::Vec3;
use crate::world::{Grid, LevelError, LineId, Map, MapData, SectorId, TriggerSpec};
use super::camera::{Camera, Keyframe};
use super::defs::{DefError, DefTable, ThingClass};
use super::entity::ThingId;
use super::event::{Events, SoundEvent, SpawnEvent, TriggerEvent};
use super::hero::HeroInput;
use super::store::ThingStore;
use super::thing::{Lifecycle, Thing, ThingKind};

/// Error type for world construction and spawning
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Def(#[from] DefError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("map has no hero spawn")]
    MissingHero,
    #[error("`{name}` at ({x}, {z}) is outside the map")]
    OutsideMap { name: String, x: f32, z: f32 },
}

pub struct World {
    pub map: Map,
    pub grid: Grid,
    pub things: ThingStore,
    pub events: Events,
    pub camera: Camera,
    pub(crate) defs: Rc<DefTable>,
    pub(crate) config: SimConfig,
    pub(crate) rng: StdRng,
    /// Stable update order (spawn order)
    pub(crate) order: Vec<ThingId>,
    pub(crate) hero: Option<ThingId>,
    pub(crate) hero_input: HeroInput,
    pub(crate) triggers: HashMap<LineId, Vec<TriggerSpec>>,
    music: Option<String>,
    tick: u64,
}

impl World {
    /// Build the sector graph and grid, then spawn every map thing.
    pub fn new(data: MapData, defs: DefTable, config: SimConfig) -> Result<Self, WorldError> {
        config.validate()?;
        defs.validate()?;
        let map = Map::build(&data, config.texture_scale)?;
        let grid = Grid::new(&map, config.cell_shift)?;

        let mut triggers: HashMap<LineId, Vec<TriggerSpec>> = HashMap::new();
        for trigger in &data.triggers {
            triggers.entry(LineId(trigger.line as u32)).or_default().push(trigger.clone());
        }

        let mut world = Self {
            map,
            grid,
            things: ThingStore::new(),
            events: Events::new(),
            camera: Camera::default(),
            defs: Rc::new(defs),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            order: Vec::new(),
            hero: None,
            hero_input: HeroInput::default(),
            triggers,
            music: data.music().map(str::to_string),
            tick: 0,
        };

        for spawn in &data.things {
            let id = world.spawn(&spawn.name, spawn.x, spawn.z)?;
            if let Some(thing) = world.things.get_mut(id) {
                thing.rotation = spawn.rotation;
                if world.hero.is_none() && matches!(thing.kind, ThingKind::Hero(_)) {
                    world.hero = Some(id);
                }
            }
        }
        let hero = world.hero.ok_or(WorldError::MissingHero)?;
        world.camera.target = Some(hero);
        if let Some(thing) = world.things.get(hero) {
            world.camera.snap_to(thing, &world.config);
        }

        info!(
            sectors = world.map.sectors.len(),
            lines = world.map.lines.len(),
            things = world.things.len(),
            triggers = data.triggers.len(),
            "world ready"
        );
        Ok(world)
    }

    /// Advance the simulation one tick.
    pub fn update(&mut self) {
        self.tick += 1;

        // Things spawned during this pass wait for the next tick
        let count = self.order.len();
        for i in 0..count {
            let id = self.order[i];
            let Some(mut thing) = self.things.take(id) else { continue };
            let lifecycle = if thing.is_final() {
                Lifecycle::Keep
            } else {
                self.update_thing(id, &mut thing)
            };
            self.things.put(id, thing);
            if lifecycle == Lifecycle::Remove {
                self.despawn(id);
            }
        }

        let things = &self.things;
        self.order.retain(|&id| things.is_alive(id));

        self.update_camera();
    }

    fn update_thing(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        match thing.kind {
            ThingKind::Hero(_) => self.update_hero(id, thing),
            ThingKind::Monster(_) => self.update_monster(id, thing),
            ThingKind::Npc(_) => self.update_npc(id, thing),
            ThingKind::Missile { .. } => self.update_missile(id, thing),
            ThingKind::Particle => self.update_particle(id, thing),
            ThingKind::Tree | ThingKind::Medkit | ThingKind::Armor => Lifecycle::Keep,
        }
    }

    fn update_camera(&mut self) {
        if self.camera.in_cinema() {
            if self.camera.advance_cinema() {
                debug!(tick = self.tick, "cinema finished");
                self.events.trigger.send(TriggerEvent {
                    name: "end-cinema".to_string(),
                    params: Vec::new(),
                    line: None,
                    source: None,
                });
            }
            return;
        }
        let things = &self.things;
        if let Some(target) = self.camera.target.and_then(|id| things.get(id)) {
            self.camera.follow(target, &self.config);
        }
    }

    /// Spawn a definition standing on the floor at (x, z).
    pub fn spawn(&mut self, name: &str, x: f32, z: f32) -> Result<ThingId, WorldError> {
        let floor = self.map.find_sector(x, z).map_or(0.0, |s| self.map.sector(s).floor);
        self.spawn_at(name, Vec3::new(x, floor, z), Vec3::ZERO)
    }

    /// Spawn a definition at an exact position with an initial velocity.
    ///
    /// Anything but a particle must land inside a sector.
    pub fn spawn_at(&mut self, name: &str, position: Vec3, velocity: Vec3) -> Result<ThingId, WorldError> {
        let defs = Rc::clone(&self.defs);
        let def = defs.get(name)?;
        let mut thing = Thing::from_def(name, def, position, &self.config);
        thing.dx = velocity.x;
        thing.dy = velocity.y;
        thing.dz = velocity.z;

        match self.map.find_sector(position.x, position.z) {
            Some(sector) => self.enter_sector(&mut thing, sector),
            None if def.class == ThingClass::Particle => {}
            None => {
                return Err(WorldError::OutsideMap { name: name.to_string(), x: position.x, z: position.z });
            }
        }

        let id = self.things.insert(thing);
        if let Some(thing) = self.things.get_mut(id) {
            let range = self.grid.range(thing.position.x, thing.position.z, thing.radius);
            self.grid.push(id, range, thing.membership());
            thing.cells = Some(range);
        }
        self.order.push(id);
        self.events.spawn.send(SpawnEvent { thing: id, def: name.to_string(), position });
        trace!(?id, name, x = position.x, z = position.z, "spawned");
        Ok(id)
    }

    /// Remove a thing from the grid and free its slot.
    pub fn despawn(&mut self, id: ThingId) {
        if let Some(mut thing) = self.things.remove(id) {
            if let Some(range) = thing.cells.take() {
                self.grid.remove(id, range, thing.membership());
            }
            trace!(?id, def = %thing.def, "despawned");
        }
    }

    /// Adopt a sector's floor and ceiling.
    pub(crate) fn enter_sector(&self, thing: &mut Thing, sector: SectorId) {
        let s = self.map.sector(sector);
        thing.sector = Some(sector);
        thing.floor = s.floor;
        thing.ceiling = s.ceiling;
    }

    pub fn find_sector(&self, x: f32, z: f32) -> Option<SectorId> {
        self.map.find_sector(x, z)
    }

    /// Clear sight between two live things.
    pub fn line_of_sight(&self, a: ThingId, b: ThingId) -> bool {
        match (self.things.get(a), self.things.get(b)) {
            (Some(a), Some(b)) => self.can_see(a, b),
            _ => false,
        }
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.things.get(id)
    }

    /// Things in update order.
    pub fn things_in_order(&self) -> impl Iterator<Item = (ThingId, &Thing)> {
        self.order.iter().filter_map(|&id| Some((id, self.things.get(id)?)))
    }

    pub fn hero(&self) -> Option<ThingId> {
        self.hero
    }

    /// Input applied on the hero's next update.
    pub fn set_hero_input(&mut self, input: HeroInput) {
        self.hero_input = input;
    }

    /// Hand the camera a scripted sequence; "end-cinema" fires when it finishes.
    pub fn begin_cinema(&mut self, keyframes: Vec<Keyframe>) {
        self.camera.begin_cinema(keyframes);
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn defs(&self) -> &DefTable {
        &self.defs
    }

    pub fn music(&self) -> Option<&str> {
        self.music.as_deref()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn play_sound(&mut self, name: Option<&str>, position: Vec3) {
        if let Some(name) = name {
            self.events.sound.send(SoundEvent { name: name.to_string(), position });
        }
    }
}
