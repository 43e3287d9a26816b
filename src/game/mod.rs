//! Game Simulation Module
//!
//! Everything that moves: things, their definitions, and the fixed-tick
//! world that updates them against the static sector map.
//!
//! Key concepts:
//! - ThingId: Generational index for safe thing references
//! - Thing: One base struct plus a closed `ThingKind` for family state
//! - World: Owns map, grid, arena, events, camera and RNG
//! - Event: Sounds, damage, deaths, spawns and triggers for the host
//!
//! Design philosophy:
//! - Closed set of families, dispatched by `match`
//! - The thing being updated is taken out of the arena and put back
//! - Deterministic for a given seed

pub mod entity;
pub mod store;
pub mod defs;
pub mod animation;
pub mod thing;
pub mod event;
pub mod world;
pub mod collision;
pub mod sight;
pub mod combat;
pub mod hero;
pub mod monster;
pub mod npc;
pub mod missile;
pub mod particles;
pub mod camera;

// Re-export main types
pub use entity::{ThingAllocator, ThingId};
pub use store::ThingStore;
pub use defs::{AttackDef, DefError, DefTable, EntityDef, Group, SoundSet, ThingClass};
pub use animation::{Animation, AnimationSignal, AnimationState};
pub use thing::{HeroState, HeroStatus, Lifecycle, MonsterState, MonsterStatus, NpcStatus, Thing, ThingKind};
pub use event::{DamageEvent, DeathEvent, EventQueue, Events, SoundEvent, SpawnEvent, TriggerEvent};
pub use world::{World, WorldError};
pub use collision::{Blocker, Crossing, MoveTest};
pub use combat::aim_projectile;
pub use hero::HeroInput;
pub use camera::{Camera, Keyframe};
