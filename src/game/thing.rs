//! Things: every dynamic simulated entity
//!
//! One base struct carries what all things share (position, velocity,
//! collision box, sector tracking, animation, health, grid membership).
//! Per-family behavior state lives in the closed `ThingKind` variant and is
//! dispatched by `match` in the world's update pass.

use crate::config::SimConfig;
use crate::math::{Vec2, Vec3};
use crate::world::{CellRange, Membership, SectorId};
use super::animation::{Animation, AnimationSignal, AnimationState};
use super::defs::{EntityDef, Group, ThingClass};
use super::entity::ThingId;

/// Monster behavior states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterStatus {
    Look,
    Chase,
    Attack,
    Dead,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonsterState {
    pub status: MonsterStatus,
    pub target: Option<ThingId>,
    /// Decision cooldown in ticks
    pub reaction: u32,
    /// Ticks left on the current heading
    pub move_count: u32,
    /// Index into the definition's attacks while attacking
    pub attack: Option<usize>,
}

impl Default for MonsterState {
    fn default() -> Self {
        Self { status: MonsterStatus::Look, target: None, reaction: 0, move_count: 0, attack: None }
    }
}

/// NPC behavior states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcStatus {
    Stand,
    Dead,
    Final,
}

/// Hero behavior states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroStatus {
    Walk,
    Attack,
    Dead,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroState {
    pub status: HeroStatus,
    pub attack: Option<usize>,
    pub target: Option<ThingId>,
    /// Attack held into the last frame; the next swing starts on completion
    pub queued: bool,
}

impl Default for HeroState {
    fn default() -> Self {
        Self { status: HeroStatus::Walk, attack: None, target: None, queued: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThingKind {
    Hero(HeroState),
    Monster(MonsterState),
    Npc(NpcStatus),
    Tree,
    Medkit,
    Armor,
    Missile { owner: Option<ThingId>, damage: i32 },
    Particle,
}

/// What the update pass should do with a thing afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Keep,
    Remove,
}

#[derive(Debug, Clone)]
pub struct Thing {
    /// Definition name
    pub def: String,
    pub group: Group,
    /// Feet position; y is height
    pub position: Vec3,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    /// Horizontal collision half-extent
    pub radius: f32,
    pub height: f32,
    /// Containing sector (lookup only, never owned)
    pub sector: Option<SectorId>,
    pub floor: f32,
    pub ceiling: f32,
    /// Facing in radians
    pub rotation: f32,
    pub speed: f32,
    pub gravity: f32,
    pub animation: AnimationState,
    pub health: i32,
    pub max_health: i32,
    pub armor: i32,
    /// Blocks other things and can be blocked
    pub physical: bool,
    /// Resting on the floor
    pub ground: bool,
    /// Sector was last derived from a crossed line
    pub on_line: bool,
    /// Cells this thing is registered in
    pub cells: Option<CellRange>,
    pub kind: ThingKind,
}

impl Thing {
    /// Build a thing from its definition at a feet position.
    pub fn from_def(name: &str, def: &EntityDef, position: Vec3, config: &SimConfig) -> Self {
        let kind = match def.class {
            ThingClass::Hero => ThingKind::Hero(HeroState::default()),
            ThingClass::Monster => ThingKind::Monster(MonsterState::default()),
            ThingClass::Npc => ThingKind::Npc(NpcStatus::Stand),
            ThingClass::Tree => ThingKind::Tree,
            ThingClass::Medkit => ThingKind::Medkit,
            ThingClass::Armor => ThingKind::Armor,
            ThingClass::Missile => ThingKind::Missile { owner: None, damage: 0 },
            ThingClass::Particle => ThingKind::Particle,
        };
        let physical = matches!(
            def.class,
            ThingClass::Hero | ThingClass::Monster | ThingClass::Npc | ThingClass::Tree
        );

        let mut thing = Self {
            def: name.to_string(),
            group: def.group,
            position,
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            radius: def.radius,
            height: def.height,
            sector: None,
            floor: f32::NEG_INFINITY,
            ceiling: f32::INFINITY,
            rotation: 0.0,
            speed: def.speed,
            gravity: def.gravity.unwrap_or(config.gravity),
            animation: AnimationState::default(),
            health: def.health,
            max_health: def.health,
            armor: 0,
            physical,
            ground: false,
            on_line: false,
            cells: None,
            kind,
        };
        thing.set_animation(def, "idle");
        thing
    }

    /// Switch to a named animation from the definition and rewind.
    /// Missing names play as a single blank frame.
    pub fn set_animation(&mut self, def: &EntityDef, name: &str) {
        let frames = def.animations.get(name).cloned().unwrap_or_default();
        self.animation.set(Animation::new(name, frames));
    }

    pub fn update_animation(&mut self, rate: u32) -> AnimationSignal {
        self.animation.advance(rate)
    }

    pub fn membership(&self) -> Membership {
        match self.kind {
            ThingKind::Particle => Membership::Particle,
            _ => Membership::Thing,
        }
    }

    /// Can take damage at all (ignores current health)
    pub fn is_damageable(&self) -> bool {
        matches!(self.kind, ThingKind::Hero(_) | ThingKind::Monster(_) | ThingKind::Npc(_))
    }

    /// In a death or terminal state
    pub fn is_dead(&self) -> bool {
        match self.kind {
            ThingKind::Hero(h) => matches!(h.status, HeroStatus::Dead | HeroStatus::Final),
            ThingKind::Monster(m) => matches!(m.status, MonsterStatus::Dead | MonsterStatus::Final),
            ThingKind::Npc(s) => matches!(s, NpcStatus::Dead | NpcStatus::Final),
            _ => false,
        }
    }

    /// Excluded from further simulation
    pub fn is_final(&self) -> bool {
        match self.kind {
            ThingKind::Hero(h) => h.status == HeroStatus::Final,
            ThingKind::Monster(m) => m.status == MonsterStatus::Final,
            ThingKind::Npc(s) => s == NpcStatus::Final,
            _ => false,
        }
    }

    /// Damageable, alive and not dying
    pub fn is_live_target(&self) -> bool {
        self.is_damageable() && !self.is_dead() && self.health > 0
    }

    /// Force the death state of whichever family this is.
    pub(crate) fn mark_dead(&mut self) {
        match &mut self.kind {
            ThingKind::Hero(h) => h.status = HeroStatus::Dead,
            ThingKind::Monster(m) => m.status = MonsterStatus::Dead,
            ThingKind::Npc(s) => *s = NpcStatus::Dead,
            _ => {}
        }
    }

    pub(crate) fn mark_final(&mut self) {
        match &mut self.kind {
            ThingKind::Hero(h) => h.status = HeroStatus::Final,
            ThingKind::Monster(m) => m.status = MonsterStatus::Final,
            ThingKind::Npc(s) => *s = NpcStatus::Final,
            _ => {}
        }
    }

    pub fn xz(&self) -> Vec2 {
        self.position.xz()
    }

    /// Vertical midpoint
    pub fn center_y(&self) -> f32 {
        self.position.y + self.height * 0.5
    }

    pub fn distance_to(&self, other: &Thing) -> f32 {
        self.xz().distance(other.xz())
    }

    /// Box-sum overlap against another thing at a candidate position
    pub fn overlaps_at(&self, x: f32, z: f32, other: &Thing) -> bool {
        let reach = self.radius + other.radius;
        (other.position.x - x).abs() <= reach && (other.position.z - z).abs() <= reach
    }

    pub fn sprite(&self) -> Option<u32> {
        self.animation.sprite()
    }
}
