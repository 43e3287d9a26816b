//! Event System
//!
//! The simulation never calls into audio, rendering or gameplay scripting.
//! It appends plain event structs to queues and the host drains them after
//! each tick:
//! 1. A missile lands → DamageEvent, SoundEvent ("impact"), SpawnEvent (explosion)
//! 2. The audio layer drains `sound` and plays each name
//! 3. Gameplay drains `trigger` and interprets the names it knows

use crate::math::Vec3;
use crate::world::LineId;
use super::entity::ThingId;

/// A queue for events of a single type.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Container for all simulation events.
#[derive(Debug, Default)]
pub struct Events {
    /// Play a named sound at a position
    pub sound: EventQueue<SoundEvent>,
    /// Damage dealt to a thing
    pub damage: EventQueue<DamageEvent>,
    /// A thing entered its death state
    pub death: EventQueue<DeathEvent>,
    /// A thing was spawned (map load or in flight)
    pub spawn: EventQueue<SpawnEvent>,
    /// Gameplay trigger for the host
    pub trigger: EventQueue<TriggerEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all event queues.
    pub fn clear_all(&mut self) {
        self.sound.clear();
        self.damage.clear();
        self.death.clear();
        self.spawn.clear();
        self.trigger.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub name: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    /// Who got hit
    pub target: ThingId,
    /// Who dealt the damage (if any)
    pub source: Option<ThingId>,
    /// Damage after armor
    pub amount: i32,
    /// Where the hit occurred
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathEvent {
    pub thing: ThingId,
    pub killer: Option<ThingId>,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEvent {
    pub thing: ThingId,
    /// Definition name
    pub def: String,
    pub position: Vec3,
}

/// Named gameplay notification ("interact-line", "end-cinema", ...).
/// Dispatched uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub name: String,
    pub params: Vec<String>,
    /// Line the trigger is attached to, if any
    pub line: Option<LineId>,
    /// Thing that set it off, if any
    pub source: Option<ThingId>,
}
