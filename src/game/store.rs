//! Thing arena
//!
//! Owns every live thing. The thing being updated is taken out of its slot
//! for the duration of its own update and put back afterwards, so queries
//! made during that update never see it.

use super::entity::{ThingAllocator, ThingId};
use super::thing::Thing;

#[derive(Debug, Default)]
pub struct ThingStore {
    allocator: ThingAllocator,
    slots: Vec<Option<Thing>>,
}

impl ThingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, thing: Thing) -> ThingId {
        let id = self.allocator.allocate();
        let index = id.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(thing);
        id
    }

    /// Free the slot and return the thing, if it was present.
    pub fn remove(&mut self, id: ThingId) -> Option<Thing> {
        if !self.allocator.free(id) {
            return None;
        }
        self.slots[id.index() as usize].take()
    }

    pub fn is_alive(&self, id: ThingId) -> bool {
        self.allocator.is_alive(id)
    }

    pub fn get(&self, id: ThingId) -> Option<&Thing> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ThingId) -> Option<&mut Thing> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    /// Move the thing out of its slot. The handle stays valid.
    pub fn take(&mut self, id: ThingId) -> Option<Thing> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.take()
    }

    /// Return a thing taken with `take`.
    pub fn put(&mut self, id: ThingId, thing: Thing) {
        if self.is_alive(id) {
            self.slots[id.index() as usize] = Some(thing);
        }
    }

    /// Live things in slot order (taken things are skipped).
    pub fn iter(&self) -> impl Iterator<Item = (ThingId, &Thing)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let thing = slot.as_ref()?;
            Some((self.allocator.id_at(i as u32)?, thing))
        })
    }

    pub fn len(&self) -> usize {
        self.allocator.alive_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
