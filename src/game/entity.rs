//! Thing handles with generational indices
//!
//! Things are addressed by `ThingId`, never by reference:
//! - Each slot has a generation counter
//! - When a thing is despawned, its slot can be reused
//! - The generation increments on reuse, invalidating old handles
//!
//! A monster still holding the id of a retired missile or a long-gone
//! target will see it as dead instead of aliasing whatever took the slot.

use serde::{Serialize, Deserialize};

/// A handle to a thing in the `ThingStore`.
///
/// Two ids with the same index but different generations are different
/// things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThingId {
    index: u32,
    generation: u32,
}

impl ThingId {
    /// Should only be called by ThingAllocator.
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index (for storage access).
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Allocates and tracks thing lifetimes.
///
/// Freed slots are reused LIFO with an incremented generation.
#[derive(Debug, Clone, Default)]
pub struct ThingAllocator {
    /// Generation counter for each slot
    generations: Vec<u32>,
    /// Whether each slot currently holds a live handle
    alive: Vec<bool>,
    /// Free slots available for reuse
    free_indices: Vec<u32>,
    /// Number of currently alive things
    alive_count: u32,
}

impl ThingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new handle.
    pub fn allocate(&mut self) -> ThingId {
        self.alive_count += 1;

        if let Some(index) = self.free_indices.pop() {
            // Generation was already incremented on free
            self.alive[index as usize] = true;
            ThingId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            ThingId::new(index, 0)
        }
    }

    /// Free a handle, making its slot available for reuse.
    /// Returns true if the handle was alive and is now freed.
    pub fn free(&mut self, id: ThingId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.generations[id.index as usize] += 1;
        self.alive[id.index as usize] = false;
        self.free_indices.push(id.index);
        self.alive_count -= 1;
        true
    }

    pub fn is_alive(&self, id: ThingId) -> bool {
        self.generations.get(id.index as usize) == Some(&id.generation)
    }

    /// Current handle for an occupied slot index.
    pub fn id_at(&self, index: u32) -> Option<ThingId> {
        let generation = *self.generations.get(index as usize)?;
        self.alive[index as usize].then(|| ThingId::new(index, generation))
    }

    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }
}
