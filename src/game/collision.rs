//! Collision System
//!
//! Box collision of things against each other and against sector lines.
//! A move is tested first (`test_move`, pure) and then committed, which
//! keeps the grid discipline in one place: remove → mutate → push.
//!
//! Crossing a non-physical line raises the effective floor to the higher of
//! its two sectors and lowers the ceiling to the tighter one. When several
//! are touched at once the results combine across all of them.

use tracing::trace;
use crate::math::{Vec2, Vec3};
use crate::world::LineId;
use super::entity::ThingId;
use super::thing::{Thing, ThingKind};
use super::world::World;

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Thing(ThingId),
    Line(LineId),
}

/// Floor/ceiling band derived from the non-physical lines a move touches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Closest touched line; decides the new sector
    pub line: LineId,
    pub floor: f32,
    pub ceiling: f32,
}

/// Result of testing a candidate position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTest {
    Blocked(Blocker),
    Clear { crossing: Option<Crossing> },
}

impl MoveTest {
    pub fn is_clear(&self) -> bool {
        matches!(self, MoveTest::Clear { .. })
    }
}

impl World {
    fn step_height(&self, thing: &Thing) -> f32 {
        match thing.kind {
            ThingKind::Missile { .. } => 0.0,
            _ => self.config.step,
        }
    }

    /// Test `thing` at (x, z) against other physical things and lines in range.
    pub fn test_move(&self, id: ThingId, thing: &Thing, x: f32, z: f32) -> MoveTest {
        let range = self.grid.range(x, z, thing.radius);

        if thing.physical {
            for other_id in self.grid.things_in_range(range) {
                if other_id == id {
                    continue;
                }
                let Some(other) = self.things.get(other_id) else { continue };
                if other.physical && thing.overlaps_at(x, z, other) {
                    return MoveTest::Blocked(Blocker::Thing(other_id));
                }
            }
        }

        let p = Vec2::new(x, z);
        let bottom = thing.position.y + self.step_height(thing);
        let top = thing.position.y + thing.height;
        let mut crossing: Option<(Crossing, f32)> = None;

        for line_id in self.grid.lines_in_range(range) {
            let line = self.map.line(line_id);
            let distance = line.distance_to(p);
            if distance > thing.radius {
                continue;
            }
            let Some((plus, minus)) = line.sides().filter(|_| !line.physical) else {
                return MoveTest::Blocked(Blocker::Line(line_id));
            };

            let (a, b) = (self.map.sector(plus), self.map.sector(minus));
            let floor = a.floor.max(b.floor);
            let ceiling = a.ceiling.min(b.ceiling);
            if bottom < floor || top > ceiling {
                return MoveTest::Blocked(Blocker::Line(line_id));
            }

            crossing = Some(match crossing {
                None => (Crossing { line: line_id, floor, ceiling }, distance),
                Some((c, best)) => {
                    let (line, best) = if distance < best { (line_id, distance) } else { (c.line, best) };
                    (Crossing { line, floor: c.floor.max(floor), ceiling: c.ceiling.min(ceiling) }, best)
                }
            });
        }

        MoveTest::Clear { crossing: crossing.map(|(c, _)| c) }
    }

    /// Move to (x, z) if nothing blocks. Updates grid membership and sector.
    pub fn try_move(&mut self, id: ThingId, thing: &mut Thing, x: f32, z: f32) -> bool {
        match self.test_move(id, thing, x, z) {
            MoveTest::Blocked(blocker) => {
                trace!(?id, ?blocker, x, z, "move blocked");
                false
            }
            MoveTest::Clear { crossing } => {
                self.commit_move(id, thing, x, z, crossing);
                true
            }
        }
    }

    /// Apply an accepted move.
    pub(crate) fn commit_move(&mut self, id: ThingId, thing: &mut Thing, x: f32, z: f32, crossing: Option<Crossing>) {
        self.remove_from_cells(id, thing);
        thing.position.x = x;
        thing.position.z = z;
        self.push_to_cells(id, thing);

        let p = Vec2::new(x, z);
        match crossing {
            Some(c) => {
                thing.sector = self.map.line(c.line).sector_on_side(p);
                thing.floor = c.floor;
                thing.ceiling = c.ceiling;
                thing.on_line = true;
            }
            None => {
                // Off the line, or fast enough to skip one: full search
                let stale = thing.sector.map_or(true, |s| !self.map.sector(s).contains(p));
                if thing.on_line || stale {
                    thing.on_line = false;
                    match self.map.find_sector_with_hint(x, z, thing.sector) {
                        Some(sector) => self.enter_sector(thing, sector),
                        None => {
                            thing.sector = None;
                            thing.floor = f32::NEG_INFINITY;
                            thing.ceiling = f32::INFINITY;
                        }
                    }
                }
            }
        }
    }

    /// Register in every cell of the current range.
    pub(crate) fn push_to_cells(&mut self, id: ThingId, thing: &mut Thing) {
        let range = self.grid.range(thing.position.x, thing.position.z, thing.radius);
        self.grid.push(id, range, thing.membership());
        thing.cells = Some(range);
    }

    /// Leave exactly the recorded range.
    pub(crate) fn remove_from_cells(&mut self, id: ThingId, thing: &mut Thing) {
        if let Some(range) = thing.cells.take() {
            self.grid.remove(id, range, thing.membership());
        }
    }

    /// Horizontal velocity with wall sliding, friction, then gravity.
    pub(crate) fn integrate(&mut self, id: ThingId, thing: &mut Thing) {
        if thing.dx != 0.0 || thing.dz != 0.0 {
            let (x, z) = (thing.position.x, thing.position.z);
            if !self.try_move(id, thing, x + thing.dx, z + thing.dz) {
                // Slide along whichever axis is free
                if self.try_move(id, thing, x + thing.dx, z) {
                    thing.dz = 0.0;
                } else if self.try_move(id, thing, x, z + thing.dz) {
                    thing.dx = 0.0;
                } else {
                    thing.dx = 0.0;
                    thing.dz = 0.0;
                }
            }
            if thing.ground {
                thing.dx *= self.config.friction;
                thing.dz *= self.config.friction;
                if thing.dx.abs() < 1e-4 {
                    thing.dx = 0.0;
                }
                if thing.dz.abs() < 1e-4 {
                    thing.dz = 0.0;
                }
            }
        }
        integrate_vertical(thing);
    }
}

/// Gravity, landing and head clamp against the tracked floor/ceiling.
pub fn integrate_vertical(thing: &mut Thing) {
    if thing.position.y > thing.floor || thing.dy > 0.0 {
        thing.ground = false;
        thing.dy -= thing.gravity;
        thing.position.y += thing.dy;
    }
    if thing.position.y <= thing.floor {
        thing.position.y = thing.floor;
        thing.dy = 0.0;
        thing.ground = true;
    }
    if thing.position.y + thing.height > thing.ceiling {
        thing.position.y = (thing.ceiling - thing.height).max(thing.floor);
        thing.dy = thing.dy.min(0.0);
    }
}

/// Center of a thing as a point (feet + half height)
pub fn center(thing: &Thing) -> Vec3 {
    Vec3::new(thing.position.x, thing.center_y(), thing.position.z)
}
