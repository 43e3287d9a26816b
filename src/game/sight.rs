//! Line of sight
//!
//! Traces from eye to eye over the cells the segment passes through. Physical
//! lines always block; a ledge blocks when the sight line passes below its
//! higher floor or above its lower ceiling at the crossing point.

use crate::math::segment_intersection;
use super::thing::Thing;
use super::world::World;

/// Eyes sit this far up a thing's height
const EYE_HEIGHT: f32 = 0.75;

impl World {
    /// Unobstructed sight from `from`'s eyes to `to`'s eyes.
    pub fn can_see(&self, from: &Thing, to: &Thing) -> bool {
        let (a, b) = (from.xz(), to.xz());
        let ya = from.position.y + from.height * EYE_HEIGHT;
        let yb = to.position.y + to.height * EYE_HEIGHT;

        for line_id in self.grid.lines_along(a, b) {
            let line = self.map.line(line_id);
            let Some(t) = segment_intersection(a, b, line.a, line.b) else { continue };
            let Some((plus, minus)) = line.sides().filter(|_| !line.physical) else {
                return false;
            };
            let (p, m) = (self.map.sector(plus), self.map.sector(minus));
            let y = ya + (yb - ya) * t;
            if y <= p.floor.max(m.floor) || y >= p.ceiling.min(m.ceiling) {
                return false;
            }
        }
        true
    }
}
