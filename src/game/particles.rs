//! Particles
//!
//! Blood, gibs and explosions. They live in the cells' particle lists, never
//! collide with anything, fall under their own gravity and retire when their
//! animation finishes. A particle outside every sector has no floor and just
//! keeps falling until the animation ends.

use super::animation::AnimationSignal;
use super::entity::ThingId;
use super::thing::{Lifecycle, Thing};
use super::world::World;

impl World {
    pub(crate) fn update_particle(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        if thing.dx != 0.0 || thing.dz != 0.0 {
            self.remove_from_cells(id, thing);
            thing.position.x += thing.dx;
            thing.position.z += thing.dz;
            self.push_to_cells(id, thing);

            match self.map.find_sector_with_hint(thing.position.x, thing.position.z, thing.sector) {
                Some(sector) => self.enter_sector(thing, sector),
                None => {
                    thing.sector = None;
                    thing.floor = f32::NEG_INFINITY;
                    thing.ceiling = f32::INFINITY;
                }
            }
        }

        thing.position.y += thing.dy;
        thing.dy -= thing.gravity;
        if thing.position.y <= thing.floor {
            thing.position.y = thing.floor;
            thing.dx = 0.0;
            thing.dy = 0.0;
            thing.dz = 0.0;
        }

        match thing.update_animation(self.config.animation_rate) {
            AnimationSignal::Done => Lifecycle::Remove,
            _ => Lifecycle::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::math::Vec3;
    use crate::test_support::test_world;
    use crate::world::Membership;

    #[test]
    fn test_particle_removed_when_animation_done() {
        let mut world = test_world(&[("hero", 2.0, 2.0)]);
        let puff = world.spawn_at("puff", Vec3::new(4.0, 1.0, 4.0), Vec3::ZERO).unwrap();
        let rate = world.config().animation_rate;

        // Two frames: done after 2 * rate ticks
        for _ in 0..rate * 2 - 1 {
            world.update();
        }
        assert!(world.thing(puff).is_some());
        world.update();
        assert!(world.thing(puff).is_none());
        assert!(world.grid.cells_containing(puff, Membership::Particle).is_empty());
        assert_eq!(world.things_in_order().count(), 1);
    }

    #[test]
    fn test_particle_lands_and_stops() {
        let mut world = test_world(&[("hero", 2.0, 2.0)]);
        let gib = world.spawn_at("gib", Vec3::new(4.0, 1.0, 4.0), Vec3::new(0.05, 0.1, 0.0)).unwrap();
        for _ in 0..40 {
            world.update();
        }
        let gib = world.thing(gib).unwrap();
        assert_eq!(gib.position.y, 0.0);
        assert_eq!(gib.dx, 0.0);
        assert!(gib.position.x > 4.0);
    }

    #[test]
    fn test_off_map_particle_keeps_falling() {
        let mut world = test_world(&[("hero", 2.0, 2.0)]);
        let gib = world.spawn_at("gib", Vec3::new(-3.0, 1.0, 4.0), Vec3::ZERO).unwrap();
        for _ in 0..20 {
            world.update();
        }
        let gib = world.thing(gib).unwrap();
        assert!(gib.sector.is_none());
        assert!(gib.position.y < 0.0);
    }
}
