//! Non-player characters
//!
//! STAND integrates physics and loops the idle animation; damage and death
//! go through the same path as monsters.

use super::entity::ThingId;
use super::thing::{Lifecycle, NpcStatus, Thing, ThingKind};
use super::world::World;

impl World {
    pub(crate) fn update_npc(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        match thing.kind {
            ThingKind::Npc(NpcStatus::Stand) => {
                self.integrate(id, thing);
                thing.animation.advance_looped(self.config.animation_rate);
            }
            ThingKind::Npc(NpcStatus::Dead) => self.update_dying(id, thing),
            _ => {}
        }
        Lifecycle::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_world;

    #[test]
    fn test_npc_stands_and_idles() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("villager", 5.0, 4.0)]);
        let villager = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        let start = world.thing(villager).unwrap().position;
        for _ in 0..20 {
            world.update();
        }
        let npc = world.thing(villager).unwrap();
        assert_eq!(npc.position, start);
        assert!(matches!(npc.kind, ThingKind::Npc(NpcStatus::Stand)));
        assert_eq!(npc.animation.name(), "idle");
    }

    #[test]
    fn test_knocked_npc_slides_to_rest() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("villager", 5.0, 4.0)]);
        let villager = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        world.things.get_mut(villager).unwrap().dx = 0.2;
        for _ in 0..200 {
            world.update();
        }
        let npc = world.thing(villager).unwrap();
        assert!(npc.position.x > 5.0);
        assert_eq!(npc.dx, 0.0);
    }
}
