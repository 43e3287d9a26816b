//! Missiles
//!
//! No state machine: each tick the missile moves by its velocity, then
//! gravity bends `dy`. Touching a physical thing other than its owner, a
//! blocking line, the floor or the ceiling makes it hit: damage the thing
//! (if any), play the impact sound, leave an explosion, retire.

use std::rc::Rc;
use tracing::debug;
use crate::math::Vec3;
use super::collision::{Blocker, MoveTest};
use super::entity::ThingId;
use super::thing::{Lifecycle, Thing, ThingKind};
use super::world::World;

impl World {
    pub(crate) fn update_missile(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        let ThingKind::Missile { owner, .. } = thing.kind else { return Lifecycle::Keep };
        thing.animation.advance_looped(self.config.animation_rate);

        let (x, z) = (thing.position.x + thing.dx, thing.position.z + thing.dz);
        if let Some(victim) = self.missile_victim(id, thing, owner, x, z) {
            return self.missile_hit(id, thing, Some(victim));
        }
        match self.test_move(id, thing, x, z) {
            MoveTest::Blocked(Blocker::Thing(victim)) => return self.missile_hit(id, thing, Some(victim)),
            MoveTest::Blocked(Blocker::Line(_)) => return self.missile_hit(id, thing, None),
            MoveTest::Clear { crossing } => self.commit_move(id, thing, x, z, crossing),
        }

        thing.position.y += thing.dy;
        thing.dy -= thing.gravity;
        if thing.sector.is_none()
            || thing.position.y <= thing.floor
            || thing.position.y + thing.height >= thing.ceiling
        {
            return self.missile_hit(id, thing, None);
        }
        Lifecycle::Keep
    }

    /// Physical thing overlapping the missile at (x, z), owner excluded.
    fn missile_victim(&self, id: ThingId, thing: &Thing, owner: Option<ThingId>, x: f32, z: f32) -> Option<ThingId> {
        let range = self.grid.range(x, z, thing.radius);
        self.grid.things_in_range(range).into_iter().find(|&other_id| {
            other_id != id
                && Some(other_id) != owner
                && self.things.get(other_id).map_or(false, |other| {
                    other.physical
                        && thing.overlaps_at(x, z, other)
                        && thing.position.y <= other.position.y + other.height
                        && thing.position.y + thing.height >= other.position.y
                })
        })
    }

    fn missile_hit(&mut self, id: ThingId, thing: &mut Thing, victim: Option<ThingId>) -> Lifecycle {
        let ThingKind::Missile { owner, damage } = thing.kind else { return Lifecycle::Remove };
        debug!(?id, def = %thing.def, ?victim, "missile hit");

        if let Some(victim) = victim {
            // Blood flies back the way the missile came
            let from = thing.position - Vec3::new(thing.dx, 0.0, thing.dz);
            self.apply_damage(victim, damage, owner, Some(from));
        }

        let defs = Rc::clone(&self.defs);
        if let Ok(def) = defs.get(&thing.def) {
            self.play_sound(def.sounds.impact.as_deref(), thing.position);
            let at = Vec3::new(thing.position.x, thing.position.y.max(thing.floor), thing.position.z);
            self.spawn_effect(def.explosion.as_deref(), at, Vec3::ZERO);
        }
        Lifecycle::Remove
    }
}

#[cfg(test)]
mod tests {
    use crate::math::Vec3;
    use crate::test_support::test_world;
    use crate::game::ThingKind;

    fn launch(world: &mut crate::game::World, at: Vec3, velocity: Vec3, damage: i32) -> crate::game::ThingId {
        let id = world.spawn_at("fireball", at, velocity).unwrap();
        if let Some(m) = world.things.get_mut(id) {
            m.kind = ThingKind::Missile { owner: None, damage };
        }
        id
    }

    #[test]
    fn test_missile_hits_thing() {
        let mut world = test_world(&[("hero", 2.0, 6.0), ("villager", 6.0, 4.0)]);
        let villager = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        world.events.clear_all();
        let missile = launch(&mut world, Vec3::new(3.0, 0.5, 4.0), Vec3::new(0.3, 0.0, 0.0), 12);

        for _ in 0..20 {
            world.update();
        }
        assert!(world.thing(missile).is_none());
        assert_eq!(world.thing(villager).unwrap().health, 18);
        assert!(world.events.sound.iter().any(|s| s.name == "boom"));
        assert!(world.events.spawn.iter().any(|s| s.def == "puff"));
        assert_eq!(world.events.damage.len(), 1);
    }

    #[test]
    fn test_missile_skips_owner() {
        let mut world = test_world(&[("hero", 2.0, 4.0)]);
        let hero = world.hero().unwrap();
        let missile = world.spawn_at("fireball", Vec3::new(2.0, 0.5, 4.0), Vec3::new(0.3, 0.0, 0.0)).unwrap();
        if let Some(m) = world.things.get_mut(missile) {
            m.kind = ThingKind::Missile { owner: Some(hero), damage: 10 };
        }
        world.update();
        assert!(world.thing(missile).is_some());
        assert_eq!(world.thing(hero).unwrap().health, 100);
    }

    #[test]
    fn test_missile_explodes_on_wall() {
        let mut world = test_world(&[("hero", 2.0, 6.0)]);
        world.events.clear_all();
        let missile = launch(&mut world, Vec3::new(3.0, 1.0, 2.0), Vec3::new(-0.3, 0.0, 0.0), 5);
        for _ in 0..20 {
            world.update();
        }
        assert!(world.thing(missile).is_none());
        assert!(world.events.damage.is_empty());
        assert_eq!(world.events.sound.iter().filter(|s| s.name == "boom").count(), 1);
    }

    #[test]
    fn test_missile_explodes_on_floor() {
        let mut world = test_world(&[("hero", 2.0, 6.0)]);
        let missile = launch(&mut world, Vec3::new(4.0, 1.0, 2.0), Vec3::new(0.0, -0.2, 0.0), 5);
        for _ in 0..10 {
            world.update();
        }
        assert!(world.thing(missile).is_none());
    }

    #[test]
    fn test_explosion_first_updates_next_tick() {
        let mut world = test_world(&[("hero", 2.0, 6.0)]);
        launch(&mut world, Vec3::new(0.5, 1.0, 2.0), Vec3::new(-0.3, 0.0, 0.0), 5);
        world.update();
        let (_, puff) = world.things_in_order().find(|(_, t)| t.def == "puff").unwrap();
        assert_eq!(puff.animation.modulo, 0);
        assert_eq!(puff.animation.frame, 0);
    }
}
