//! Combat
//!
//! Damage dispatch for every damageable family, attack frame events shared by
//! the hero and monsters, and the particle effects hits leave behind.

use std::rc::Rc;
use rand::Rng;
use tracing::{debug, warn};
use crate::math::{bearing, Vec2, Vec3};
use super::animation::AnimationSignal;
use super::collision::center;
use super::defs::AttackDef;
use super::entity::ThingId;
use super::event::{DamageEvent, DeathEvent};
use super::thing::{Thing, ThingKind, MonsterStatus};
use super::world::World;

impl World {
    /// Damage a thing. Returns false when it was not applied (missing,
    /// not damageable, already dying).
    pub fn damage(&mut self, target: ThingId, amount: i32, source: Option<ThingId>) -> bool {
        let origin = source
            .and_then(|id| self.things.get(id))
            .map(center);
        self.apply_damage(target, amount, source, origin)
    }

    /// `origin` is where the hit came from; blood flies toward it.
    pub(crate) fn apply_damage(
        &mut self,
        target: ThingId,
        amount: i32,
        source: Option<ThingId>,
        origin: Option<Vec3>,
    ) -> bool {
        let Some(mut thing) = self.things.take(target) else { return false };
        let applied = self.damage_thing(target, &mut thing, amount, source, origin);
        self.things.put(target, thing);
        applied
    }

    fn damage_thing(
        &mut self,
        id: ThingId,
        thing: &mut Thing,
        amount: i32,
        source: Option<ThingId>,
        origin: Option<Vec3>,
    ) -> bool {
        if !thing.is_damageable() || thing.is_dead() {
            return false;
        }
        let defs = Rc::clone(&self.defs);
        let Ok(def) = defs.get(&thing.def) else { return false };

        let absorbed = thing.armor.min(amount / 2).max(0);
        thing.armor -= absorbed;
        let amount = amount - absorbed;
        thing.health -= amount;

        let position = thing.position;
        self.events.damage.send(DamageEvent { target: id, source, amount, position });

        if thing.health > 0 {
            self.play_sound(def.sounds.pain.as_deref(), position);
            let from = center(thing);
            let toward = origin.map_or(Vec2::ZERO, |o| (o.xz() - from.xz()).normalize());
            let velocity = Vec3::new(toward.x, 0.0, toward.y) * self.config.blood_speed;
            self.spawn_effect(def.blood.as_deref(), from, velocity);

            // Getting hit wakes an idle monster
            if let (ThingKind::Monster(mut state), Some(source)) = (thing.kind, source) {
                if state.status == MonsterStatus::Look {
                    state.target = Some(source);
                    state.status = MonsterStatus::Chase;
                    state.move_count = 0;
                    thing.kind = ThingKind::Monster(state);
                    thing.set_animation(def, "move");
                }
            }
            return true;
        }

        debug!(?id, def = %thing.def, ?source, "killed");
        self.play_sound(def.sounds.death.as_deref(), position);
        thing.mark_dead();
        thing.set_animation(def, "death");
        thing.physical = false;
        self.events.death.send(DeathEvent { thing: id, killer: source, position });

        let burst = center(thing);
        for _ in 0..self.config.death_effect_count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.config.blood_speed * self.rng.gen_range(0.5..1.5);
            let lift = self.rng.gen_range(0.0..self.config.blood_speed * 2.0);
            let dir = Vec2::from_angle(angle) * speed;
            self.spawn_effect(def.death_effect.as_deref(), burst, Vec3::new(dir.x, lift, dir.y));
        }
        true
    }

    /// Spawn a visual particle. Unknown names are skipped.
    pub(crate) fn spawn_effect(&mut self, name: Option<&str>, position: Vec3, velocity: Vec3) {
        let Some(name) = name else { return };
        if let Err(err) = self.spawn_at(name, position, velocity) {
            warn!(effect = name, %err, "skipping effect");
        }
    }

    /// Drive one tick of an attack animation: sound and fire on their frames,
    /// then advance. The caller transitions on `Done`.
    pub(crate) fn run_attack(
        &mut self,
        id: ThingId,
        thing: &mut Thing,
        attack: &AttackDef,
        target: Option<ThingId>,
    ) -> AnimationSignal {
        if let Some(target) = target.and_then(|t| self.things.get(t)) {
            thing.rotation = bearing(thing.xz(), target.xz());
        }
        if thing.animation.entered(attack.sound_frame) {
            self.play_sound(attack.sound.as_deref(), thing.position);
        }
        if thing.animation.entered(attack.fire_frame) {
            self.fire_attack(id, thing, attack, target);
        }
        thing.update_animation(self.config.animation_rate)
    }

    /// Land an instant hit or launch a projectile.
    pub(crate) fn fire_attack(&mut self, id: ThingId, thing: &Thing, attack: &AttackDef, target: Option<ThingId>) {
        let amount = attack.damage + self.roll_variance(attack.damage_variance);

        match &attack.projectile {
            None => {
                let Some(target_id) = target else { return };
                let Some(victim) = self.things.get(target_id) else { return };
                let reach = thing.distance_to(victim) - thing.radius - victim.radius;
                if reach <= attack.range {
                    self.apply_damage(target_id, amount, Some(id), Some(center(thing)));
                }
            }
            Some(projectile) => {
                let defs = Rc::clone(&self.defs);
                let Ok(missile) = defs.get(projectile) else {
                    warn!(projectile = %projectile, "unknown projectile");
                    return;
                };
                let gravity = missile.gravity.unwrap_or(self.config.gravity);
                let start = Vec3::new(
                    thing.position.x,
                    thing.center_y() - missile.height * 0.5,
                    thing.position.z,
                );

                let velocity = match target.and_then(|t| self.things.get(t)) {
                    Some(victim) => {
                        let aim = Vec3::new(victim.position.x, victim.center_y() - missile.height * 0.5, victim.position.z);
                        aim_projectile(start, aim, missile.speed, gravity)
                    }
                    None => {
                        let dir = Vec2::from_angle(thing.rotation) * missile.speed;
                        Vec3::new(dir.x, 0.0, dir.y)
                    }
                };

                match self.spawn_at(projectile, start, velocity) {
                    Ok(missile_id) => {
                        if let Some(m) = self.things.get_mut(missile_id) {
                            m.kind = ThingKind::Missile { owner: Some(id), damage: amount };
                            m.rotation = thing.rotation;
                        }
                        debug!(?id, projectile = %projectile, "fired");
                    }
                    Err(err) => warn!(projectile = %projectile, %err, "could not launch"),
                }
            }
        }
    }

    fn roll_variance(&mut self, variance: i32) -> i32 {
        if variance > 0 {
            self.rng.gen_range(0..=variance)
        } else {
            0
        }
    }
}

/// Initial velocity that carries a projectile from `start` to `aim`,
/// compensating for gravity over the flight time.
///
/// The missile moves before gravity is applied each tick, so after `t`
/// ticks it has dropped `g * t * (t - 1) / 2`.
pub fn aim_projectile(start: Vec3, aim: Vec3, speed: f32, gravity: f32) -> Vec3 {
    let flat = aim.xz() - start.xz();
    let distance = flat.len();
    if speed <= 0.0 || distance < 1e-6 {
        return Vec3::ZERO;
    }
    let ticks = (distance / speed).max(1.0);
    let dir = flat.normalize() * speed;
    let dy = (aim.y - start.y) / ticks + gravity * (ticks - 1.0) * 0.5;
    Vec3::new(dir.x, dy, dir.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_world;
    use crate::game::thing::NpcStatus;

    fn villager_world() -> (World, ThingId) {
        let world = test_world(&[("hero", 2.0, 4.0), ("villager", 5.0, 4.0)]);
        let villager = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        (world, villager)
    }

    #[test]
    fn test_non_lethal_hit_plays_pain_and_bleeds_toward_source() {
        let (mut world, villager) = villager_world();
        let hero = world.hero().unwrap();
        world.events.clear_all();

        assert!(world.damage(villager, 5, Some(hero)));
        assert_eq!(world.thing(villager).unwrap().health, 25);
        assert!(world.events.sound.iter().any(|s| s.name == "villager-pain"));

        let spawn = world.events.spawn.iter().find(|s| s.def == "blood").unwrap();
        let blood = world.thing(spawn.thing).unwrap();
        assert!(blood.dx < 0.0, "hero stands to the west");
        assert_eq!(blood.dz, 0.0);
    }

    #[test]
    fn test_damage_is_ignored_once_dead() {
        let (mut world, villager) = villager_world();
        world.events.clear_all();

        assert!(world.damage(villager, 100, None));
        let dead = world.thing(villager).unwrap();
        assert!(matches!(dead.kind, ThingKind::Npc(NpcStatus::Dead)));
        assert!(!dead.physical);
        assert_eq!(dead.animation.name(), "death");
        let health = dead.health;
        assert_eq!(world.events.death.len(), 1);
        let bursts = world.events.spawn.iter().filter(|s| s.def == "gib").count();
        assert_eq!(bursts, world.config().death_effect_count as usize);

        assert!(!world.damage(villager, 10, None));
        assert_eq!(world.thing(villager).unwrap().health, health);
        assert_eq!(world.events.death.len(), 1);

        // Play the death out to FINAL, then hit again
        for _ in 0..100 {
            world.update();
        }
        let corpse = world.thing(villager).unwrap();
        assert!(matches!(corpse.kind, ThingKind::Npc(NpcStatus::Final)));
        assert!(!world.damage(villager, 10, None));
        assert_eq!(world.thing(villager).unwrap().health, health);
        assert_eq!(world.events.death.len(), 1);
    }

    #[test]
    fn test_armor_absorbs_half() {
        let mut world = test_world(&[("hero", 2.0, 4.0)]);
        let hero = world.hero().unwrap();
        world.things.get_mut(hero).unwrap().armor = 3;
        world.damage(hero, 10, None);
        let hero = world.thing(hero).unwrap();
        // min(armor 3, 10 / 2) absorbed
        assert_eq!(hero.armor, 0);
        assert_eq!(hero.health, 93);
    }

    #[test]
    fn test_aim_compensates_for_drop() {
        let start = Vec3::new(0.0, 1.0, 0.0);
        let aim = Vec3::new(6.0, 1.0, 0.0);
        let (speed, gravity) = (0.5, 0.02);
        let mut v = aim_projectile(start, aim, speed, gravity);
        let mut p = start;
        for _ in 0..12 {
            p = p + v;
            v.y -= gravity;
        }
        assert!((p.x - 6.0).abs() < 1e-3);
        assert!((p.y - 1.0).abs() < 1e-3);
    }
}
