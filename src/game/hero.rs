//! Hero
//!
//! Driven by a per-tick `HeroInput` from the host. Moves through the same
//! collision resolver as everything else, attacks with the first attack
//! option of its definition, interacts with triggered lines in reach and
//! picks up overlapping medkits and armor.

use std::rc::Rc;
use tracing::debug;
use crate::math::{wrap_angle, Vec2};
use crate::world::LineId;
use super::animation::AnimationSignal;
use super::defs::EntityDef;
use super::entity::ThingId;
use super::event::TriggerEvent;
use super::thing::{HeroState, HeroStatus, Lifecycle, Thing, ThingKind};
use super::world::World;

/// Host input for one tick. Axes are in -1..=1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeroInput {
    pub forward: f32,
    pub strafe: f32,
    pub turn: f32,
    /// Start an attack (consumed when read). Held into the last frame of a
    /// swing, it chains the next one.
    pub attack: bool,
    /// Use the closest triggered line in reach (consumed when read)
    pub interact: bool,
}

/// Fraction of top speed gained per tick of input
const ACCELERATION: f32 = 0.25;

impl World {
    pub(crate) fn update_hero(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        let ThingKind::Hero(mut state) = thing.kind else { return Lifecycle::Keep };
        let defs = Rc::clone(&self.defs);
        let Ok(def) = defs.get(&thing.def) else { return Lifecycle::Keep };

        let input = self.hero_input;
        self.hero_input.attack = false;
        self.hero_input.interact = false;

        match state.status {
            HeroStatus::Walk => {
                self.hero_walk(id, thing, def, &input);
                if input.attack {
                    self.start_hero_attack(thing, def, &mut state);
                }
                if input.interact {
                    self.hero_interact(id, thing);
                }
                self.hero_pickups(thing);
            }
            HeroStatus::Attack => {
                self.hero_walk(id, thing, def, &input);
                let attack = state.attack.and_then(|i| def.attacks.get(i));
                let signal = match attack {
                    Some(attack) => self.run_attack(id, thing, attack, state.target),
                    None => AnimationSignal::Done,
                };
                match signal {
                    AnimationSignal::AlmostDone if input.attack => state.queued = true,
                    AnimationSignal::Done => {
                        let chain = state.queued;
                        state = HeroState::default();
                        if chain {
                            self.start_hero_attack(thing, def, &mut state);
                        } else {
                            thing.set_animation(def, "idle");
                        }
                    }
                    _ => {}
                }
                self.hero_pickups(thing);
            }
            HeroStatus::Dead => {
                thing.kind = ThingKind::Hero(state);
                self.update_dying(id, thing);
                return Lifecycle::Keep;
            }
            HeroStatus::Final => {}
        }

        thing.kind = ThingKind::Hero(state);
        Lifecycle::Keep
    }

    fn hero_walk(&mut self, id: ThingId, thing: &mut Thing, def: &EntityDef, input: &HeroInput) {
        thing.rotation = wrap_angle(thing.rotation + input.turn * self.config.turn_speed);

        let facing = Vec2::from_angle(thing.rotation);
        let right = Vec2::new(-facing.y, facing.x);
        let push = facing * input.forward + right * input.strafe;
        if push.len() > 0.0 {
            let push = if push.len() > 1.0 { push.normalize() } else { push };
            let mut velocity = Vec2::new(thing.dx, thing.dz) + push * (thing.speed * ACCELERATION);
            if velocity.len() > thing.speed {
                velocity = velocity.normalize() * thing.speed;
            }
            thing.dx = velocity.x;
            thing.dz = velocity.y;
        }

        self.integrate(id, thing);

        if matches!(thing.kind, ThingKind::Hero(HeroState { status: HeroStatus::Walk, .. })) {
            let moving = thing.dx != 0.0 || thing.dz != 0.0;
            let wanted = if moving { "move" } else { "idle" };
            if thing.animation.name() != wanted {
                thing.set_animation(def, wanted);
            }
            thing.animation.advance_looped(self.config.animation_rate);
        }
    }

    /// Begin the first attack option against the closest target.
    fn start_hero_attack(&self, thing: &mut Thing, def: &EntityDef, state: &mut HeroState) {
        let Some(attack) = def.attacks.first() else { return };
        state.status = HeroStatus::Attack;
        state.attack = Some(0);
        state.target = self.closest_target(thing, def.sight);
        thing.set_animation(def, &attack.animation);
    }

    /// Closest live hostile in sight range and view.
    fn closest_target(&self, thing: &Thing, sight: f32) -> Option<ThingId> {
        self.order
            .iter()
            .filter_map(|&id| Some((id, self.things.get(id)?)))
            .filter(|(_, other)| {
                other.is_live_target()
                    && thing.group.is_hostile_to(other.group)
                    && thing.distance_to(other) <= sight
                    && self.can_see(thing, other)
            })
            .min_by(|(_, a), (_, b)| thing.distance_to(a).total_cmp(&thing.distance_to(b)))
            .map(|(id, _)| id)
    }

    /// Fire every trigger on the closest triggered line within reach.
    fn hero_interact(&mut self, id: ThingId, thing: &Thing) {
        let reach = self.config.interact_range;
        let range = self.grid.range(thing.position.x, thing.position.z, reach);
        let p = thing.xz();

        let closest = self
            .grid
            .lines_in_range(range)
            .into_iter()
            .filter(|line| self.triggers.contains_key(line))
            .map(|line| (line, self.map.line(line).distance_to(p)))
            .filter(|&(_, d)| d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((line, _)) = closest else { return };
        self.fire_line_triggers(line, Some(id));
    }

    pub(crate) fn fire_line_triggers(&mut self, line: LineId, source: Option<ThingId>) {
        let Some(specs) = self.triggers.get(&line) else { return };
        for spec in specs {
            debug!(line = line.0, event = %spec.event, "trigger");
            self.events.trigger.send(TriggerEvent {
                name: spec.event.clone(),
                params: spec.params.clone(),
                line: Some(line),
                source,
            });
        }
    }

    /// Collect overlapping medkits and armor the hero can use.
    fn hero_pickups(&mut self, thing: &mut Thing) {
        let range = self.grid.range(thing.position.x, thing.position.z, thing.radius);
        let candidates = self.grid.things_in_range(range);
        let defs = Rc::clone(&self.defs);

        for item_id in candidates {
            let Some(item) = self.things.get(item_id) else { continue };
            if !thing.overlaps_at(thing.position.x, thing.position.z, item) {
                continue;
            }
            let Ok(item_def) = defs.get(&item.def) else { continue };
            let taken = match item.kind {
                ThingKind::Medkit if thing.health < thing.max_health => {
                    thing.health = (thing.health + item_def.amount).min(thing.max_health);
                    true
                }
                ThingKind::Armor if thing.armor < self.config.max_armor => {
                    thing.armor = (thing.armor + item_def.amount).min(self.config.max_armor);
                    true
                }
                _ => false,
            };
            if taken {
                let position = item.position;
                debug!(item = %item.def, health = thing.health, armor = thing.armor, "picked up");
                self.play_sound(item_def.sounds.pickup.as_deref(), position);
                self.despawn(item_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_world, LEDGE_LINE};

    #[test]
    fn test_forward_input_moves_along_facing() {
        let mut world = test_world(&[("hero", 2.0, 4.0)]);
        world.set_hero_input(HeroInput { forward: 1.0, ..Default::default() });
        for _ in 0..10 {
            world.update();
        }
        let hero = world.thing(world.hero().unwrap()).unwrap();
        assert!(hero.position.x > 2.5);
        assert!((hero.position.z - 4.0).abs() < 1e-4);
        assert!(Vec2::new(hero.dx, hero.dz).len() <= hero.speed + 1e-6);
        assert_eq!(hero.animation.name(), "move");
    }

    #[test]
    fn test_turn_input_rotates() {
        let mut world = test_world(&[("hero", 2.0, 4.0)]);
        world.set_hero_input(HeroInput { turn: 1.0, ..Default::default() });
        world.update();
        let hero = world.thing(world.hero().unwrap()).unwrap();
        assert!((hero.rotation - world.config().turn_speed).abs() < 1e-6);
    }

    #[test]
    fn test_medkit_heals_up_to_max() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("medkit", 2.2, 4.0)]);
        let hero = world.hero().unwrap();
        let medkit = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        world.things.get_mut(hero).unwrap().health = 90;
        world.update();

        assert_eq!(world.thing(hero).unwrap().health, 100);
        assert!(world.thing(medkit).is_none());
        assert!(world.events.sound.iter().any(|s| s.name == "pickup"));
    }

    #[test]
    fn test_full_health_leaves_medkit() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("medkit", 2.2, 4.0)]);
        let medkit = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        world.update();
        assert!(world.thing(medkit).is_some());
    }

    #[test]
    fn test_armor_capped() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("armor", 2.2, 4.0)]);
        let hero = world.hero().unwrap();
        let cap = world.config().max_armor;
        world.things.get_mut(hero).unwrap().armor = cap - 10;
        world.update();
        assert_eq!(world.thing(hero).unwrap().armor, cap);
    }

    #[test]
    fn test_interact_fires_line_trigger() {
        let mut world = test_world(&[("hero", 7.0, 4.0)]);
        world.events.clear_all();
        world.set_hero_input(HeroInput { interact: true, ..Default::default() });
        world.update();

        let fired: Vec<_> = world.events.trigger.drain().collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].name, "interact-line");
        assert_eq!(fired[0].params, vec!["door".to_string(), "1".to_string()]);
        assert_eq!(fired[0].line, Some(LineId(LEDGE_LINE as u32)));
        assert_eq!(fired[0].source, world.hero());

        // One-shot: nothing more on the next tick
        world.update();
        assert!(world.events.trigger.is_empty());
    }

    #[test]
    fn test_interact_out_of_reach_does_nothing() {
        let mut world = test_world(&[("hero", 3.0, 4.0)]);
        world.set_hero_input(HeroInput { interact: true, ..Default::default() });
        world.update();
        assert!(world.events.trigger.is_empty());
    }

    #[test]
    fn test_punch_hits_adjacent_monster() {
        let mut world = test_world(&[("hero", 2.0, 4.0), ("imp", 3.2, 4.0)]);
        let imp = world.things_in_order().nth(1).map(|(id, _)| id).unwrap();
        world.set_hero_input(HeroInput { attack: true, ..Default::default() });
        let rate = world.config().animation_rate;
        for _ in 0..rate * 2 + 1 {
            world.update();
        }
        assert!(world.events.sound.iter().any(|s| s.name == "swing"));
        assert!(world.events.damage.iter().any(|d| d.target == imp && d.amount == 10));
    }

    #[test]
    fn test_attack_held_into_last_frame_chains() {
        let mut world = test_world(&[("hero", 2.0, 2.0)]);
        let id = world.hero().unwrap();
        // Start tick plus three 5-tick frames
        for _ in 0..16 {
            world.set_hero_input(HeroInput { attack: true, ..Default::default() });
            world.update();
        }
        let hero = world.thing(id).unwrap();
        assert!(matches!(hero.kind, ThingKind::Hero(HeroState { status: HeroStatus::Attack, queued: false, .. })));
        assert_eq!((hero.animation.name(), hero.animation.frame), ("punch", 0));
        assert_eq!(world.events.sound.iter().filter(|s| s.name == "swing").count(), 1);
    }

    #[test]
    fn test_released_attack_returns_to_walk() {
        let mut world = test_world(&[("hero", 2.0, 2.0)]);
        let id = world.hero().unwrap();
        world.set_hero_input(HeroInput { attack: true, ..Default::default() });
        for _ in 0..16 {
            world.update();
        }
        let hero = world.thing(id).unwrap();
        assert!(matches!(hero.kind, ThingKind::Hero(HeroState { status: HeroStatus::Walk, .. })));
        assert_eq!(hero.animation.name(), "idle");
    }
}
