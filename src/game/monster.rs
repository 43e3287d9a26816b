//! Monster AI
//!
//! LOOK scans for a hostile target, CHASE walks toward it and picks an
//! attack once the reaction cooldown runs out, ATTACK plays the attack
//! animation and fires on its configured frame, DEAD plays out the death
//! animation, FINAL is never updated again.

use std::f32::consts::{FRAC_PI_4, PI};
use std::rc::Rc;
use rand::Rng;
use tracing::debug;
use crate::math::{bearing, wrap_angle, Vec2};
use super::animation::AnimationSignal;
use super::collision::integrate_vertical;
use super::defs::EntityDef;
use super::entity::ThingId;
use super::thing::{Lifecycle, MonsterState, MonsterStatus, Thing, ThingKind};
use super::world::World;

/// Facing attempts before giving up for the tick
const DIRECTION_ATTEMPTS: u32 = 4;

impl World {
    pub(crate) fn update_monster(&mut self, id: ThingId, thing: &mut Thing) -> Lifecycle {
        let ThingKind::Monster(mut state) = thing.kind else { return Lifecycle::Keep };
        let defs = Rc::clone(&self.defs);
        let Ok(def) = defs.get(&thing.def) else { return Lifecycle::Keep };
        let rate = self.config.animation_rate;

        match state.status {
            MonsterStatus::Look => {
                integrate_vertical(thing);
                thing.animation.advance_looped(rate);
                self.monster_look(thing, def, &mut state);
            }
            MonsterStatus::Chase => {
                integrate_vertical(thing);
                thing.animation.advance_looped(rate);
                self.monster_chase(id, thing, def, &mut state);
            }
            MonsterStatus::Attack => {
                integrate_vertical(thing);
                let attack = state.attack.and_then(|i| def.attacks.get(i));
                let signal = match attack {
                    Some(attack) => self.run_attack(id, thing, attack, state.target),
                    None => AnimationSignal::Done,
                };
                if signal == AnimationSignal::Done {
                    state.status = MonsterStatus::Chase;
                    state.attack = None;
                    thing.set_animation(def, "move");
                }
            }
            MonsterStatus::Dead => {
                thing.kind = ThingKind::Monster(state);
                self.update_dying(id, thing);
                return Lifecycle::Keep;
            }
            MonsterStatus::Final => {}
        }

        thing.kind = ThingKind::Monster(state);
        Lifecycle::Keep
    }

    fn monster_look(&mut self, thing: &mut Thing, def: &EntityDef, state: &mut MonsterState) {
        if state.reaction > 0 {
            state.reaction -= 1;
            return;
        }
        match self.find_target(thing, def.sight) {
            Some(target) => {
                if self.rng.gen::<f32>() < self.config.wake_sound_chance {
                    self.play_sound(def.sounds.wake.as_deref(), thing.position);
                }
                debug!(def = %thing.def, ?target, "monster woke");
                state.target = Some(target);
                state.status = MonsterStatus::Chase;
                state.move_count = 0;
                thing.set_animation(def, "move");
            }
            None => state.reaction = self.config.look_cooldown,
        }
    }

    fn monster_chase(&mut self, id: ThingId, thing: &mut Thing, def: &EntityDef, state: &mut MonsterState) {
        let target = state.target.and_then(|t| self.things.get(t)).filter(|t| t.is_live_target());
        let Some(target) = target else {
            debug!(def = %thing.def, "monster lost its target");
            state.target = None;
            state.status = MonsterStatus::Look;
            state.reaction = 0;
            thing.set_animation(def, "idle");
            return;
        };

        if state.reaction > 0 {
            state.reaction -= 1;
        } else {
            let distance = thing.distance_to(target) - thing.radius - target.radius;
            let chosen = def.attacks.iter().position(|attack| {
                distance <= attack.range && (attack.is_instant() || self.can_see(thing, target))
            });
            if let Some(index) = chosen {
                let attack = &def.attacks[index];
                debug!(def = %thing.def, attack = %attack.name, "monster attacks");
                thing.rotation = bearing(thing.xz(), target.xz());
                state.reaction = attack.reaction;
                state.status = MonsterStatus::Attack;
                state.attack = Some(index);
                thing.set_animation(def, &attack.animation);
                return;
            }
        }

        let goal = target.xz();
        let moved = if state.move_count > 0 {
            state.move_count -= 1;
            self.walk(id, thing)
        } else {
            false
        };
        if !moved {
            self.choose_direction(id, thing, goal, state);
        }
    }

    /// Step along the current facing at full speed.
    pub(crate) fn walk(&mut self, id: ThingId, thing: &mut Thing) -> bool {
        let step = Vec2::from_angle(thing.rotation) * thing.speed;
        let (x, z) = (thing.position.x + step.x, thing.position.z + step.y);
        self.try_move(id, thing, x, z)
    }

    /// Try up to four perturbed facings around the bearing to `goal`; the
    /// second pair is turned half way round. Adopts the first that moves.
    pub(crate) fn choose_direction(&mut self, id: ThingId, thing: &mut Thing, goal: Vec2, state: &mut MonsterState) -> bool {
        let toward = bearing(thing.xz(), goal);
        for attempt in 0..DIRECTION_ATTEMPTS {
            let cluster = (attempt / 2) as f32;
            let jitter = self.rng.gen_range(-FRAC_PI_4..=FRAC_PI_4);
            let previous = thing.rotation;
            thing.rotation = wrap_angle(toward + cluster * PI + jitter);
            if self.walk(id, thing) {
                let (min, max) = (self.config.move_duration_min, self.config.move_duration_max);
                state.move_count = self.rng.gen_range(min..=max);
                return true;
            }
            thing.rotation = previous;
        }
        false
    }

    /// First live hostile thing in update order within `sight` and in view.
    pub(crate) fn find_target(&self, thing: &Thing, sight: f32) -> Option<ThingId> {
        self.order.iter().copied().find(|&other_id| {
            self.things.get(other_id).map_or(false, |other| {
                other.is_live_target()
                    && thing.group.is_hostile_to(other.group)
                    && thing.distance_to(other) <= sight
                    && self.can_see(thing, other)
            })
        })
    }

    /// Shared DEAD handling: keep falling, play the death animation, then
    /// pin the last frame and leave the grid.
    pub(crate) fn update_dying(&mut self, id: ThingId, thing: &mut Thing) {
        self.integrate(id, thing);
        if thing.update_animation(self.config.animation_rate) == AnimationSignal::Done {
            thing.animation.pin_last();
            self.remove_from_cells(id, thing);
            thing.physical = false;
            thing.mark_final();
            debug!(?id, def = %thing.def, "final");
        }
    }
}
