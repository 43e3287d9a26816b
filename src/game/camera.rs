//! Camera
//!
//! Decoupled from any thing's transform. In follow mode it eases toward a
//! point behind and above its target; in cinema mode it plays host-supplied
//! keyframes and reports when the sequence ends.

use serde::{Serialize, Deserialize};
use crate::config::SimConfig;
use crate::math::{wrap_angle, Vec2, Vec3};
use super::entity::ThingId;
use super::thing::Thing;

/// One scripted camera pose, reached over `ticks` ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub position: Vec3,
    pub rotation: f32,
    #[serde(default)]
    pub pitch: f32,
    pub ticks: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct Cinema {
    keyframes: Vec<Keyframe>,
    index: usize,
    elapsed: u32,
    /// Pose the current segment started from
    from: (Vec3, f32, f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: f32,
    pub pitch: f32,
    pub target: Option<ThingId>,
    cinema: Option<Cinema>,
}

impl Camera {
    pub fn in_cinema(&self) -> bool {
        self.cinema.is_some()
    }

    /// Where follow mode wants to be for a target
    fn follow_pose(target: &Thing, config: &SimConfig) -> Vec3 {
        let back = Vec2::from_angle(target.rotation) * -config.camera_distance;
        Vec3::new(
            target.position.x + back.x,
            target.position.y + config.camera_height,
            target.position.z + back.y,
        )
    }

    /// Jump straight to the follow pose.
    pub fn snap_to(&mut self, target: &Thing, config: &SimConfig) {
        self.position = Self::follow_pose(target, config);
        self.rotation = target.rotation;
    }

    /// Ease one tick toward the follow pose.
    pub fn follow(&mut self, target: &Thing, config: &SimConfig) {
        let t = config.camera_lerp.clamp(0.0, 1.0);
        self.position = self.position.lerp(Self::follow_pose(target, config), t);
        self.rotation = wrap_angle(self.rotation + wrap_angle(target.rotation - self.rotation) * t);
        self.pitch -= self.pitch * t;
    }

    pub fn begin_cinema(&mut self, keyframes: Vec<Keyframe>) {
        self.cinema = Some(Cinema {
            keyframes,
            index: 0,
            elapsed: 0,
            from: (self.position, self.rotation, self.pitch),
        });
    }

    /// Step the scripted sequence. Returns true on the tick it finishes.
    pub fn advance_cinema(&mut self) -> bool {
        let Some(cinema) = self.cinema.as_mut() else { return false };

        while let Some(frame) = cinema.keyframes.get(cinema.index).copied() {
            cinema.elapsed += 1;
            let t = if frame.ticks == 0 { 1.0 } else { (cinema.elapsed as f32 / frame.ticks as f32).min(1.0) };
            if t < 1.0 {
                let (from_pos, from_rot, from_pitch) = cinema.from;
                self.position = from_pos.lerp(frame.position, t);
                self.rotation = wrap_angle(from_rot + wrap_angle(frame.rotation - from_rot) * t);
                self.pitch = from_pitch + (frame.pitch - from_pitch) * t;
                return false;
            }
            self.position = frame.position;
            self.rotation = frame.rotation;
            self.pitch = frame.pitch;
            cinema.index += 1;
            cinema.elapsed = 0;
            cinema.from = (frame.position, frame.rotation, frame.pitch);
            if frame.ticks > 0 {
                break;
            }
        }

        if cinema.index >= cinema.keyframes.len() {
            self.cinema = None;
            return true;
        }
        false
    }
}
