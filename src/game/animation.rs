//! Frame-sequence animation
//!
//! Every tick bumps a sub-frame counter; at the animation rate the counter
//! wraps and the frame advances. The returned signal, not a bool, drives
//! state transitions.

use serde::{Serialize, Deserialize};

/// A named sequence of sprite indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<u32>,
}

impl Animation {
    pub fn new(name: impl Into<String>, frames: Vec<u32>) -> Self {
        Self { name: name.into(), frames }
    }

    /// Frame count. An empty sequence behaves as a single blank frame.
    pub fn len(&self) -> usize {
        self.frames.len().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sprite for a frame index, clamped to the last frame.
    pub fn sprite(&self, frame: usize) -> Option<u32> {
        let last = self.frames.len().checked_sub(1)?;
        self.frames.get(frame.min(last)).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationSignal {
    NotDone,
    /// Just entered the final frame
    AlmostDone,
    /// Just advanced past the final frame
    Done,
}

/// Playback cursor over an `Animation`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    pub animation: Animation,
    pub frame: usize,
    /// Sub-frame tick counter
    pub modulo: u32,
}

impl AnimationState {
    pub fn new(animation: Animation) -> Self {
        Self { animation, frame: 0, modulo: 0 }
    }

    pub fn name(&self) -> &str {
        &self.animation.name
    }

    /// Switch sequence and rewind.
    pub fn set(&mut self, animation: Animation) {
        self.animation = animation;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.modulo = 0;
    }

    /// Advance one tick.
    pub fn advance(&mut self, rate: u32) -> AnimationSignal {
        self.modulo += 1;
        if self.modulo < rate.max(1) {
            return AnimationSignal::NotDone;
        }
        self.modulo = 0;
        self.frame += 1;

        let len = self.animation.len();
        if self.frame == len {
            AnimationSignal::Done
        } else if self.frame == len - 1 {
            AnimationSignal::AlmostDone
        } else {
            AnimationSignal::NotDone
        }
    }

    /// Advance and rewind on completion.
    pub fn advance_looped(&mut self, rate: u32) -> AnimationSignal {
        let signal = self.advance(rate);
        if signal == AnimationSignal::Done {
            self.frame = 0;
        }
        signal
    }

    /// True on the tick a frame became current (including frame 0 after a reset).
    pub fn entered(&self, frame: usize) -> bool {
        self.modulo == 0 && self.frame == frame
    }

    /// Hold the final frame.
    pub fn pin_last(&mut self) {
        self.frame = self.animation.len() - 1;
        self.modulo = 0;
    }

    pub fn sprite(&self) -> Option<u32> {
        self.animation.sprite(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: &mut AnimationState, ticks: u32, rate: u32) -> Vec<AnimationSignal> {
        (0..ticks).map(|_| state.advance(rate)).collect()
    }

    #[test]
    fn test_signal_sequence() {
        let (n, rate) = (4u32, 3u32);
        let mut state = AnimationState::new(Animation::new("walk", vec![1, 2, 3, 4]));

        // Frame 0 is shown for one full period first
        let first = run(&mut state, rate, rate);
        assert!(first.iter().all(|&s| s == AnimationSignal::NotDone));
        assert_eq!(state.frame, 1);

        let middle = run(&mut state, rate * (n - 2), rate);
        assert_eq!(middle.last(), Some(&AnimationSignal::AlmostDone));
        assert_eq!(middle.iter().filter(|&&s| s == AnimationSignal::AlmostDone).count(), 1);
        assert_eq!(state.frame, 3);

        let last = run(&mut state, rate, rate);
        assert_eq!(last.last(), Some(&AnimationSignal::Done));

        // No second Done without a reset
        let after = run(&mut state, rate * 3, rate);
        assert!(after.iter().all(|&s| s == AnimationSignal::NotDone));

        state.reset();
        let again = run(&mut state, rate * n, rate);
        assert_eq!(again.last(), Some(&AnimationSignal::Done));
    }

    #[test]
    fn test_looped_rewinds() {
        let mut state = AnimationState::new(Animation::new("idle", vec![7, 8]));
        let signals: Vec<_> = (0..4).map(|_| state.advance_looped(2)).collect();
        assert_eq!(signals[3], AnimationSignal::Done);
        assert_eq!(state.frame, 0);
        assert_eq!(state.sprite(), Some(7));
    }

    #[test]
    fn test_empty_animation_finishes() {
        let mut state = AnimationState::new(Animation::new("death", vec![]));
        assert_eq!(state.advance(1), AnimationSignal::Done);
        assert_eq!(state.sprite(), None);
    }

    #[test]
    fn test_entered_and_pin() {
        let mut state = AnimationState::new(Animation::new("claw", vec![1, 2, 3]));
        assert!(state.entered(0));
        state.advance(2);
        assert!(!state.entered(0));
        state.advance(2);
        assert!(state.entered(1));
        state.pin_last();
        assert_eq!(state.sprite(), Some(3));
    }
}
