//! sector-world: a fixed-tick 2.5D sector world simulation
//!
//! Doom-style sector maps with a uniform broad-phase grid, and things that
//! walk, fight, shoot and bleed on top of them:
//! - Sector graph with floor/ceiling bands and portal lines
//! - Grid buckets for lines, things and particles
//! - Hero, monsters, NPCs, missiles, particles and items
//! - Event queues and a follow/cinema camera for the host

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod math;
pub mod config;
pub mod world;
pub mod game;

#[cfg(test)]
pub(crate) mod test_support;
