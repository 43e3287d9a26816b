//! World module - sector-based 2.5D level representation
//!
//! Static side of the simulation:
//! - Sector graph: polygon regions with floor/ceiling bands, joined by lines
//! - Uniform grid: broad-phase buckets for lines, things and particles
//! - Map data: the resolved form the loader produces

mod geometry;
mod grid;
mod level;

pub use geometry::*;
pub use grid::*;
pub use level::*;
