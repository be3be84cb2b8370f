// extensions/mod.rs
//
// Opt-in helpers shared by the scenes.

pub mod easing;

pub use easing::{ease, lerp, lerp_vec3, Easing};
