pub mod decor;
pub mod lighting;
pub mod motion;
pub mod picking;
pub mod render;
pub mod rng;
pub mod selection;
