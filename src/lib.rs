//! Tap-to-place solar system: a scene graph of pivots and bodies, and perpetual orbit
//! animations driving the pivots.

pub mod animation;
pub mod assets;
pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod orrery;
pub mod scene_graph;
