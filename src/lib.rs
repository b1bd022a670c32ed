//! FIRN: a sixty-second generative mountain cinematic.
//!
//! Eight fixed scenes (gradient backdrops, HUD narration, a progress
//! timeline) driven by a play/pause/restart transport and synchronized with
//! a procedural wind/shimmer/pulse ambient soundscape.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod palette;
#[cfg(feature = "play")]
pub mod play;
pub mod render;
pub mod sequence;
pub mod soundscape;
pub mod transport;
