//! # BROODFALL Shared
//!
//! Common types used by the spider AI core and its collaborators
//! (renderer bridge, HUD, audio).
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a renderer, window system or audio
//! backend. If you need those types, keep them on the engine side.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod hud;
pub mod math;

pub use constants::{GROUND_Y, MAX_HEALTH, TICK_RATE};
pub use hud::{EventKind, HudSnapshot};
pub use math::Vec3;
