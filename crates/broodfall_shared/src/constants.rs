//! # World Constants
//!
//! Values every collaborator agrees on. Tunable gameplay numbers live in
//! `broodfall::config` instead.

// =============================================================================
// WORLD
// =============================================================================

/// Height of the floor. Every spider's feet stay exactly here.
pub const GROUND_Y: f32 = 0.0;

/// Tick rate (updates per second).
pub const TICK_RATE: u32 = 60;

/// Fixed frame duration in milliseconds at [`TICK_RATE`].
pub const FRAME_MS: u64 = 1000 / TICK_RATE as u64;

// =============================================================================
// HEALTH
// =============================================================================

/// Maximum health for spiders and the player.
pub const MAX_HEALTH: i32 = 100;
