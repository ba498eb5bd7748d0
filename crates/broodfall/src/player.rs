//! # Player Interface
//!
//! The swarm reads the player through [`PlayerState`] and copies it into a
//! [`PlayerSnapshot`] once per tick, so every spider decides against the
//! same position. The player's health lives here too, in
//! [`PlayerCombatState`], because only the combat rules change it.

use std::time::Duration;

use broodfall_shared::{Vec3, MAX_HEALTH};

use crate::schedule::ScheduledTask;

/// Read-only view of the player provided by the game.
pub trait PlayerState {
    /// Eye position in world space.
    fn position(&self) -> Vec3;
    /// Unit vector the player is looking along.
    fn forward(&self) -> Vec3;
    /// Whether the flashlight is on.
    fn is_light_on(&self) -> bool;
}

/// Player state frozen for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Eye position.
    pub position: Vec3,
    /// Look direction (normalized on capture).
    pub forward: Vec3,
    /// Flashlight state.
    pub light_on: bool,
}

impl PlayerSnapshot {
    /// Creates a snapshot directly.
    #[must_use]
    pub fn new(position: Vec3, forward: Vec3, light_on: bool) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
            light_on,
        }
    }

    /// Copies the current state of a player.
    #[must_use]
    pub fn capture(player: &dyn PlayerState) -> Self {
        Self::new(player.position(), player.forward(), player.is_light_on())
    }
}

impl PlayerState for PlayerSnapshot {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn is_light_on(&self) -> bool {
        self.light_on
    }
}

/// The player's health and the timers around it.
#[derive(Clone, Debug)]
pub struct PlayerCombatState {
    health: i32,
    last_attack: Option<Duration>,
    regen: ScheduledTask,
    defeated: bool,
}

impl PlayerCombatState {
    /// Full-health player. `regen_interval` is the period of regen steps.
    #[must_use]
    pub fn new(regen_interval: Duration) -> Self {
        Self {
            health: MAX_HEALTH,
            last_attack: None,
            regen: ScheduledTask::new(regen_interval),
            defeated: false,
        }
    }

    /// Current health in `[0, 100]`.
    #[inline]
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Clock time of the last bite, if any.
    #[inline]
    #[must_use]
    pub const fn last_attack(&self) -> Option<Duration> {
        self.last_attack
    }

    /// True while a regen task is pending.
    #[inline]
    #[must_use]
    pub fn is_regenerating(&self) -> bool {
        self.regen.is_pending()
    }

    /// True once health has reached zero.
    #[inline]
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Health bar fill in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        health_fraction(self.health)
    }

    /// Applies a bite. Returns the new health.
    pub(crate) fn take_damage(&mut self, amount: i32, now: Duration) -> i32 {
        self.health = (self.health - amount).max(0);
        self.last_attack = Some(now);
        self.regen.cancel();
        self.health
    }

    /// Latches defeat. Returns `true` only the first time.
    pub(crate) fn mark_defeated(&mut self) -> bool {
        if self.defeated {
            return false;
        }
        self.defeated = true;
        self.regen.cancel();
        true
    }

    /// Adds health up to the cap. Returns the amount actually restored.
    pub(crate) fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount).min(MAX_HEALTH);
        self.health - before
    }

    pub(crate) fn regen_task_mut(&mut self) -> &mut ScheduledTask {
        &mut self.regen
    }
}

/// Health bar fill for any health value.
#[inline]
#[must_use]
pub fn health_fraction(health: i32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let fraction = health as f32 / MAX_HEALTH as f32;
    fraction.clamp(0.0, 1.0)
}
