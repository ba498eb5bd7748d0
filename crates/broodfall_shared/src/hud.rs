//! HUD-facing types.
//!
//! The HUD never reads the swarm directly. It receives [`HudSnapshot`]s
//! and filters events by [`EventKind`].

use serde::{Deserialize, Serialize};

/// Event type discriminator
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A spider entered the world
    Spawned = 0,
    /// A spider took projectile damage
    DamageDealt = 1,
    /// A spider died
    EntityKilled = 2,
    /// The player took melee damage
    PlayerDamaged = 3,
    /// The player regenerated health
    PlayerHealed = 4,
    /// The player's health reached zero
    PlayerKilled = 5,
    /// Counters changed
    HudUpdate = 6,
    /// A spider changed AI state
    StateChanged = 7,
    /// A spider started an attack animation
    AttackCue = 8,
    /// A sound should be played
    Sound = 9,
    /// A spider should flash red
    HitFlash = 10,
    /// A spider's health bar changed
    HealthBar = 11,
}

/// Counters shown on the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// Spiders currently alive.
    pub live: u32,
    /// Spiders spawned so far.
    pub spawned: u32,
    /// Spiders the spawner will produce in total.
    pub total: u32,
    /// Spiders killed so far.
    pub killed: u32,
    /// Player health in `[0, 100]`.
    pub player_health: i32,
}

impl HudSnapshot {
    /// Spiders not yet spawned.
    #[must_use]
    pub fn remaining_to_spawn(&self) -> u32 {
        self.total.saturating_sub(self.spawned)
    }

    /// True once every spider has been spawned and none is left alive,
    /// whether they were killed or removed.
    #[must_use]
    pub fn swarm_cleared(&self) -> bool {
        self.total > 0 && self.spawned >= self.total && self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_to_spawn() {
        let hud = HudSnapshot {
            live: 3,
            spawned: 5,
            total: 24,
            killed: 2,
            player_health: 100,
        };
        assert_eq!(hud.remaining_to_spawn(), 19);
        assert!(!hud.swarm_cleared());
    }

    #[test]
    fn test_swarm_cleared() {
        let hud = HudSnapshot {
            live: 0,
            spawned: 24,
            total: 24,
            killed: 24,
            player_health: 40,
        };
        assert!(hud.swarm_cleared());
        assert!(!HudSnapshot::default().swarm_cleared());
    }

    #[test]
    fn test_swarm_cleared_counts_removed_spiders() {
        let removed = HudSnapshot {
            live: 0,
            spawned: 24,
            total: 24,
            killed: 20,
            player_health: 100,
        };
        assert!(removed.swarm_cleared());

        let still_spawning = HudSnapshot {
            live: 0,
            spawned: 10,
            total: 24,
            killed: 10,
            player_health: 100,
        };
        assert!(!still_spawning.swarm_cleared());
    }
}
