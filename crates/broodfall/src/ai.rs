//! # Spider AI State Machine
//!
//! ## States
//!
//! - **IDLE**: wanders. Sees the player → ATTACK. Player close but unseen → ALERT.
//! - **ALERT**: walks straight at the player's current position.
//! - **ATTACK**: chases its alert target (or the player), detouring around
//!   walls, and plays attack animations in range. Reaching the target
//!   without seeing the player drops it back to IDLE.
//!
//! Aggro propagation can force any state into ATTACK; that lives in
//! [`crate::combat`].
//!
//! Every decision in a tick uses the same [`PlayerSnapshot`].

use std::time::Duration;

use broodfall_shared::GROUND_Y;
use rand::Rng;

use crate::config::PerceptionConfig;
use crate::player::PlayerSnapshot;
use crate::spider::{AiState, Spider, SpiderClip};
use crate::steering::Steering;

/// Outcome of one AI step for one spider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AiStep {
    /// `(from, to)` if the state changed.
    pub transition: Option<(AiState, AiState)>,
    /// Attack animation started this tick.
    pub attack: Option<SpiderClip>,
}

/// Line-of-sight predicate.
///
/// The player is seen when close, or when the flashlight is on, the spider
/// is within light range and the direction from the spider to the player
/// lines up with the player's facing (cosine above the threshold).
#[must_use]
pub fn sees_player(config: &PerceptionConfig, spider: &Spider, player: &PlayerSnapshot) -> bool {
    let to_player = player.position - spider.position;
    let distance = to_player.length();
    if distance < config.sight_radius {
        return true;
    }
    player.light_on
        && distance < config.light_radius
        && to_player.normalize_or_zero().dot(player.forward) > config.light_cone_cos
}

/// The AI rules bound to a configuration.
#[derive(Clone, Copy, Debug)]
pub struct AiStateMachine<'a> {
    config: &'a PerceptionConfig,
}

impl<'a> AiStateMachine<'a> {
    /// Binds the rules to a configuration.
    #[must_use]
    pub const fn new(config: &'a PerceptionConfig) -> Self {
        Self { config }
    }

    /// Runs one tick of behaviour for `spider`.
    ///
    /// Without `steering` (no level available) decisions are still made
    /// but the spider does not move.
    pub fn step<R: Rng + ?Sized>(
        &self,
        spider: &mut Spider,
        player: &PlayerSnapshot,
        steering: Option<&Steering<'_>>,
        rng: &mut R,
    ) -> AiStep {
        match spider.state {
            AiState::Idle => self.idle(spider, player, steering, rng),
            AiState::Alert => {
                if let Some(steering) = steering {
                    let _ = steering.seek(spider, player.position);
                }
                AiStep::default()
            }
            AiState::Attack => self.attack(spider, player, steering, rng),
        }
    }

    fn idle<R: Rng + ?Sized>(
        &self,
        spider: &mut Spider,
        player: &PlayerSnapshot,
        steering: Option<&Steering<'_>>,
        rng: &mut R,
    ) -> AiStep {
        if let Some(steering) = steering {
            let _ = steering.wander(spider, rng);
        }

        let next = if sees_player(self.config, spider, player) {
            AiState::Attack
        } else if spider.position.distance(player.position) < self.config.alert_radius {
            AiState::Alert
        } else {
            return AiStep::default();
        };

        let clip = if next == AiState::Alert {
            SpiderClip::Alert
        } else {
            SpiderClip::Running
        };
        spider.play(clip, Duration::ZERO);
        AiStep {
            transition: spider.set_state(next).map(|from| (from, next)),
            attack: None,
        }
    }

    fn attack<R: Rng + ?Sized>(
        &self,
        spider: &mut Spider,
        player: &PlayerSnapshot,
        steering: Option<&Steering<'_>>,
        rng: &mut R,
    ) -> AiStep {
        let target = spider.alert_target.unwrap_or(player.position);
        if let Some(steering) = steering {
            let direction = steering.path_toward(spider.position, target);
            let _ = steering.move_in_direction(spider, direction);
        }

        if spider.position.horizontal_distance(target) < self.config.give_up_radius
            && !sees_player(self.config, spider, player)
        {
            let transition = spider
                .set_state(AiState::Idle)
                .map(|from| (from, AiState::Idle));
            spider.wander_target = Some(target.with_y(GROUND_Y));
            spider.alert_target = None;
            return AiStep {
                transition,
                attack: None,
            };
        }

        if spider.is_attacking() {
            return AiStep::default();
        }

        let distance = spider.position.distance(player.position);
        let clip = if distance < self.config.close_attack_range {
            if rng.gen_bool(0.5) {
                SpiderClip::AttackJaw
            } else {
                SpiderClip::AttackInnerJaw
            }
        } else if distance < self.config.mid_attack_range {
            if rng.gen_bool(0.5) {
                SpiderClip::AttackLeft
            } else {
                SpiderClip::AttackRight
            }
        } else {
            return AiStep::default();
        };

        spider.play(clip, Duration::from_millis(self.config.attack_clip_ms));
        AiStep {
            transition: None,
            attack: Some(clip),
        }
    }
}
