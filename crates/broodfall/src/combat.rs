//! # Combat Resolution
//!
//! Player projectiles against spiders, spider bites against the player, and
//! the player's regeneration.
//!
//! ## Rules
//!
//! - A projectile hit removes 10 health, slows the spider by 10% (never
//!   below 20% speed) and flashes it red. A surviving spider pulls every
//!   spider near the player into ATTACK.
//! - Bites land within 0.8 horizontal units, at most once per 500 ms in
//!   total no matter how many spiders are biting.
//! - After 5 s without a bite the player regains 10 health per second up to
//!   full. A new bite cancels regeneration.
//!
//! The resolver never removes spiders itself. It reports deaths and the
//! caller sweeps them after its pass.

use std::time::Duration;

use broodfall_shared::{Vec3, MAX_HEALTH};

use crate::config::{CombatConfig, ProjectileConfig};
use crate::player::PlayerCombatState;
use crate::spider::{AiState, Spider, SpiderClip, SpiderId};

// ============================================================================
// PROJECTILES
// ============================================================================

/// Projectile identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u32);

/// A player projectile in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    id: ProjectileId,
    position: Vec3,
    direction: Vec3,
    lifetime: f32,
}

impl Projectile {
    /// Creates a projectile. `direction` is normalized.
    #[must_use]
    pub fn new(id: ProjectileId, origin: Vec3, direction: Vec3) -> Self {
        Self {
            id,
            position: origin,
            direction: direction.normalize_or_zero(),
            lifetime: 0.0,
        }
    }

    /// Identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit travel direction.
    #[inline]
    #[must_use]
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// True once the lifetime counter has run out.
    #[must_use]
    pub fn is_expired(&self, config: &ProjectileConfig) -> bool {
        self.lifetime >= config.max_lifetime || self.direction.is_zero()
    }

    /// Moves one tick. Returns the segment swept.
    pub fn advance(&mut self, config: &ProjectileConfig) -> (Vec3, Vec3) {
        let start = self.position;
        self.position += self.direction * config.speed;
        self.lifetime += config.lifetime_step;
        (start, self.position)
    }
}

/// Distance along a unit ray to the first point inside a sphere.
///
/// Zero if the origin is already inside.
#[must_use]
pub fn ray_sphere_entry(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = offset.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of a projectile landing on a spider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitOutcome {
    /// Spider that was hit.
    pub id: SpiderId,
    /// Damage applied.
    pub damage: i32,
    /// Health after the hit.
    pub health: i32,
    /// True if the hit was lethal.
    pub killed: bool,
}

/// Result of checking one spider against the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeleeOutcome {
    /// Too far to bite.
    OutOfRange,
    /// In range, but the bite cooldown is running or the player is down.
    Contact,
    /// A bite landed.
    Bite {
        /// Damage applied.
        damage: i32,
        /// Player health afterwards.
        health: i32,
        /// True if this bite defeated the player.
        defeated: bool,
    },
}

impl MeleeOutcome {
    /// True for any outcome in bite range.
    #[must_use]
    pub const fn in_contact(self) -> bool {
        !matches!(self, Self::OutOfRange)
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Combat rules bound to a configuration.
#[derive(Clone, Copy, Debug)]
pub struct CombatResolver<'a> {
    combat: &'a CombatConfig,
    projectile: &'a ProjectileConfig,
}

impl<'a> CombatResolver<'a> {
    /// Binds the rules to a configuration.
    #[must_use]
    pub const fn new(combat: &'a CombatConfig, projectile: &'a ProjectileConfig) -> Self {
        Self { combat, projectile }
    }

    /// Index of the nearest living spider whose hit sphere the segment
    /// `start..end` passes through.
    #[must_use]
    pub fn projectile_target(&self, start: Vec3, end: Vec3, spiders: &[Spider]) -> Option<usize> {
        let travel = end - start;
        let length = travel.length();
        let direction = travel.normalize_or_zero();
        if direction.is_zero() {
            return None;
        }

        spiders
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_alive())
            .filter_map(|(index, s)| {
                let center = s.position + Vec3::Y * self.projectile.hit_height;
                ray_sphere_entry(start, direction, center, self.projectile.hit_radius)
                    .filter(|&t| t <= length)
                    .map(|t| (index, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Applies one projectile hit.
    ///
    /// Dead spiders are left untouched, so a spider struck twice in one
    /// pass only dies once.
    pub fn resolve_projectile_hit(&self, spider: &mut Spider) -> Option<HitOutcome> {
        if !spider.is_alive() {
            return None;
        }

        let damage = self.combat.projectile_damage;
        spider.health = (spider.health - damage).max(0);
        spider.speed = (spider.speed * self.combat.speed_falloff).max(self.combat.min_speed);
        let flash = Duration::from_millis(self.combat.hit_flash_ms);
        spider.hit_flash = flash;
        spider.play(SpiderClip::Hit, flash);

        Some(HitOutcome {
            id: spider.id,
            damage,
            health: spider.health,
            killed: !spider.is_alive(),
        })
    }

    /// Pulls every other living spider near `player_position` into ATTACK,
    /// aimed at that position. The spider that was `struck` is left alone.
    /// Returns the spiders whose state changed, with their previous state.
    pub fn propagate_aggro(
        &self,
        spiders: &mut [Spider],
        struck: SpiderId,
        player_position: Vec3,
    ) -> Vec<(SpiderId, AiState)> {
        let mut changed = Vec::new();
        for spider in spiders
            .iter_mut()
            .filter(|s| s.is_alive() && s.id != struck)
        {
            if spider.position.distance(player_position) >= self.combat.aggro_radius {
                continue;
            }
            spider.alert_target = Some(player_position);
            if let Some(previous) = spider.set_state(AiState::Attack) {
                changed.push((spider.id, previous));
            }
        }
        changed
    }

    /// Checks one spider against the player and lands a bite if allowed.
    pub fn resolve_melee_contact(
        &self,
        spider: &Spider,
        player_position: Vec3,
        player: &mut PlayerCombatState,
        now: Duration,
    ) -> MeleeOutcome {
        if !spider.is_alive()
            || spider.position.horizontal_distance(player_position) >= self.combat.melee_range
        {
            return MeleeOutcome::OutOfRange;
        }
        if player.is_defeated() {
            return MeleeOutcome::Contact;
        }

        let cooldown = Duration::from_millis(self.combat.melee_cooldown_ms);
        let ready = player
            .last_attack()
            .map_or(true, |last| now.saturating_sub(last) >= cooldown);
        if !ready {
            return MeleeOutcome::Contact;
        }

        let damage = self.combat.melee_damage;
        let health = player.take_damage(damage, now);
        let defeated = health <= 0 && player.mark_defeated();
        MeleeOutcome::Bite {
            damage,
            health,
            defeated,
        }
    }

    /// Advances regeneration. Returns the health restored this tick.
    ///
    /// Regeneration is armed once nothing is in bite range, the player is
    /// hurt and the regen delay has passed since the last bite. It then
    /// restores health every interval until full.
    pub fn regen_tick(
        &self,
        player: &mut PlayerCombatState,
        any_contact: bool,
        now: Duration,
        delta: Duration,
    ) -> i32 {
        if player.is_defeated() {
            return 0;
        }

        if player.is_regenerating() {
            let fired = player.regen_task_mut().advance(delta);
            let mut restored = 0;
            for _ in 0..fired {
                restored += player.heal(self.combat.regen_amount);
                if player.health() >= MAX_HEALTH {
                    player.regen_task_mut().cancel();
                    break;
                }
            }
            return restored;
        }

        let delay = Duration::from_millis(self.combat.regen_delay_ms);
        let quiet = player
            .last_attack()
            .is_some_and(|last| now.saturating_sub(last) >= delay);
        if !any_contact && quiet && player.health() < MAX_HEALTH {
            player.regen_task_mut().arm();
        }
        0
    }
}
