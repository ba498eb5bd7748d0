//! # Spider Entity
//!
//! One enemy: where it is, where it faces, how hurt it is and what it is
//! doing. Only the AI, steering and combat modules mutate a spider, so the
//! fields are crate-visible and the public surface is read-only.

use std::fmt;
use std::time::Duration;

use broodfall_shared::{Vec3, GROUND_Y, MAX_HEALTH};

use crate::player::health_fraction;

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable spider identifier. Never reused by a manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpiderId(pub u32);

impl fmt::Display for SpiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spider#{}", self.0)
    }
}

// ============================================================================
// AI STATE
// ============================================================================

/// AI behavior states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AiState {
    /// Wandering around, player not noticed.
    #[default]
    Idle,
    /// Player noticed nearby, closing in.
    Alert,
    /// Chasing and biting.
    Attack,
}

impl AiState {
    /// Returns the display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Alert => "alert",
            Self::Attack => "attack",
        }
    }
}

// ============================================================================
// ANIMATION CLIPS
// ============================================================================

/// Animation clips the spider model ships with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpiderClip {
    /// Default locomotion loop.
    #[default]
    Running,
    /// Recoil after a projectile hit.
    Hit,
    /// Rearing up when the player is noticed.
    Alert,
    /// Close-range bite.
    AttackJaw,
    /// Close-range inner bite.
    AttackInnerJaw,
    /// Mid-range left leg strike.
    AttackLeft,
    /// Mid-range right leg strike.
    AttackRight,
}

impl SpiderClip {
    /// Every clip.
    pub const ALL: [Self; 7] = [
        Self::Running,
        Self::Hit,
        Self::Alert,
        Self::AttackJaw,
        Self::AttackInnerJaw,
        Self::AttackLeft,
        Self::AttackRight,
    ];

    /// Clip name inside the model file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Hit => "hit",
            Self::Alert => "alert",
            Self::AttackJaw => "attack_jaw",
            Self::AttackInnerJaw => "attack_inner_jaw",
            Self::AttackLeft => "attack_L",
            Self::AttackRight => "attack_R",
        }
    }

    /// Looks a clip up by model name. Unknown names are logged and ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let found = Self::ALL.into_iter().find(|clip| clip.name() == name);
        if found.is_none() {
            tracing::warn!("Unknown spider animation clip: {}", name);
        }
        found
    }

    /// Attack clips play once; everything else loops.
    #[must_use]
    pub const fn is_attack(self) -> bool {
        matches!(
            self,
            Self::AttackJaw | Self::AttackInnerJaw | Self::AttackLeft | Self::AttackRight
        )
    }
}

// ============================================================================
// SPIDER
// ============================================================================

/// An enemy spider.
#[derive(Clone, Debug)]
pub struct Spider {
    pub(crate) id: SpiderId,
    pub(crate) position: Vec3,
    pub(crate) facing: Vec3,
    pub(crate) health: i32,
    pub(crate) speed: f32,
    pub(crate) state: AiState,
    pub(crate) wander_target: Option<Vec3>,
    pub(crate) alert_target: Option<Vec3>,
    pub(crate) hit_flash: Duration,
    pub(crate) clip: SpiderClip,
    pub(crate) clip_remaining: Duration,
    pub(crate) reported_health: i32,
}

impl Spider {
    /// Creates a full-health idle spider on the ground.
    #[must_use]
    pub fn new(id: SpiderId, position: Vec3, facing: Vec3) -> Self {
        let facing = facing.flattened().normalize_or_zero();
        Self {
            id,
            position: position.with_y(GROUND_Y),
            facing: if facing.is_zero() { Vec3::FORWARD } else { facing },
            health: MAX_HEALTH,
            speed: 1.0,
            state: AiState::Idle,
            wander_target: None,
            alert_target: None,
            hit_flash: Duration::ZERO,
            clip: SpiderClip::Running,
            clip_remaining: Duration::ZERO,
            reported_health: MAX_HEALTH,
        }
    }

    /// Identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> SpiderId {
        self.id
    }

    /// Feet position. `y` is always [`GROUND_Y`].
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Horizontal unit facing vector.
    #[inline]
    #[must_use]
    pub const fn facing(&self) -> Vec3 {
        self.facing
    }

    /// Yaw in radians; 0 faces -Z, positive turns toward -X.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        (-self.facing.x).atan2(-self.facing.z)
    }

    /// Health in `[0, 100]`.
    #[inline]
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Health bar fill in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        health_fraction(self.health)
    }

    /// Speed multiplier in `[min_speed, 1]`.
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Current AI state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Wander destination (Idle only).
    #[inline]
    #[must_use]
    pub const fn wander_target(&self) -> Option<Vec3> {
        self.wander_target
    }

    /// Chase destination handed over by aggro propagation.
    #[inline]
    #[must_use]
    pub const fn alert_target(&self) -> Option<Vec3> {
        self.alert_target
    }

    /// True while alive.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// True during the red hit flash.
    #[inline]
    #[must_use]
    pub fn is_flashing(&self) -> bool {
        !self.hit_flash.is_zero()
    }

    /// Clip currently playing.
    #[inline]
    #[must_use]
    pub const fn clip(&self) -> SpiderClip {
        self.clip
    }

    /// True while an attack clip is still playing.
    #[must_use]
    pub fn is_attacking(&self) -> bool {
        self.clip.is_attack() && !self.clip_remaining.is_zero()
    }

    /// Changes state. Returns the previous state if it changed.
    pub(crate) fn set_state(&mut self, next: AiState) -> Option<AiState> {
        if self.state == next {
            return None;
        }
        let previous = self.state;
        self.state = next;
        if next != AiState::Idle {
            self.wander_target = None;
        }
        Some(previous)
    }

    /// Starts a clip. Looping clips pass a zero duration.
    pub(crate) fn play(&mut self, clip: SpiderClip, duration: Duration) {
        self.clip = clip;
        self.clip_remaining = duration;
    }

    /// Counts down the flash and one-shot clip timers.
    pub(crate) fn tick_timers(&mut self, delta: Duration) {
        self.hit_flash = self.hit_flash.saturating_sub(delta);
        if !self.clip_remaining.is_zero() {
            self.clip_remaining = self.clip_remaining.saturating_sub(delta);
            if self.clip_remaining.is_zero() {
                self.clip = SpiderClip::Running;
            }
        }
    }

    /// Re-derives facing from a movement direction. Zero keeps the old facing.
    pub(crate) fn face(&mut self, direction: Vec3) {
        let flat = direction.flattened().normalize_or_zero();
        if !flat.is_zero() {
            self.facing = flat;
        }
    }

    /// Pins the spider to the floor.
    #[inline]
    pub(crate) fn lock_to_ground(&mut self) {
        self.position.y = GROUND_Y;
    }

    /// Returns the health to report if it changed since the last report.
    pub(crate) fn take_health_report(&mut self) -> Option<i32> {
        if self.reported_health == self.health {
            return None;
        }
        self.reported_health = self.health;
        Some(self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spider_creation() {
        let spider = Spider::new(SpiderId(3), Vec3::new(2.0, 5.0, -30.0), Vec3::FORWARD);
        assert_eq!(spider.id(), SpiderId(3));
        assert_eq!(spider.position().y, GROUND_Y);
        assert_eq!(spider.health(), MAX_HEALTH);
        assert_eq!(spider.speed(), 1.0);
        assert_eq!(spider.state(), AiState::Idle);
        assert!(spider.yaw().abs() < 1e-6);
    }

    #[test]
    fn test_zero_facing_falls_back() {
        let spider = Spider::new(SpiderId(0), Vec3::ZERO, Vec3::Y);
        assert_eq!(spider.facing(), Vec3::FORWARD);
    }

    #[test]
    fn test_clip_lookup() {
        assert_eq!(SpiderClip::from_name("attack_L"), Some(SpiderClip::AttackLeft));
        assert_eq!(SpiderClip::from_name("dance"), None);
        for clip in SpiderClip::ALL {
            assert_eq!(SpiderClip::from_name(clip.name()), Some(clip));
        }
    }

    #[test]
    fn test_set_state_clears_wander_target() {
        let mut spider = Spider::new(SpiderId(0), Vec3::ZERO, Vec3::FORWARD);
        spider.wander_target = Some(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(spider.set_state(AiState::Idle), None);
        assert!(spider.wander_target().is_some());
        assert_eq!(spider.set_state(AiState::Attack), Some(AiState::Idle));
        assert!(spider.wander_target().is_none());
    }

    #[test]
    fn test_one_shot_clip_returns_to_running() {
        let mut spider = Spider::new(SpiderId(0), Vec3::ZERO, Vec3::FORWARD);
        spider.play(SpiderClip::AttackJaw, Duration::from_millis(600));
        assert!(spider.is_attacking());
        spider.tick_timers(Duration::from_millis(400));
        assert!(spider.is_attacking());
        spider.tick_timers(Duration::from_millis(400));
        assert!(!spider.is_attacking());
        assert_eq!(spider.clip(), SpiderClip::Running);
    }

    #[test]
    fn test_face_ignores_zero_direction() {
        let mut spider = Spider::new(SpiderId(0), Vec3::ZERO, Vec3::FORWARD);
        spider.face(Vec3::new(3.0, 7.0, 0.0));
        assert_eq!(spider.facing(), Vec3::new(1.0, 0.0, 0.0));
        spider.face(Vec3::Y);
        assert_eq!(spider.facing(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_health_report_only_on_change() {
        let mut spider = Spider::new(SpiderId(0), Vec3::ZERO, Vec3::FORWARD);
        assert_eq!(spider.take_health_report(), None);
        spider.health = 90;
        assert_eq!(spider.take_health_report(), Some(90));
        assert_eq!(spider.take_health_report(), None);
    }
}
