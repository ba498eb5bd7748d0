//! # Swarm Configuration
//!
//! Every tuning number the swarm uses. Defaults reproduce the shipped game;
//! any subset can be overridden from TOML:
//!
//! ```toml
//! seed = 7
//!
//! [combat]
//! aggro_radius = 30.0
//! melee_cooldown_ms = 750
//!
//! [spawn]
//! total = 12
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BroodError, BroodResult};

// ============================================================================
// STEERING
// ============================================================================

/// Movement and local-avoidance tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Distance moved per tick at speed multiplier 1.0.
    pub step_speed: f32,
    /// Radius around the spider in which wander points are picked.
    pub wander_radius: f32,
    /// A wander point closer than this counts as reached.
    pub wander_reached: f32,
    /// Height above a candidate position the ground probe starts from.
    pub ground_probe_height: f32,
    /// Length of the downward ground probe.
    pub ground_probe_length: f32,
    /// Neighbours closer than this push each other apart.
    pub separation_radius: f32,
    /// Scale applied to the summed separation vector.
    pub separation_strength: f32,
    /// Length of the three obstacle-avoidance feelers.
    pub avoidance_length: f32,
    /// Sideways offset of the two angled feelers (in facing units).
    pub avoidance_spread: f32,
    /// Distance the avoidance correction moves the spider per tick.
    pub avoidance_strength: f32,
    /// Length of the probe used to check the direct chase path.
    pub path_probe_length: f32,
    /// Angle between candidate detour directions, in degrees.
    pub detour_step_degrees: f32,
    /// Candidate detours tried on each side of the blocked direction.
    pub detour_steps: u32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            step_speed: 0.05,
            wander_radius: 5.0,
            wander_reached: 0.5,
            ground_probe_height: 1.0,
            ground_probe_length: 2.0,
            separation_radius: 1.5,
            separation_strength: 0.03,
            avoidance_length: 1.2,
            avoidance_spread: 0.5,
            avoidance_strength: 0.08,
            path_probe_length: 2.0,
            detour_step_degrees: 45.0,
            detour_steps: 2,
        }
    }
}

// ============================================================================
// PERCEPTION
// ============================================================================

/// Detection and attack-range tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Player closer than this is always seen.
    pub sight_radius: f32,
    /// With the flashlight on, the player is seen up to this distance.
    pub light_radius: f32,
    /// Minimum cosine between the player's facing and the direction to the
    /// spider for the flashlight to reveal the player.
    pub light_cone_cos: f32,
    /// Idle spiders closer than this become Alert.
    pub alert_radius: f32,
    /// Jaw attacks trigger inside this range.
    pub close_attack_range: f32,
    /// Leg attacks trigger inside this range.
    pub mid_attack_range: f32,
    /// A chasing spider this close to its target without sight gives up.
    pub give_up_radius: f32,
    /// Duration of a one-shot attack clip in milliseconds.
    pub attack_clip_ms: u64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            sight_radius: 10.0,
            light_radius: 15.0,
            light_cone_cos: 0.7,
            alert_radius: 6.0,
            close_attack_range: 2.0,
            mid_attack_range: 6.0,
            give_up_radius: 1.5,
            attack_clip_ms: 600,
        }
    }
}

// ============================================================================
// COMBAT
// ============================================================================

/// Damage, aggro and regeneration tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Health removed from a spider by one projectile.
    pub projectile_damage: i32,
    /// Speed multiplier applied to a spider on every hit.
    pub speed_falloff: f32,
    /// Speed never drops below this.
    pub min_speed: f32,
    /// Duration of the red hit flash in milliseconds.
    pub hit_flash_ms: u64,
    /// Spiders within this distance of the player join the attack when
    /// one of them is shot.
    pub aggro_radius: f32,
    /// Horizontal distance at which a spider bites.
    pub melee_range: f32,
    /// Health removed from the player per bite.
    pub melee_damage: i32,
    /// Minimum time between two bites on the player, from any spider.
    pub melee_cooldown_ms: u64,
    /// Quiet time after the last bite before regeneration starts.
    pub regen_delay_ms: u64,
    /// Interval between regeneration steps.
    pub regen_interval_ms: u64,
    /// Health restored per regeneration step.
    pub regen_amount: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            projectile_damage: 10,
            speed_falloff: 0.9,
            min_speed: 0.2,
            hit_flash_ms: 50,
            aggro_radius: 45.0,
            melee_range: 0.8,
            melee_damage: 10,
            melee_cooldown_ms: 500,
            regen_delay_ms: 5000,
            regen_interval_ms: 1000,
            regen_amount: 10,
        }
    }
}

// ============================================================================
// PROJECTILES
// ============================================================================

/// Player projectile tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Distance travelled per tick.
    pub speed: f32,
    /// Lifetime counter increment per tick.
    pub lifetime_step: f32,
    /// Projectile expires once the lifetime counter reaches this.
    pub max_lifetime: f32,
    /// Radius of a spider's hit sphere.
    pub hit_radius: f32,
    /// Height of the hit sphere centre above the spider's feet.
    pub hit_height: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 0.75,
            lifetime_step: 0.4,
            max_lifetime: 5.0,
            hit_radius: 0.6,
            hit_height: 0.3,
        }
    }
}

// ============================================================================
// SPAWNING
// ============================================================================

/// Spawner tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Time between spawns.
    pub interval_ms: u64,
    /// Spiders spawned over the whole run.
    pub total: u32,
    /// Spawn X is an integer in `[-lane_width / 2, lane_width / 2)`.
    pub lane_width: u32,
    /// Spawn Z.
    pub lane_z: f32,
    /// Initial facing of a new spider.
    pub facing: [f32; 3],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            total: 24,
            lane_width: 20,
            lane_z: -30.0,
            facing: [0.0, 0.0, -1.0],
        }
    }
}

// ============================================================================
// ROOT
// ============================================================================

/// Complete swarm configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Seed for every random choice the swarm makes.
    pub seed: u64,
    /// Capacity of the event channel.
    pub event_capacity: usize,
    /// Movement tuning.
    pub steering: SteeringConfig,
    /// Detection tuning.
    pub perception: PerceptionConfig,
    /// Damage and regen tuning.
    pub combat: CombatConfig,
    /// Projectile tuning.
    pub projectile: ProjectileConfig,
    /// Spawner tuning.
    pub spawn: SpawnConfig,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_B800D,
            event_capacity: 1024,
            steering: SteeringConfig::default(),
            perception: PerceptionConfig::default(),
            combat: CombatConfig::default(),
            projectile: ProjectileConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl SpiderConfig {
    /// Parses a configuration from TOML text. Missing keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BroodError::InvalidConfig`] if the text does not parse or
    /// the result fails [`SpiderConfig::validate`].
    pub fn from_toml_str(text: &str) -> BroodResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| BroodError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BroodError::ConfigRead`] if the file cannot be read or
    /// parsed, and [`BroodError::InvalidConfig`] if validation fails.
    pub fn from_toml_file(path: impl AsRef<Path>) -> BroodResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| BroodError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| BroodError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        tracing::info!("Loaded swarm config from {}", path.display());
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BroodError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> BroodResult<()> {
        let positive = [
            ("steering.step_speed", self.steering.step_speed),
            ("steering.wander_radius", self.steering.wander_radius),
            ("steering.ground_probe_length", self.steering.ground_probe_length),
            ("steering.separation_radius", self.steering.separation_radius),
            ("steering.avoidance_length", self.steering.avoidance_length),
            ("steering.path_probe_length", self.steering.path_probe_length),
            ("perception.sight_radius", self.perception.sight_radius),
            ("perception.alert_radius", self.perception.alert_radius),
            ("combat.aggro_radius", self.combat.aggro_radius),
            ("combat.melee_range", self.combat.melee_range),
            ("projectile.speed", self.projectile.speed),
            ("projectile.lifetime_step", self.projectile.lifetime_step),
            ("projectile.hit_radius", self.projectile.hit_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        if !(0.0..=1.0).contains(&self.combat.speed_falloff) {
            return Err(invalid(format!(
                "combat.speed_falloff must be in [0, 1], got {}",
                self.combat.speed_falloff
            )));
        }
        if !(self.combat.min_speed > 0.0 && self.combat.min_speed <= 1.0) {
            return Err(invalid(format!(
                "combat.min_speed must be in (0, 1], got {}",
                self.combat.min_speed
            )));
        }
        if !(-1.0..=1.0).contains(&self.perception.light_cone_cos) {
            return Err(invalid(format!(
                "perception.light_cone_cos must be in [-1, 1], got {}",
                self.perception.light_cone_cos
            )));
        }
        for (name, value) in [
            ("combat.projectile_damage", self.combat.projectile_damage),
            ("combat.melee_damage", self.combat.melee_damage),
            ("combat.regen_amount", self.combat.regen_amount),
        ] {
            if value <= 0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            ("combat.regen_interval_ms", self.combat.regen_interval_ms),
            ("spawn.interval_ms", self.spawn.interval_ms),
        ] {
            if value == 0 {
                return Err(invalid(format!("{name} must be non-zero")));
            }
        }
        if self.spawn.lane_width == 0 {
            return Err(invalid("spawn.lane_width must be non-zero".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> BroodError {
    tracing::warn!("Rejected swarm config: {}", message);
    BroodError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SpiderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.combat.aggro_radius, 45.0);
        assert_eq!(config.combat.melee_cooldown_ms, 500);
        assert_eq!(config.spawn.total, 24);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SpiderConfig::from_toml_str(
            r"
            seed = 7

            [combat]
            aggro_radius = 30.0

            [spawn]
            total = 12
            ",
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.combat.aggro_radius, 30.0);
        assert_eq!(config.combat.melee_cooldown_ms, 500);
        assert_eq!(config.spawn.total, 12);
        assert_eq!(config.steering, SteeringConfig::default());
    }

    #[test]
    fn test_rejects_negative_radius() {
        let err = SpiderConfig::from_toml_str("[combat]\naggro_radius = -1.0\n").unwrap_err();
        assert!(matches!(err, BroodError::InvalidConfig(msg) if msg.contains("aggro_radius")));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(SpiderConfig::from_toml_str("seed = \"many\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = SpiderConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, BroodError::ConfigRead { .. }));
    }
}
