//! # Steering Behaviors
//!
//! Local movement rules. Each one either moves a single spider or returns a
//! positional correction for it; none of them look at the rest of the swarm
//! except through the neighbour snapshot handed to [`separation`].
//!
//! All movement happens on the floor plane. Vertical components of
//! directions are discarded and `y` is re-pinned after every move.

use std::f32::consts::TAU;

use broodfall_shared::{Vec3, GROUND_Y};
use rand::Rng;

use crate::config::SteeringConfig;
use crate::spatial::SpatialQuery;
use crate::spider::{Spider, SpiderId};

/// Hit distances below this are clamped before inverting them.
const MIN_HIT_DISTANCE: f32 = 1e-3;

/// Neighbours closer than this are treated as coincident and skipped.
const MIN_SEPARATION_DISTANCE: f32 = 1e-4;

/// Movement rules bound to a level.
#[derive(Clone, Copy)]
pub struct Steering<'a> {
    config: &'a SteeringConfig,
    spatial: &'a dyn SpatialQuery,
}

impl<'a> Steering<'a> {
    /// Binds the rules to a configuration and a level.
    #[must_use]
    pub fn new(config: &'a SteeringConfig, spatial: &'a dyn SpatialQuery) -> Self {
        Self { config, spatial }
    }

    /// Steps the spider along `direction`.
    ///
    /// The candidate position is checked with a downward probe; if the probe
    /// lands on level geometry the spider stays put. Facing follows
    /// `direction` in both cases. Returns `true` if the spider moved.
    pub fn move_in_direction(&self, spider: &mut Spider, direction: Vec3) -> bool {
        let direction = direction.flattened().normalize_or_zero();
        if direction.is_zero() {
            return false;
        }
        spider.face(direction);

        let step = self.config.step_speed * spider.speed;
        let candidate = (spider.position + direction * step).with_y(GROUND_Y);
        let probe_origin = candidate + Vec3::Y * self.config.ground_probe_height;
        if self
            .spatial
            .is_blocked(probe_origin, -Vec3::Y, self.config.ground_probe_length)
        {
            return false;
        }

        spider.position = candidate;
        spider.lock_to_ground();
        true
    }

    /// Steps the spider toward `target`.
    pub fn seek(&self, spider: &mut Spider, target: Vec3) -> bool {
        self.move_in_direction(spider, target - spider.position)
    }

    /// Aimless roaming around the current position.
    ///
    /// A new wander point is drawn when there is none or the current one is
    /// reached. Points are uniform in angle and radius, so they cluster
    /// toward the spider.
    pub fn wander<R: Rng + ?Sized>(&self, spider: &mut Spider, rng: &mut R) -> bool {
        let reached = spider
            .wander_target
            .map_or(true, |t| spider.position.horizontal_distance(t) < self.config.wander_reached);
        if reached {
            let angle = rng.gen::<f32>() * TAU;
            let radius = rng.gen::<f32>() * self.config.wander_radius;
            let offset = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
            spider.wander_target = Some((spider.position + offset).with_y(GROUND_Y));
        }

        match spider.wander_target {
            Some(target) => self.seek(spider, target),
            None => false,
        }
    }

    /// Direction to travel toward `target`, detouring if the straight path
    /// is blocked.
    #[must_use]
    pub fn path_toward(&self, position: Vec3, target: Vec3) -> Vec3 {
        let direction = (target - position).flattened().normalize_or_zero();
        if direction.is_zero() {
            return direction;
        }
        if self
            .spatial
            .is_blocked(position, direction, self.config.path_probe_length)
        {
            self.steer_around(position, direction)
        } else {
            direction
        }
    }

    /// First unblocked direction fanning out from `direction`, from the
    /// most negative yaw offset to the most positive. Reverses if every
    /// candidate is blocked.
    #[must_use]
    pub fn steer_around(&self, position: Vec3, direction: Vec3) -> Vec3 {
        let step = self.config.detour_step_degrees.to_radians();
        #[allow(clippy::cast_possible_wrap)]
        let steps = self.config.detour_steps as i32;
        for k in -steps..=steps {
            #[allow(clippy::cast_precision_loss)]
            let candidate = direction.rotate_y(k as f32 * step);
            if !self
                .spatial
                .is_blocked(position, candidate, self.config.path_probe_length)
            {
                return candidate;
            }
        }
        -direction
    }

    /// Push away from nearby geometry.
    ///
    /// Casts three feelers (straight ahead and angled to either side) from
    /// the spider's feet. Each blocking hit contributes a push opposite the
    /// feeler, stronger the closer the hit. The sum is normalized and scaled
    /// to a fixed correction. Zero if nothing is near.
    #[must_use]
    pub fn avoid_obstacles(&self, spider: &Spider) -> Vec3 {
        let forward = spider.facing;
        let right = forward.right_of() * self.config.avoidance_spread;
        let feelers = [
            forward,
            (forward - right).normalize_or_zero(),
            (forward + right).normalize_or_zero(),
        ];

        let mut push = Vec3::ZERO;
        for feeler in feelers {
            if let Some(hit) =
                self.spatial
                    .raycast(spider.position, feeler, self.config.avoidance_length)
            {
                if hit.blocks_movement() {
                    push += -feeler / hit.distance.max(MIN_HIT_DISTANCE);
                }
            }
        }

        if push.is_zero() {
            Vec3::ZERO
        } else {
            push.normalize_or_zero() * self.config.avoidance_strength
        }
    }
}

/// Push away from crowded neighbours.
///
/// Every other spider within the separation radius contributes a unit
/// vector away from it divided by its distance. The sum is scaled by the
/// separation strength and returned; it is applied directly to the position
/// rather than to a velocity.
#[must_use]
pub fn separation(
    config: &SteeringConfig,
    id: SpiderId,
    position: Vec3,
    neighbours: &[(SpiderId, Vec3)],
) -> Vec3 {
    let mut push = Vec3::ZERO;
    for &(other_id, other_position) in neighbours {
        if other_id == id {
            continue;
        }
        let away = (position - other_position).flattened();
        let distance = away.length();
        if distance > MIN_SEPARATION_DISTANCE && distance < config.separation_radius {
            push += away.normalize_or_zero() / distance;
        }
    }
    push * config.separation_strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{BoxWorld, OpenField, SurfaceTag, TaggedBox};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn spider_at(x: f32, z: f32) -> Spider {
        Spider::new(SpiderId(1), Vec3::new(x, 0.0, z), Vec3::FORWARD)
    }

    fn wall_ahead() -> BoxWorld {
        // Wall spanning x in [-5, 5] starting 1 unit in front (-Z) of the origin.
        BoxWorld::new().with(TaggedBox::new(
            Vec3::new(-5.0, 0.0, -2.0),
            Vec3::new(5.0, 3.0, -1.0),
            SurfaceTag::Room,
        ))
    }

    #[test]
    fn test_move_in_direction_steps_and_faces() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        let mut spider = spider_at(0.0, 0.0);

        assert!(steering.move_in_direction(&mut spider, Vec3::new(1.0, 5.0, 0.0)));
        assert!((spider.position().x - 0.05).abs() < 1e-6);
        assert_eq!(spider.position().y, GROUND_Y);
        assert_eq!(spider.facing(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_slowed_spider_moves_less() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        let mut spider = spider_at(0.0, 0.0);
        spider.speed = 0.5;

        let _ = steering.move_in_direction(&mut spider, Vec3::new(1.0, 0.0, 0.0));
        assert!((spider.position().x - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_move_into_wall_rejected() {
        let config = SteeringConfig::default();
        let world = wall_ahead();
        let steering = Steering::new(&config, &world);
        let mut spider = spider_at(0.0, -0.98);

        assert!(!steering.move_in_direction(&mut spider, Vec3::FORWARD));
        assert_eq!(spider.position(), Vec3::new(0.0, 0.0, -0.98));
        assert_eq!(spider.facing(), Vec3::FORWARD);
    }

    #[test]
    fn test_wander_picks_point_within_radius() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut spider = spider_at(3.0, 3.0);

        let _ = steering.wander(&mut spider, &mut rng);
        let target = spider.wander_target().unwrap();
        assert!(target.horizontal_distance(Vec3::new(3.0, 0.0, 3.0)) < config.wander_radius);
        assert_eq!(target.y, GROUND_Y);
    }

    #[test]
    fn test_wander_keeps_unreached_target() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut spider = spider_at(0.0, 0.0);
        let target = Vec3::new(4.0, 0.0, 0.0);
        spider.wander_target = Some(target);

        let _ = steering.wander(&mut spider, &mut rng);
        assert_eq!(spider.wander_target(), Some(target));
    }

    #[test]
    fn test_path_toward_clear_is_direct() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        let dir = steering.path_toward(Vec3::ZERO, Vec3::new(0.0, 3.0, -10.0));
        assert_eq!(dir, Vec3::FORWARD);
    }

    #[test]
    fn test_steer_around_picks_first_clear_side() {
        let config = SteeringConfig::default();
        let world = wall_ahead();
        let steering = Steering::new(&config, &world);

        let dir = steering.path_toward(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
        // -90 degrees from -Z is +X, which is clear.
        assert!((dir.x - 1.0).abs() < 1e-5);
        assert!(dir.z.abs() < 1e-5);
    }

    #[test]
    fn test_steer_around_reverses_when_boxed_in() {
        let config = SteeringConfig::default();
        let world = BoxWorld::walled_arena(0.5, 3.0, 1.0);
        let steering = Steering::new(&config, &world);

        let dir = steering.steer_around(Vec3::ZERO, Vec3::FORWARD);
        assert_eq!(dir, -Vec3::FORWARD);
    }

    #[test]
    fn test_avoidance_pushes_back_from_wall() {
        let config = SteeringConfig::default();
        let world = wall_ahead();
        let steering = Steering::new(&config, &world);
        let spider = spider_at(0.0, -0.5);

        let push = steering.avoid_obstacles(&spider);
        assert!(push.z > 0.0);
        assert!((push.length() - config.avoidance_strength).abs() < 1e-5);
    }

    #[test]
    fn test_avoidance_zero_in_open_field() {
        let config = SteeringConfig::default();
        let steering = Steering::new(&config, &OpenField);
        assert_eq!(steering.avoid_obstacles(&spider_at(0.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_separation_pushes_apart() {
        let config = SteeringConfig::default();
        let neighbours = [
            (SpiderId(1), Vec3::ZERO),
            (SpiderId(2), Vec3::new(1.0, 0.0, 0.0)),
        ];
        let push = separation(&config, SpiderId(1), Vec3::ZERO, &neighbours);
        assert!((push.x + 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_separation_ignores_far_and_coincident() {
        let config = SteeringConfig::default();
        let neighbours = [
            (SpiderId(2), Vec3::new(2.0, 0.0, 0.0)),
            (SpiderId(3), Vec3::ZERO),
        ];
        assert_eq!(
            separation(&config, SpiderId(1), Vec3::ZERO, &neighbours),
            Vec3::ZERO
        );
    }
}
