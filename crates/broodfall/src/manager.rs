//! # Spider Manager
//!
//! Owns the swarm and runs it one tick at a time.
//!
//! ## Tick order
//!
//! 1. Paused: nothing happens.
//! 2. Clock and spawner advance.
//! 3. No player: stop here.
//! 4. One player snapshot is taken for the whole tick.
//! 5. Projectiles move and resolve hits; dead spiders are swept.
//! 6. Every spider runs its AI, separation and obstacle avoidance, then is
//!    pinned to the floor and written to the render sink.
//! 7. Bites and regeneration are resolved.
//!
//! Nothing is removed from the swarm while it is being iterated.

use std::time::Duration;

use broodfall_shared::{HudSnapshot, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ai::AiStateMachine;
use crate::combat::{CombatResolver, HitOutcome, MeleeOutcome, Projectile, ProjectileId};
use crate::config::SpiderConfig;
use crate::error::BroodResult;
use crate::events::{EventBus, EventReceiver, EventSender, SoundCue, SpiderEvent};
use crate::player::{PlayerCombatState, PlayerSnapshot, PlayerState};
use crate::render::{SpiderTransform, TransformSink};
use crate::schedule::ScheduledTask;
use crate::spatial::SpatialQuery;
use crate::spider::{AiState, Spider, SpiderId};
use crate::steering::{separation, Steering};

/// Owns and drives the swarm.
pub struct SpiderManager {
    config: SpiderConfig,
    spiders: Vec<Spider>,
    projectiles: Vec<Projectile>,
    next_spider_id: u32,
    next_projectile_id: u32,
    spawner: ScheduledTask,
    spawned: u32,
    killed: u32,
    model_ready: bool,
    paused: bool,
    clock: Duration,
    player: PlayerCombatState,
    last_known_player: Option<Vec3>,
    rng: ChaCha8Rng,
    events: EventSender,
    sink: Option<Box<dyn TransformSink + Send>>,
}

impl SpiderManager {
    /// Creates a manager that reports into `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: SpiderConfig, events: EventSender) -> BroodResult<Self> {
        config.validate()?;
        tracing::info!(
            "Spider manager ready: {} spiders every {} ms (seed {})",
            config.spawn.total,
            config.spawn.interval_ms,
            config.seed
        );
        Ok(Self {
            spawner: ScheduledTask::from_millis(config.spawn.interval_ms),
            player: PlayerCombatState::new(Duration::from_millis(config.combat.regen_interval_ms)),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            spiders: Vec::new(),
            projectiles: Vec::new(),
            next_spider_id: 0,
            next_projectile_id: 0,
            spawned: 0,
            killed: 0,
            model_ready: false,
            paused: false,
            clock: Duration::ZERO,
            last_known_player: None,
            events,
            sink: None,
        })
    }

    /// Creates a manager together with its own event channel.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_event_bus(config: SpiderConfig) -> BroodResult<(Self, EventReceiver)> {
        let (sender, receiver) = EventBus::create_pair(config.event_capacity.max(1));
        Ok((Self::new(config, sender)?, receiver))
    }

    // ========================================================================
    // SETUP
    // ========================================================================

    /// Attaches a render sink. Replaces any previous one.
    pub fn attach_sink(&mut self, sink: Box<dyn TransformSink + Send>) {
        self.sink = Some(sink);
    }

    /// Detaches the render sink.
    pub fn detach_sink(&mut self) -> Option<Box<dyn TransformSink + Send>> {
        self.sink.take()
    }

    /// Marks the spider model as loaded (or not).
    pub fn set_model_ready(&mut self, ready: bool) {
        self.model_ready = ready;
    }

    /// Starts the spawner. Returns `false` if the model is not loaded yet or
    /// every spider has already been spawned.
    pub fn start_spawning(&mut self) -> bool {
        if !self.model_ready {
            tracing::warn!("Spider model not loaded yet, spawner not started");
            return false;
        }
        if self.spawned >= self.config.spawn.total {
            return false;
        }
        if !self.spawner.is_pending() {
            self.spawner.arm();
            if self.paused {
                self.spawner.pause();
            }
            tracing::info!("Spawner started");
        }
        true
    }

    /// Freezes the swarm, its spawner and the player's regeneration.
    pub fn pause(&mut self) {
        self.paused = true;
        self.spawner.pause();
        self.player.regen_task_mut().pause();
    }

    /// Unfreezes everything frozen by [`SpiderManager::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
        self.spawner.resume();
        self.player.regen_task_mut().resume();
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Places a new spider at `position`. Counts toward the spawn total.
    pub fn spawn_at(&mut self, position: Vec3) -> SpiderId {
        let id = SpiderId(self.next_spider_id);
        self.next_spider_id += 1;
        self.spawned += 1;

        let facing = Vec3::from_array(self.config.spawn.facing);
        let spider = Spider::new(id, position, facing);
        let position = spider.position();
        self.spiders.push(spider);

        tracing::info!(
            "Spawned {} at ({:.1}, {:.1}) [{}/{}]",
            id,
            position.x,
            position.z,
            self.spawned,
            self.config.spawn.total
        );
        self.emit(SpiderEvent::Spawned { id, position });
        self.emit(SpiderEvent::Sound {
            id: Some(id),
            cue: SoundCue::Chitter,
            position,
        });
        self.emit_hud();
        id
    }

    /// Fires a player projectile.
    pub fn fire_projectile(&mut self, origin: Vec3, direction: Vec3) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile::new(id, origin, direction));
        id
    }

    /// Removes a spider. Returns `false` if it is not in the swarm.
    pub fn remove_spider(&mut self, id: SpiderId) -> bool {
        let Some(index) = self.spiders.iter().position(|s| s.id() == id) else {
            return false;
        };
        self.spiders.remove(index);
        if let Some(sink) = self.sink.as_mut() {
            sink.remove(id);
        }
        self.emit_hud();
        true
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advances the swarm by one frame.
    ///
    /// Without a player only the spawner runs. Without a level spiders
    /// still think but do not move on their own.
    pub fn tick(
        &mut self,
        player: Option<&dyn PlayerState>,
        spatial: Option<&dyn SpatialQuery>,
        delta: Duration,
    ) {
        if self.paused {
            return;
        }

        self.clock += delta;
        self.update_spawner(delta);

        let Some(player) = player else {
            tracing::debug!("No player available, swarm idle this tick");
            return;
        };
        let snapshot = PlayerSnapshot::capture(player);

        self.update_projectiles(&snapshot);
        self.update_spiders(&snapshot, spatial, delta);
        self.update_melee(&snapshot, delta);
    }

    fn update_spawner(&mut self, delta: Duration) {
        let fired = self.spawner.advance(delta);
        for _ in 0..fired {
            if self.spawned >= self.config.spawn.total {
                break;
            }
            let position = self.random_lane_position();
            let _ = self.spawn_at(position);
        }
        if self.spawner.is_pending() && self.spawned >= self.config.spawn.total {
            self.spawner.cancel();
            tracing::info!("All {} spiders spawned", self.config.spawn.total);
        }
    }

    fn random_lane_position(&mut self) -> Vec3 {
        let width = self.config.spawn.lane_width;
        let column = self.rng.gen_range(0..width);
        #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
        let x = (i64::from(column) - i64::from(width / 2)) as f32;
        Vec3::new(x, 0.0, self.config.spawn.lane_z)
    }

    fn update_projectiles(&mut self, snapshot: &PlayerSnapshot) {
        if self.projectiles.is_empty() {
            return;
        }

        let config = &self.config;
        let spiders = &mut self.spiders;
        let resolver = CombatResolver::new(&config.combat, &config.projectile);
        let mut outcomes: Vec<HitOutcome> = Vec::new();

        self.projectiles.retain_mut(|projectile| {
            let (start, end) = projectile.advance(&config.projectile);
            if let Some(index) = resolver.projectile_target(start, end, &spiders[..]) {
                if let Some(outcome) = resolver.resolve_projectile_hit(&mut spiders[index]) {
                    outcomes.push(outcome);
                }
                return false;
            }
            !projectile.is_expired(&config.projectile)
        });

        for outcome in outcomes {
            self.apply_hit(outcome, snapshot.position);
        }
        self.sweep_dead();
    }

    fn apply_hit(&mut self, outcome: HitOutcome, player_position: Vec3) {
        self.emit(SpiderEvent::DamageDealt {
            id: outcome.id,
            amount: outcome.damage,
            health: outcome.health,
        });
        self.emit(SpiderEvent::HitFlash {
            id: outcome.id,
            duration_ms: self.config.combat.hit_flash_ms,
        });

        if outcome.killed {
            self.killed += 1;
            tracing::info!("{} killed ({} total)", outcome.id, self.killed);
        } else {
            self.last_known_player = Some(player_position);
            let resolver = CombatResolver::new(&self.config.combat, &self.config.projectile);
            let changed =
                resolver.propagate_aggro(&mut self.spiders, outcome.id, player_position);
            for (id, from) in changed {
                self.emit_transition(id, from, AiState::Attack);
            }
        }
        self.emit_hud();
    }

    fn sweep_dead(&mut self) {
        let mut dead = Vec::new();
        self.spiders.retain(|spider| {
            if spider.is_alive() {
                true
            } else {
                dead.push((spider.id(), spider.position()));
                false
            }
        });
        for (id, position) in dead {
            if let Some(sink) = self.sink.as_mut() {
                sink.remove(id);
            }
            self.emit(SpiderEvent::EntityKilled { id, position });
        }
    }

    fn update_spiders(
        &mut self,
        snapshot: &PlayerSnapshot,
        spatial: Option<&dyn SpatialQuery>,
        delta: Duration,
    ) {
        let neighbours: Vec<(SpiderId, Vec3)> =
            self.spiders.iter().map(|s| (s.id(), s.position())).collect();

        let config = &self.config;
        let ai = AiStateMachine::new(&config.perception);
        let steering = spatial.map(|level| Steering::new(&config.steering, level));
        let events = &self.events;
        let rng = &mut self.rng;
        let sink = &mut self.sink;

        for spider in &mut self.spiders {
            let step = ai.step(spider, snapshot, steering.as_ref(), rng);
            if let Some((from, to)) = step.transition {
                tracing::debug!("{} state transition: {} -> {}", spider.id(), from.name(), to.name());
                for event in transition_events(spider.id(), spider.position(), from, to) {
                    let _ = events.send(event);
                }
            }
            if let Some(clip) = step.attack {
                let _ = events.send(SpiderEvent::AttackCue {
                    id: spider.id(),
                    clip,
                });
            }

            let push = separation(&config.steering, spider.id(), spider.position(), &neighbours);
            spider.position += push;
            if let Some(steering) = steering.as_ref() {
                let avoid = steering.avoid_obstacles(spider);
                spider.position += avoid;
            }
            spider.lock_to_ground();
            spider.tick_timers(delta);

            if spider.take_health_report().is_some() {
                let _ = events.send(SpiderEvent::HealthBar {
                    id: spider.id(),
                    fraction: spider.health_fraction(),
                });
            }
            if let Some(sink) = sink.as_mut() {
                sink.place(spider.id(), SpiderTransform::from(&*spider));
            }
        }
    }

    fn update_melee(&mut self, snapshot: &PlayerSnapshot, delta: Duration) {
        let resolver = CombatResolver::new(&self.config.combat, &self.config.projectile);
        let mut any_contact = false;
        let mut bites = Vec::new();

        for spider in &self.spiders {
            let outcome = resolver.resolve_melee_contact(
                spider,
                snapshot.position,
                &mut self.player,
                self.clock,
            );
            any_contact |= outcome.in_contact();
            if let MeleeOutcome::Bite {
                damage,
                health,
                defeated,
            } = outcome
            {
                bites.push((spider.id(), spider.position(), damage, health, defeated));
            }
        }

        for (attacker, position, amount, health, defeated) in bites {
            tracing::debug!("{} bit the player for {} ({} left)", attacker, amount, health);
            self.emit(SpiderEvent::PlayerDamaged {
                attacker,
                amount,
                health,
            });
            self.emit(SpiderEvent::Sound {
                id: Some(attacker),
                cue: SoundCue::Bite,
                position,
            });
            self.emit(SpiderEvent::Sound {
                id: None,
                cue: SoundCue::Scream,
                position: snapshot.position,
            });
            if defeated {
                tracing::info!("Player killed by {}", attacker);
                self.emit(SpiderEvent::PlayerKilled { attacker });
            }
            self.emit_hud();
        }

        let restored = resolver.regen_tick(&mut self.player, any_contact, self.clock, delta);
        if restored > 0 {
            self.emit(SpiderEvent::PlayerHealed {
                amount: restored,
                health: self.player.health(),
            });
            self.emit_hud();
        }
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    fn emit(&self, event: SpiderEvent) {
        let _ = self.events.send(event);
    }

    fn emit_hud(&self) {
        self.emit(SpiderEvent::HudUpdate(self.hud()));
    }

    fn emit_transition(&self, id: SpiderId, from: AiState, to: AiState) {
        let position = self
            .spider(id)
            .map_or(Vec3::ZERO, Spider::position);
        tracing::debug!("{} state transition: {} -> {}", id, from.name(), to.name());
        for event in transition_events(id, position, from, to) {
            self.emit(event);
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Living spiders.
    #[must_use]
    pub fn spiders(&self) -> &[Spider] {
        &self.spiders
    }

    /// Looks a spider up by id.
    #[must_use]
    pub fn spider(&self, id: SpiderId) -> Option<&Spider> {
        self.spiders.iter().find(|s| s.id() == id)
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Current HUD counters.
    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            live: u32::try_from(self.spiders.len()).unwrap_or(u32::MAX),
            spawned: self.spawned,
            total: self.config.spawn.total,
            killed: self.killed,
            player_health: self.player.health(),
        }
    }

    /// Spiders killed so far.
    #[must_use]
    pub fn kill_count(&self) -> u32 {
        self.killed
    }

    /// Spiders alive right now.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.spiders.len()
    }

    /// Spiders spawned so far.
    #[must_use]
    pub fn spawned_count(&self) -> u32 {
        self.spawned
    }

    /// Spiders the spawner produces in total.
    #[must_use]
    pub fn total_spiders(&self) -> u32 {
        self.config.spawn.total
    }

    /// The player's health and timers.
    #[must_use]
    pub fn player_combat(&self) -> &PlayerCombatState {
        &self.player
    }

    /// Where the player was when a spider was last shot and survived.
    #[must_use]
    pub fn last_known_player_position(&self) -> Option<Vec3> {
        self.last_known_player
    }

    /// Time accumulated by unpaused ticks.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// True while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while the spawner has spiders left to place.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.spawner.is_pending()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }
}

/// Events announcing a state change.
fn transition_events(id: SpiderId, position: Vec3, from: AiState, to: AiState) -> [SpiderEvent; 2] {
    let cue = match to {
        AiState::Idle => SoundCue::Chitter,
        AiState::Alert | AiState::Attack => SoundCue::Shriek,
    };
    [
        SpiderEvent::StateChanged { id, from, to },
        SpiderEvent::Sound {
            id: Some(id),
            cue,
            position,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::OpenField;

    fn manager() -> (SpiderManager, EventReceiver) {
        SpiderManager::with_event_bus(SpiderConfig::default()).unwrap()
    }

    fn far_player() -> PlayerSnapshot {
        PlayerSnapshot::new(Vec3::new(0.0, 0.0, 200.0), Vec3::FORWARD, false)
    }

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_spawner_needs_model() {
        let (mut manager, _events) = manager();
        assert!(!manager.start_spawning());
        manager.set_model_ready(true);
        assert!(manager.start_spawning());
        assert!(manager.is_spawning());
    }

    #[test]
    fn test_spawn_interval_and_lane() {
        let (mut manager, _events) = manager();
        manager.set_model_ready(true);
        let _ = manager.start_spawning();

        manager.tick(None, None, Duration::from_millis(1999));
        assert_eq!(manager.live_count(), 0);
        manager.tick(None, None, Duration::from_millis(1));
        assert_eq!(manager.live_count(), 1);

        let spider = &manager.spiders()[0];
        let x = spider.position().x;
        assert_eq!(x.fract(), 0.0);
        assert!((-10.0..=9.0).contains(&x));
        assert_eq!(spider.position().z, -30.0);
    }

    #[test]
    fn test_spawner_stops_at_total() {
        let config = SpiderConfig {
            spawn: crate::config::SpawnConfig {
                total: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        let (mut manager, _events) = SpiderManager::with_event_bus(config).unwrap();
        manager.set_model_ready(true);
        let _ = manager.start_spawning();

        for _ in 0..10 {
            manager.tick(None, None, Duration::from_millis(2000));
        }
        assert_eq!(manager.spawned_count(), 3);
        assert!(!manager.is_spawning());
        assert!(!manager.start_spawning());
    }

    #[test]
    fn test_pause_freezes_spawner() {
        let (mut manager, _events) = manager();
        manager.set_model_ready(true);
        let _ = manager.start_spawning();
        manager.pause();
        manager.tick(None, None, Duration::from_secs(60));
        assert_eq!(manager.live_count(), 0);
        assert_eq!(manager.clock(), Duration::ZERO);
        manager.resume();
        manager.tick(None, None, Duration::from_millis(2000));
        assert_eq!(manager.live_count(), 1);
    }

    #[test]
    fn test_remove_twice() {
        let (mut manager, _events) = manager();
        let id = manager.spawn_at(Vec3::new(1.0, 0.0, 1.0));
        assert!(manager.remove_spider(id));
        assert!(!manager.remove_spider(id));
        assert_eq!(manager.live_count(), 0);
    }

    #[test]
    fn test_no_player_no_movement() {
        let (mut manager, _events) = manager();
        let id = manager.spawn_at(Vec3::new(3.0, 0.0, -4.0));
        for _ in 0..30 {
            manager.tick(None, Some(&OpenField), FRAME);
        }
        assert_eq!(manager.spider(id).unwrap().position(), Vec3::new(3.0, 0.0, -4.0));
    }

    #[test]
    fn test_no_level_still_decides() {
        let (mut manager, _events) = manager();
        let id = manager.spawn_at(Vec3::new(0.0, 0.0, -8.0));
        let player = PlayerSnapshot::new(Vec3::ZERO, Vec3::FORWARD, false);
        manager.tick(Some(&player), None, FRAME);
        let spider = manager.spider(id).unwrap();
        assert_eq!(spider.state(), AiState::Attack);
        assert_eq!(spider.position(), Vec3::new(0.0, 0.0, -8.0));
    }

    #[test]
    fn test_projectile_kill_sweeps_and_counts() {
        let (mut manager, events) = manager();
        let id = manager.spawn_at(Vec3::new(0.0, 0.0, -2.0));
        let player = far_player();

        for _ in 0..10 {
            let _ = manager.fire_projectile(Vec3::new(0.0, 0.3, -1.0), Vec3::FORWARD);
            manager.tick(Some(&player), None, FRAME);
        }
        assert!(manager.spider(id).is_none());
        assert_eq!(manager.kill_count(), 1);
        assert_eq!(manager.hud().live, 0);

        let kills = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, SpiderEvent::EntityKilled { .. }))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_pause_keeps_regen_progress() {
        let (mut manager, _events) = manager();
        let player = PlayerSnapshot::new(Vec3::ZERO, Vec3::FORWARD, false);
        let id = manager.spawn_at(Vec3::ZERO);
        manager.tick(Some(&player), None, FRAME);
        assert_eq!(manager.player_combat().health(), 90);
        assert!(manager.remove_spider(id));

        while !manager.player_combat().is_regenerating() {
            manager.tick(Some(&player), None, FRAME);
        }
        // 480 ms into the first 1000 ms interval.
        for _ in 0..30 {
            manager.tick(Some(&player), None, FRAME);
        }
        assert_eq!(manager.player_combat().health(), 90);

        manager.pause();
        let frozen = manager.clock();
        manager.tick(Some(&player), None, Duration::from_secs(10));
        assert_eq!(manager.clock(), frozen);
        assert_eq!(manager.player_combat().health(), 90);
        assert!(manager.player_combat().is_regenerating());

        // The remaining 520 ms take 33 frames.
        manager.resume();
        for _ in 0..32 {
            manager.tick(Some(&player), None, FRAME);
        }
        assert_eq!(manager.player_combat().health(), 90);
        manager.tick(Some(&player), None, FRAME);
        assert_eq!(manager.player_combat().health(), 100);
    }

    #[test]
    fn test_contact_without_bite_blocks_regen() {
        let mut config = SpiderConfig::default();
        config.combat.melee_cooldown_ms = 60_000;
        let (mut manager, events) = SpiderManager::with_event_bus(config).unwrap();
        let player = PlayerSnapshot::new(Vec3::ZERO, Vec3::FORWARD, false);
        let _ = manager.spawn_at(Vec3::new(0.3, 0.0, 0.0));

        // Eight seconds of contact with a single bite at the start.
        for _ in 0..500 {
            manager.tick(Some(&player), None, FRAME);
        }
        let bites = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, SpiderEvent::PlayerDamaged { .. }))
            .count();
        assert_eq!(bites, 1);
        assert_eq!(manager.player_combat().health(), 90);
        assert!(!manager.player_combat().is_regenerating());
    }

    #[test]
    fn test_hud_reflects_counters() {
        let (mut manager, _events) = manager();
        let _ = manager.spawn_at(Vec3::ZERO);
        let _ = manager.spawn_at(Vec3::new(5.0, 0.0, 0.0));
        let hud = manager.hud();
        assert_eq!(hud.live, 2);
        assert_eq!(hud.spawned, 2);
        assert_eq!(hud.total, 24);
        assert_eq!(hud.killed, 0);
        assert_eq!(hud.player_health, 100);
    }
}
