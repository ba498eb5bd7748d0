//! # BROODFALL
//!
//! Spider swarm AI and combat resolution for a first-person survival game.
//!
//! ## Architecture
//!
//! ```text
//! PlayerState ──┐                       ┌──> TransformSink (renderer)
//!               ├──> SpiderManager::tick┤
//! SpatialQuery ─┘        │              └──> SpiderEvent channel (HUD/audio)
//!                        │
//!         ┌──────────────┼───────────────┐
//!         ▼              ▼               ▼
//!   AiStateMachine   Steering      CombatResolver
//! ```
//!
//! The crate is headless. Level geometry, the player and the renderer are
//! reached only through the traits above; nothing here knows about a scene
//! graph, the DOM or an audio device.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (mut swarm, events) = SpiderManager::with_event_bus(SpiderConfig::default())?;
//! swarm.set_model_ready(true);
//! swarm.start_spawning();
//!
//! // every frame
//! swarm.tick(Some(&player), Some(&level), frame_delta);
//! for event in events.drain() {
//!     hud.apply(event);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ai;
pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod player;
pub mod render;
pub mod schedule;
pub mod spatial;
pub mod spider;
pub mod steering;

pub use ai::{sees_player, AiStateMachine, AiStep};
pub use combat::{CombatResolver, HitOutcome, MeleeOutcome, Projectile, ProjectileId};
pub use config::SpiderConfig;
pub use error::{BroodError, BroodResult};
pub use events::{EventBus, EventReceiver, EventSender, SoundCue, SpiderEvent};
pub use manager::SpiderManager;
pub use player::{PlayerCombatState, PlayerSnapshot, PlayerState};
pub use render::{SharedTransforms, SpiderTransform, TransformSink};
pub use schedule::ScheduledTask;
pub use spatial::{BoxWorld, OpenField, RayHit, SpatialQuery, SurfaceTag, TaggedBox};
pub use spider::{AiState, Spider, SpiderClip, SpiderId};
pub use steering::Steering;

pub use broodfall_shared::{EventKind, HudSnapshot, Vec3, GROUND_Y};
