//! # Swarm Events
//!
//! Everything the swarm wants the outside world to know about leaves
//! through here.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌──────────────────┐
//! │   Spider    │─────>│   Event     │─────>│ Renderer / Audio │
//! │   Manager   │      │   Channel   │      │      / HUD       │
//! └─────────────┘      └─────────────┘      └──────────────────┘
//! ```
//!
//! The channel is bounded. A full channel drops the event rather than
//! stalling the tick.

use broodfall_shared::{EventKind, HudSnapshot, Vec3};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::spider::{AiState, SpiderClip, SpiderId};

/// Sounds the swarm asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Low chitter of a spider that has not noticed anything.
    Chitter,
    /// Shriek on noticing or charging the player.
    Shriek,
    /// A bite landing on the player.
    Bite,
    /// The player's pain scream.
    Scream,
}

/// Events emitted by the swarm.
#[derive(Clone, Debug, PartialEq)]
pub enum SpiderEvent {
    // =========================================================================
    // Lifecycle
    // =========================================================================
    /// A spider entered the world.
    Spawned {
        /// New spider.
        id: SpiderId,
        /// Spawn position.
        position: Vec3,
    },

    /// A spider died and has been removed.
    EntityKilled {
        /// Dead spider.
        id: SpiderId,
        /// Where it died.
        position: Vec3,
    },

    // =========================================================================
    // Combat
    // =========================================================================
    /// A projectile hit a spider.
    DamageDealt {
        /// Spider that was hit.
        id: SpiderId,
        /// Damage applied.
        amount: i32,
        /// Health after the hit.
        health: i32,
    },

    /// A spider bit the player.
    PlayerDamaged {
        /// Spider that landed the bite.
        attacker: SpiderId,
        /// Damage applied.
        amount: i32,
        /// Player health after the bite.
        health: i32,
    },

    /// The player regenerated.
    PlayerHealed {
        /// Health restored.
        amount: i32,
        /// Player health afterwards.
        health: i32,
    },

    /// The player's health reached zero. Emitted once per run.
    PlayerKilled {
        /// Spider that landed the final bite.
        attacker: SpiderId,
    },

    // =========================================================================
    // Presentation
    // =========================================================================
    /// Counters changed.
    HudUpdate(HudSnapshot),

    /// A spider changed AI state.
    StateChanged {
        /// Spider.
        id: SpiderId,
        /// Previous state.
        from: AiState,
        /// New state.
        to: AiState,
    },

    /// A spider started an attack animation.
    AttackCue {
        /// Spider.
        id: SpiderId,
        /// Attack clip to play once.
        clip: SpiderClip,
    },

    /// A sound should be played.
    Sound {
        /// Spider emitting it, if any.
        id: Option<SpiderId>,
        /// What to play.
        cue: SoundCue,
        /// Where to play it.
        position: Vec3,
    },

    /// A spider should flash red.
    HitFlash {
        /// Spider.
        id: SpiderId,
        /// Flash length in milliseconds.
        duration_ms: u64,
    },

    /// A spider's health bar changed.
    HealthBar {
        /// Spider.
        id: SpiderId,
        /// Fill in `[0, 1]`.
        fraction: f32,
    },
}

impl SpiderEvent {
    /// Discriminator for filtering.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Spawned { .. } => EventKind::Spawned,
            Self::EntityKilled { .. } => EventKind::EntityKilled,
            Self::DamageDealt { .. } => EventKind::DamageDealt,
            Self::PlayerDamaged { .. } => EventKind::PlayerDamaged,
            Self::PlayerHealed { .. } => EventKind::PlayerHealed,
            Self::PlayerKilled { .. } => EventKind::PlayerKilled,
            Self::HudUpdate(_) => EventKind::HudUpdate,
            Self::StateChanged { .. } => EventKind::StateChanged,
            Self::AttackCue { .. } => EventKind::AttackCue,
            Self::Sound { .. } => EventKind::Sound,
            Self::HitFlash { .. } => EventKind::HitFlash,
            Self::HealthBar { .. } => EventKind::HealthBar,
        }
    }
}

/// Event bus between the swarm and its consumers.
///
/// Pre-allocates a bounded channel to prevent memory growth in the hot path.
pub struct EventBus {
    sender: Sender<SpiderEvent>,
    receiver: Receiver<SpiderEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a new pair of sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<SpiderEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: SpiderEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!("Event channel full, dropping {:?}", event.kind());
                false
            }
            // Nobody is listening; nothing to report.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<SpiderEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<SpiderEvent> {
        let mut events = Vec::with_capacity(self.receiver.len());
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<SpiderEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let (sender, receiver) = EventBus::create_pair(16);

        assert!(sender.send(SpiderEvent::DamageDealt {
            id: SpiderId(4),
            amount: 10,
            health: 90,
        }));
        assert!(receiver.has_events());

        let received = receiver.try_recv().unwrap();
        assert_eq!(received.kind(), EventKind::DamageDealt);
        if let SpiderEvent::DamageDealt { id, health, .. } = received {
            assert_eq!(id, SpiderId(4));
            assert_eq!(health, 90);
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_event_drain() {
        let (sender, receiver) = EventBus::create_pair(16);
        for i in 0..10 {
            let _ = sender.send(SpiderEvent::Spawned {
                id: SpiderId(i),
                position: Vec3::ZERO,
            });
        }

        let events = receiver.drain();
        assert_eq!(events.len(), 10);
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_channel_drops() {
        let (sender, receiver) = EventBus::create_pair(2);
        let event = SpiderEvent::HealthBar {
            id: SpiderId(0),
            fraction: 0.5,
        };
        assert!(sender.send(event.clone()));
        assert!(sender.send(event.clone()));
        assert!(!sender.send(event));
        assert_eq!(receiver.pending_count(), 2);
    }

    #[test]
    fn test_disconnected_receiver() {
        let sender = EventBus::new(4).sender();
        assert!(!sender.send(SpiderEvent::PlayerKilled {
            attacker: SpiderId(1)
        }));
    }
}
