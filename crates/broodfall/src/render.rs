//! # Render Bridge
//!
//! The swarm writes each spider's placement into a [`TransformSink`] at the
//! end of its tick and tells the sink when a spider is gone. The engine
//! decides what to do with it.
//!
//! [`SharedTransforms`] is a ready-made sink: a cloneable table the render
//! thread can read while the logic thread writes.

use std::collections::HashMap;
use std::sync::Arc;

use broodfall_shared::Vec3;
use parking_lot::RwLock;

use crate::spider::{Spider, SpiderClip, SpiderId};

/// Placement of one spider for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpiderTransform {
    /// Feet position.
    pub position: Vec3,
    /// Yaw in radians; 0 faces -Z.
    pub yaw: f32,
    /// Red hit flash active.
    pub flashing: bool,
    /// Clip that should be playing.
    pub clip: SpiderClip,
    /// Health bar fill in `[0, 1]`.
    pub health_fraction: f32,
}

impl From<&Spider> for SpiderTransform {
    fn from(spider: &Spider) -> Self {
        Self {
            position: spider.position(),
            yaw: spider.yaw(),
            flashing: spider.is_flashing(),
            clip: spider.clip(),
            health_fraction: spider.health_fraction(),
        }
    }
}

/// Receives placement writes from the swarm.
pub trait TransformSink {
    /// Places (or re-places) a spider.
    fn place(&mut self, id: SpiderId, transform: SpiderTransform);
    /// Forgets a spider that died or was removed.
    fn remove(&mut self, id: SpiderId);
}

/// Thread-safe placement table.
///
/// Clones share the same table.
#[derive(Clone, Debug, Default)]
pub struct SharedTransforms {
    table: Arc<RwLock<HashMap<SpiderId, SpiderTransform>>>,
}

impl SharedTransforms {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest placement of a spider.
    #[must_use]
    pub fn get(&self, id: SpiderId) -> Option<SpiderTransform> {
        self.table.read().get(&id).copied()
    }

    /// Number of placed spiders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// True if nothing is placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Copies every placement, sorted by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SpiderId, SpiderTransform)> {
        let mut all: Vec<_> = self.table.read().iter().map(|(k, v)| (*k, *v)).collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }
}

impl TransformSink for SharedTransforms {
    fn place(&mut self, id: SpiderId, transform: SpiderTransform) {
        self.table.write().insert(id, transform);
    }

    fn remove(&mut self, id: SpiderId) {
        self.table.write().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_transforms_clone_shares_table() {
        let table = SharedTransforms::new();
        let mut writer = table.clone();
        let spider = Spider::new(SpiderId(7), Vec3::new(1.0, 0.0, 2.0), Vec3::FORWARD);

        writer.place(spider.id(), SpiderTransform::from(&spider));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(SpiderId(7)).unwrap().position, Vec3::new(1.0, 0.0, 2.0));

        writer.remove(SpiderId(7));
        assert!(table.is_empty());
    }

    #[test]
    fn test_snapshot_sorted() {
        let mut table = SharedTransforms::new();
        for id in [3, 1, 2] {
            let spider = Spider::new(SpiderId(id), Vec3::ZERO, Vec3::FORWARD);
            table.place(spider.id(), SpiderTransform::from(&spider));
        }
        let ids: Vec<_> = table.snapshot().into_iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
