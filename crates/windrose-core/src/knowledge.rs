use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use windrose_protocol::KnowledgeBranch;

/// Decay factor applied per step when knowledge spills to a neighbor tile.
pub const SPILLOVER_DECAY: f32 = 0.1;

/// Per-tile knowledge accumulation.
///
/// Points only ever increase, up to a per-branch maximum. A branch already
/// at or above the maximum passed to [`TileKnowledge::add`] is left alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileKnowledge {
    points: BTreeMap<KnowledgeBranch, i32>,
}

impl TileKnowledge {
    /// Credit `points` to `branch`, reduced by `decay` and clamped to
    /// `max_points`. Never decreases the stored value.
    pub fn add(&mut self, branch: KnowledgeBranch, points: i32, decay: f32, max_points: i32) {
        let gained = (points as f32 * (1.0 - decay)).floor() as i32;
        if gained <= 0 {
            return;
        }
        let current = self.points.get(&branch).copied().unwrap_or(0);
        if current >= max_points {
            return;
        }
        self.points.insert(branch, (current + gained).min(max_points));
    }

    pub fn get(&self, branch: KnowledgeBranch) -> i32 {
        self.points.get(&branch).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Branches in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (KnowledgeBranch, i32)> + '_ {
        self.points.iter().map(|(&branch, &points)| (branch, points))
    }

    pub fn entries(&self) -> BTreeMap<KnowledgeBranch, i32> {
        self.points.clone()
    }

    pub fn from_entries(entries: BTreeMap<KnowledgeBranch, i32>) -> Self {
        Self { points: entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_rounds_down() {
        let mut k = TileKnowledge::default();
        k.add(KnowledgeBranch::Agriculture, 10, SPILLOVER_DECAY, 40);
        assert_eq!(k.get(KnowledgeBranch::Agriculture), 9);
    }

    #[test]
    fn clamps_to_max_and_never_decreases() {
        let mut k = TileKnowledge::default();
        k.add(KnowledgeBranch::Masonry, 38, 0.0, 40);
        k.add(KnowledgeBranch::Masonry, 10, 0.0, 40);
        assert_eq!(k.get(KnowledgeBranch::Masonry), 40);

        // At max: further additions are a no-op even with a lower max.
        k.add(KnowledgeBranch::Masonry, 10, 0.0, 20);
        assert_eq!(k.get(KnowledgeBranch::Masonry), 40);
    }

    #[test]
    fn tiny_spill_is_dropped() {
        let mut k = TileKnowledge::default();
        k.add(KnowledgeBranch::Seafaring, 0, SPILLOVER_DECAY, 30);
        k.add(KnowledgeBranch::Seafaring, 1, 0.5, 30);
        assert!(k.is_empty());
    }
}
