//! Slot store: the lineage, the candidate pool and derived caches
//!
//! All mutation is synchronous and goes through this type, so every
//! dependent reads one consistent snapshot. The child gates everything:
//! no other slot accepts a selection while the child is empty, and
//! changing the child empties the other six slots and drops every derived
//! cache (affinity scores, display stats, candidate pool).

use crate::affinity::Bubble;
use crate::constraints;
use crate::service::{AffinityScoreMap, LineageReport};
use crate::slots::{LineageState, Selection, SlotKey, WireLineage};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate and per-slot numbers shown under the lineage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayStats {
    pub displayed_affinity: f64,
    pub total_compatibility: f64,
    pub per_slot_score: BTreeMap<SlotKey, f64>,
}

impl DisplayStats {
    pub fn slot_score(&self, slot: SlotKey) -> Option<f64> {
        self.per_slot_score.get(&slot).copied()
    }

    pub fn is_empty(&self) -> bool {
        *self == DisplayStats::default()
    }
}

impl From<&LineageReport> for DisplayStats {
    fn from(report: &LineageReport) -> Self {
        let per_slot_score = SlotKey::ANCESTORS
            .into_iter()
            .filter_map(|slot| report.slot_score(slot).map(|score| (slot, score)))
            .collect();
        Self {
            displayed_affinity: report.displayed_affinity,
            total_compatibility: report.total_compatibility,
            per_slot_score,
        }
    }
}

/// Affinity scores plus the child they were fetched for
#[derive(Debug, Clone)]
struct AffinityCache {
    child_id: String,
    scores: AffinityScoreMap,
}

#[derive(Debug, Default)]
pub struct SlotStore {
    state: LineageState,
    candidate_pool: BTreeSet<String>,
    affinity: Option<AffinityCache>,
    stats: DisplayStats,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotKey) -> Option<&Selection> {
        self.state.get(slot)
    }

    pub fn state(&self) -> &LineageState {
        &self.state
    }

    pub fn snapshot(&self) -> LineageState {
        self.state.clone()
    }

    pub fn names(&self) -> WireLineage {
        self.state.names()
    }

    pub fn child_id(&self) -> Option<&str> {
        self.state.id(SlotKey::Child)
    }

    /// Commit a new child, emptying every other slot and derived cache
    pub fn set_child(&mut self, selection: Selection) {
        self.clear_all();
        self.state.put(SlotKey::Child, Some(selection));
    }

    /// Commit `selection` to `slot`
    ///
    /// Fails with `ConstraintViolation` when the child is missing or the
    /// selection is disallowed for `slot` by the current state; on failure
    /// nothing changes.
    pub fn set_slot(&mut self, slot: SlotKey, selection: Selection) -> Result<()> {
        if slot.is_child() {
            self.set_child(selection);
            return Ok(());
        }

        if !self.state.has_child() || !constraints::is_allowed(slot, &selection.id, &self.state) {
            return Err(Error::ConstraintViolation {
                slot,
                id: selection.id,
            });
        }

        self.state.put(slot, Some(selection));
        Ok(())
    }

    /// Empty one slot; clearing the child is a full reset
    ///
    /// Returns whether anything changed.
    pub fn clear_slot(&mut self, slot: SlotKey) -> bool {
        if !self.state.is_filled(slot) {
            return false;
        }
        if slot.is_child() {
            self.reset();
        } else {
            self.state.put(slot, None);
        }
        true
    }

    /// Clear all seven slots and every derived cache
    pub fn reset(&mut self) {
        self.clear_all();
    }

    fn clear_all(&mut self) {
        self.state = LineageState::default();
        self.candidate_pool.clear();
        self.affinity = None;
        self.stats = DisplayStats::default();
    }

    pub fn candidate_pool(&self) -> &BTreeSet<String> {
        &self.candidate_pool
    }

    pub fn set_candidate_pool(&mut self, ids: impl IntoIterator<Item = String>) {
        self.candidate_pool = ids.into_iter().collect();
    }

    /// Cached scores, only if they belong to the current child
    pub fn affinity_scores(&self) -> Option<&AffinityScoreMap> {
        match (&self.affinity, self.child_id()) {
            (Some(cache), Some(child)) if cache.child_id == child => Some(&cache.scores),
            _ => None,
        }
    }

    /// Cache scores fetched for `child_id`; ignored if the child moved on
    pub fn cache_affinity(&mut self, child_id: &str, scores: AffinityScoreMap) -> bool {
        if self.child_id() != Some(child_id) {
            return false;
        }
        self.affinity = Some(AffinityCache {
            child_id: child_id.to_string(),
            scores,
        });
        true
    }

    pub fn display_stats(&self) -> &DisplayStats {
        &self.stats
    }

    pub fn set_display_stats(&mut self, stats: DisplayStats) {
        self.stats = stats;
    }

    pub fn clear_display_stats(&mut self) {
        self.stats = DisplayStats::default();
    }

    /// Bubble for a non-child slot, driven by the last applied stats
    pub fn bubble(&self, slot: SlotKey) -> Option<Bubble> {
        if slot.is_child() {
            return None;
        }
        Some(Bubble::from_score(self.stats.slot_score(slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(id: &str) -> Selection {
        Selection::from_roster_name(id, "/s")
    }

    fn filled_store() -> SlotStore {
        let mut store = SlotStore::new();
        store.set_child(sel("A"));
        store.set_slot(SlotKey::P1, sel("B")).unwrap();
        store.set_slot(SlotKey::P2, sel("C")).unwrap();
        store.set_slot(SlotKey::Gp1, sel("D")).unwrap();
        store.set_slot(SlotKey::Gp2, sel("E")).unwrap();
        store.set_slot(SlotKey::Gp3, sel("F")).unwrap();
        store.set_slot(SlotKey::Gp4, sel("G")).unwrap();
        store.set_candidate_pool(["H".to_string(), "I".to_string()]);
        store.set_display_stats(DisplayStats {
            displayed_affinity: 10.0,
            total_compatibility: 20.0,
            per_slot_score: BTreeMap::from([(SlotKey::P1, 50.0)]),
        });
        store
    }

    #[test]
    fn test_non_child_slots_require_child() {
        let mut store = SlotStore::new();
        let err = store.set_slot(SlotKey::P1, sel("B")).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { slot: SlotKey::P1, .. }));
        assert!(store.state().is_blank());
    }

    #[test]
    fn test_set_child_resets_other_slots_and_caches() {
        let mut store = filled_store();
        let mut scores = AffinityScoreMap::new();
        scores.insert("B".to_string(), 10.0);
        assert!(store.cache_affinity("A", scores));

        store.set_child(sel("Z"));

        assert_eq!(store.child_id(), Some("Z"));
        for slot in SlotKey::ANCESTORS {
            assert!(store.get(slot).is_none(), "{} should be empty", slot);
        }
        assert!(store.candidate_pool().is_empty());
        assert!(store.affinity_scores().is_none());
        assert!(store.display_stats().is_empty());
    }

    #[test]
    fn test_setting_same_child_still_resets() {
        let mut store = filled_store();
        store.set_child(sel("A"));
        assert!(store.get(SlotKey::P1).is_none());
    }

    #[test]
    fn test_disallowed_selection_leaves_state_unchanged() {
        let mut store = filled_store();
        let before = store.snapshot();

        for (slot, id) in [
            (SlotKey::P1, "C"),
            (SlotKey::P2, "B"),
            (SlotKey::Gp1, "B"),
            (SlotKey::Gp1, "E"),
            (SlotKey::Gp4, "C"),
            (SlotKey::Gp4, "F"),
        ] {
            let err = store.set_slot(slot, sel(id)).unwrap_err();
            assert!(matches!(err, Error::ConstraintViolation { .. }));
            assert_eq!(store.snapshot(), before);
        }
    }

    #[test]
    fn test_replacing_slot_with_own_value_is_allowed() {
        let mut store = filled_store();
        assert!(store.set_slot(SlotKey::Gp1, sel("D")).is_ok());
    }

    #[test]
    fn test_clear_slot() {
        let mut store = filled_store();
        assert!(store.clear_slot(SlotKey::Gp3));
        assert!(!store.clear_slot(SlotKey::Gp3));
        assert!(store.get(SlotKey::Gp3).is_none());
        assert!(store.get(SlotKey::Gp4).is_some());

        assert!(store.clear_slot(SlotKey::Child));
        assert!(store.state().is_blank());
    }

    #[test]
    fn test_reset_returns_everything_to_default() {
        let mut store = filled_store();
        store.reset();
        assert!(store.state().is_blank());
        assert!(store.candidate_pool().is_empty());
        assert!(store.display_stats().is_empty());
    }

    #[test]
    fn test_affinity_cache_is_scoped_to_child() {
        let mut store = SlotStore::new();
        store.set_child(sel("A"));
        assert!(!store.cache_affinity("B", AffinityScoreMap::new()));
        assert!(store.affinity_scores().is_none());
        assert!(store.cache_affinity("A", AffinityScoreMap::new()));
        assert!(store.affinity_scores().is_some());
    }

    #[test]
    fn test_bubbles_follow_display_stats() {
        let store = filled_store();
        assert!(store.bubble(SlotKey::Child).is_none());
        assert_eq!(store.bubble(SlotKey::P1).unwrap().label, "x1.50");
        assert_eq!(store.bubble(SlotKey::P2).unwrap().label, "x0.00");
    }

    #[test]
    fn test_display_stats_from_report() {
        let report = LineageReport {
            p1: 150.0,
            gp2_2: 3.0,
            total_compatibility: 300.0,
            displayed_affinity: 200.0,
            ..Default::default()
        };
        let stats = DisplayStats::from(&report);
        assert_eq!(stats.slot_score(SlotKey::P1), Some(150.0));
        assert_eq!(stats.slot_score(SlotKey::Gp4), Some(3.0));
        assert_eq!(stats.slot_score(SlotKey::Child), None);
        assert_eq!(stats.total_compatibility, 300.0);
    }
}
