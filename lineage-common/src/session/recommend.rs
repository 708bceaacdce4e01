//! Recommendation: ask the optimizer for a full lineage and merge it into
//! the empty slots only

use super::core::LineageSession;
use crate::constraints;
use crate::error::Error;
use crate::events::LineageEvent;
use crate::service::ScoringService;
use crate::slots::{LineageState, Selection, SlotKey, WireLineage};
use crate::Result;
use chrono::Utc;
use tracing::{info, warn};

/// Result of merging an optimizer suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Lineage after the merge
    pub lineage: LineageState,
    /// Empty slots that took the suggested value
    pub filled: Vec<SlotKey>,
    /// Empty slots whose suggestion broke a uniqueness rule
    pub rejected: Vec<SlotKey>,
}

/// Merge `suggested` into the empty slots of `current`
///
/// Filled slots are never touched. Slots are visited in wire order and
/// each suggestion is checked against the lineage as merged so far; a
/// suggestion that would repeat a sibling or a cross-generation partner is
/// left out and its slot stays empty. Blank suggestions are skipped.
pub fn merge_suggestion(
    current: &LineageState,
    suggested: &WireLineage,
    sprite_base: &str,
) -> MergeOutcome {
    let mut lineage = current.clone();
    let mut filled = Vec::new();
    let mut rejected = Vec::new();

    if !lineage.has_child() {
        return MergeOutcome {
            lineage,
            filled,
            rejected,
        };
    }

    for slot in SlotKey::ANCESTORS {
        if lineage.is_filled(slot) {
            continue;
        }
        let name = &suggested[slot.index()];
        if name.trim().is_empty() {
            continue;
        }
        if !constraints::is_allowed(slot, name, &lineage) {
            rejected.push(slot);
            continue;
        }
        lineage.put(slot, Some(Selection::from_roster_name(name, sprite_base)));
        filled.push(slot);
    }

    MergeOutcome {
        lineage,
        filled,
        rejected,
    }
}

impl<S: ScoringService + 'static> LineageSession<S> {
    /// Request an optimized lineage and fill the empty slots from it
    ///
    /// Requires a child. On optimizer failure nothing changes. When the
    /// merged lineage is exactly the suggestion, the optimizer's stats are
    /// shown directly; otherwise a fresh stats request is issued.
    pub async fn recommend(&mut self) -> Result<MergeOutcome> {
        if !self.store.state().has_child() {
            return Err(Error::no_child("Recommending a lineage"));
        }

        let lineage = self.store.names();
        let pool: Vec<String> = self.store.candidate_pool().iter().cloned().collect();
        info!(pool = pool.len(), "Requesting optimized lineage");

        let report = match self.service.optimize(&lineage, &pool).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Optimize failed, lineage unchanged");
                return Err(e.into());
            }
        };

        let outcome = merge_suggestion(self.store.state(), &report.lineage, &self.sprite_base);

        for &slot in &outcome.filled {
            if let Some(selection) = outcome.lineage.get(slot) {
                self.store.set_slot(slot, selection.clone())?;
                self.slot_changed(slot, Some(selection.id.clone()));
            }
        }
        for &slot in &outcome.rejected {
            warn!(
                slot = %slot,
                suggested = %report.lineage[slot.index()],
                "Suggestion repeats a related slot, left empty"
            );
        }

        if outcome.lineage.names() == report.lineage {
            self.apply_report_directly(&report);
        } else {
            self.sync_stats();
        }

        info!(
            filled = outcome.filled.len(),
            rejected = outcome.rejected.len(),
            "Recommendation applied"
        );
        self.events.emit_lossy(LineageEvent::RecommendationApplied {
            filled: outcome.filled.clone(),
            rejected: outcome.rejected.clone(),
            timestamp: Utc::now(),
        });

        Ok(outcome)
    }
}
