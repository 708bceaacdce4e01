//! Picker sessions
//!
//! A picker session is a transient sub-state opened for one slot (single
//! select) or for the candidate pool (multi select). Candidates are loaded
//! once at open time; the lineage is only touched on commit, and the
//! commit re-validates against the lineage as it is at that moment.
//!
//! Phases: `Closed -> Loading -> Open -> Committed | Cancelled -> Closed`.

use super::core::LineageSession;
use crate::constraints;
use crate::error::Error;
use crate::events::{LineageEvent, PickerTarget};
use crate::service::{AffinityScoreMap, ScoringService};
use crate::slots::{Selection, SlotKey};
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerPhase {
    Closed,
    Loading,
    Open,
    Committed,
    Cancelled,
}

/// One row of a picker list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOption {
    pub selection: Selection,
    /// Pairwise affinity with the child; `None` for the child picker
    pub score: Option<f64>,
}

/// Transient selection state of one open picker
#[derive(Debug, Clone)]
pub struct PickerSession {
    target: PickerTarget,
    phase: PickerPhase,
    options: Vec<CandidateOption>,
    selected: BTreeSet<String>,
    fetch_failed: bool,
}

impl PickerSession {
    fn loading(target: PickerTarget) -> Self {
        Self {
            target,
            phase: PickerPhase::Loading,
            options: Vec::new(),
            selected: BTreeSet::new(),
            fetch_failed: false,
        }
    }

    fn load(&mut self, options: Vec<CandidateOption>, fetch_failed: bool) {
        self.options = options;
        self.fetch_failed = fetch_failed;
        self.phase = PickerPhase::Open;
    }

    pub fn target(&self) -> PickerTarget {
        self.target
    }

    pub fn phase(&self) -> PickerPhase {
        self.phase
    }

    pub fn is_multi(&self) -> bool {
        self.target == PickerTarget::CandidatePool
    }

    /// All candidates in display order
    pub fn options(&self) -> &[CandidateOption] {
        &self.options
    }

    /// True when the candidate fetch failed and the list is empty
    pub fn fetch_failed(&self) -> bool {
        self.fetch_failed
    }

    /// Candidates whose name contains `query`, case-insensitively
    ///
    /// An empty or whitespace query shows everything. Filtering preserves
    /// the affinity order.
    pub fn visible(&self, query: &str) -> Vec<&CandidateOption> {
        let needle = query.trim().to_lowercase();
        self.options
            .iter()
            .filter(|o| needle.is_empty() || o.selection.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// The chosen option of a single-select session
    pub fn selected_option(&self) -> Option<&CandidateOption> {
        self.options
            .iter()
            .find(|o| self.selected.contains(&o.selection.id))
    }

    fn contains(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.selection.id == id)
    }

    /// Mark `id` as chosen; single select replaces the previous choice
    ///
    /// Returns false when `id` is not one of the candidates.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        if !self.is_multi() {
            self.selected.clear();
        }
        self.selected.insert(id.to_string());
        true
    }

    /// Flip `id` between chosen and not chosen
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            return true;
        }
        self.select(id)
    }

    /// Select every visible candidate, or deselect them all if every
    /// visible candidate is already selected (multi select only)
    pub fn toggle_all_visible(&mut self, query: &str) -> bool {
        if !self.is_multi() {
            return false;
        }
        let ids: Vec<String> = self
            .visible(query)
            .into_iter()
            .map(|o| o.selection.id.clone())
            .collect();
        if ids.is_empty() {
            return false;
        }
        if ids.iter().all(|id| self.selected.contains(id)) {
            for id in &ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(ids);
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

/// Rank candidates by score descending, ties broken by name ascending
///
/// Ids in `excluded` are dropped before ranking.
pub fn rank_by_affinity(
    scores: &AffinityScoreMap,
    excluded: &HashSet<String>,
    sprite_base: &str,
) -> Vec<CandidateOption> {
    let mut options: Vec<CandidateOption> = scores
        .iter()
        .filter(|(id, _)| !excluded.contains(id.as_str()))
        .map(|(id, score)| CandidateOption {
            selection: Selection::from_roster_name(id, sprite_base),
            score: Some(*score),
        })
        .collect();

    options.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.total_cmp(&sa)
            .then_with(|| a.selection.name.cmp(&b.selection.name))
    });
    options
}

impl<S: ScoringService + 'static> LineageSession<S> {
    /// Open a single-select picker for `slot`
    ///
    /// The child picker lists the roster. Any other slot lists the child's
    /// affinity partners (fetched once per child and cached) minus the ids
    /// disallowed for `slot` right now, ranked by affinity. A failed fetch
    /// still opens the session, with an empty list.
    pub async fn open_picker(&mut self, slot: SlotKey) -> Result<&PickerSession> {
        if !slot.is_child() && !self.store.state().has_child() {
            debug!(slot = %slot, "Picker ignored, no child selected");
            return Err(Error::no_child("Picking an ancestor"));
        }

        let target = PickerTarget::Slot(slot);
        self.begin_picker(target);

        let (options, fetch_failed) = if slot.is_child() {
            match self.service.list_characters().await {
                Ok(roster) => {
                    let options = roster
                        .iter()
                        .map(|name| CandidateOption {
                            selection: self.selection_for(name),
                            score: None,
                        })
                        .collect();
                    (options, false)
                }
                Err(e) => {
                    warn!(error = %e, "Roster fetch failed");
                    (Vec::new(), true)
                }
            }
        } else {
            match self.child_affinity(false).await {
                Some(scores) => {
                    let disallowed = constraints::disallowed_ids(slot, self.store.state());
                    (rank_by_affinity(&scores, &disallowed, &self.sprite_base), false)
                }
                None => (Vec::new(), true),
            }
        };

        let preselect: Vec<String> = self.store.get(slot).map(|s| s.id.clone()).into_iter().collect();
        Ok(self.finish_loading(target, options, fetch_failed, preselect))
    }

    /// Open the multi-select picker for the candidate pool
    ///
    /// Lists every affinity partner of the child except the child itself,
    /// refreshed from the service, with the current pool preselected.
    pub async fn open_pool_picker(&mut self) -> Result<&PickerSession> {
        let child_id = match self.store.child_id() {
            Some(id) => id.to_string(),
            None => {
                debug!("Pool picker ignored, no child selected");
                return Err(Error::no_child("Editing the candidate pool"));
            }
        };

        self.begin_picker(PickerTarget::CandidatePool);

        let (options, fetch_failed) = match self.child_affinity(true).await {
            Some(scores) => {
                let excluded = HashSet::from([child_id]);
                (rank_by_affinity(&scores, &excluded, &self.sprite_base), false)
            }
            None => (Vec::new(), true),
        };

        let preselect: Vec<String> = self.store.candidate_pool().iter().cloned().collect();
        Ok(self.finish_loading(PickerTarget::CandidatePool, options, fetch_failed, preselect))
    }

    /// Commit the open picker's selection
    ///
    /// Slot targets are re-validated against the current lineage; on a
    /// violation the lineage is untouched and the picker stays open.
    pub fn commit_picker(&mut self) -> Result<PickerTarget> {
        let (target, selected_ids, chosen) = match self.picker.as_ref() {
            Some(p) if p.phase() == PickerPhase::Open => (
                p.target(),
                p.selected_ids().map(str::to_owned).collect::<Vec<_>>(),
                p.selected_option().map(|o| o.selection.clone()),
            ),
            _ => {
                return Err(Error::PreconditionNotMet(
                    "No picker is open".to_string(),
                ))
            }
        };

        match target {
            PickerTarget::CandidatePool => {
                if self.picker.as_ref().is_some_and(PickerSession::fetch_failed) {
                    return Err(Error::PreconditionNotMet(
                        "Candidate list failed to load; the pool is unchanged".to_string(),
                    ));
                }
                info!(count = selected_ids.len(), "Candidate pool confirmed");
                self.store.set_candidate_pool(selected_ids.iter().cloned());
            }
            PickerTarget::Slot(slot) => {
                let selection = chosen.ok_or_else(|| {
                    Error::PreconditionNotMet(format!("No selection made for {}", slot.label()))
                })?;
                if slot.is_child() {
                    self.set_child(selection);
                } else {
                    self.set_slot(slot, selection).map_err(|e| {
                        debug!(slot = %slot, error = %e, "Commit rejected by current lineage");
                        e
                    })?;
                }
            }
        }

        self.close_picker(PickerPhase::Committed, selected_ids);
        Ok(target)
    }

    /// Discard the open picker; returns false if none was open
    pub fn cancel_picker(&mut self) -> bool {
        match self.picker.take() {
            Some(mut picker) => {
                picker.phase = PickerPhase::Cancelled;
                debug!(picker = ?picker.target(), "Picker cancelled");
                self.events.emit_lossy(LineageEvent::PickerCancelled {
                    target: picker.target(),
                    timestamp: Utc::now(),
                });
                true
            }
            None => false,
        }
    }

    /// Start a session for `target`, replacing any open one
    fn begin_picker(&mut self, target: PickerTarget) {
        if self.picker.is_some() {
            self.cancel_picker();
        }
        self.picker = Some(PickerSession::loading(target));
        self.events.emit_lossy(LineageEvent::PickerOpenRequested {
            target,
            timestamp: Utc::now(),
        });
    }

    fn finish_loading(
        &mut self,
        target: PickerTarget,
        options: Vec<CandidateOption>,
        fetch_failed: bool,
        preselect: Vec<String>,
    ) -> &PickerSession {
        let picker = self
            .picker
            .get_or_insert_with(|| PickerSession::loading(target));
        picker.load(options, fetch_failed);
        for id in &preselect {
            if !picker.select(id) && !fetch_failed {
                warn!(picker = ?target, id = %id, "Preselected id no longer listed, dropped");
            }
        }
        debug!(
            picker = ?picker.target(),
            options = picker.options().len(),
            fetch_failed,
            "Picker open"
        );
        self.events.emit_lossy(LineageEvent::PickerOptionsReady {
            target: picker.target(),
            option_count: picker.options().len(),
            fetch_failed,
            timestamp: Utc::now(),
        });
        picker
    }

    fn close_picker(&mut self, phase: PickerPhase, selected: Vec<String>) {
        if let Some(mut picker) = self.picker.take() {
            picker.phase = phase;
            self.events.emit_lossy(LineageEvent::PickerCommitted {
                target: picker.target(),
                selected,
                timestamp: Utc::now(),
            });
        }
    }

    /// Affinity map for the current child, from cache unless `refresh`
    async fn child_affinity(&mut self, refresh: bool) -> Option<AffinityScoreMap> {
        let child_id = self.store.child_id()?.to_string();
        if !refresh {
            if let Some(cached) = self.store.affinity_scores() {
                return Some(cached.clone());
            }
        }
        match self.service.affinity(&child_id).await {
            Ok(scores) => {
                debug!(child = %child_id, partners = scores.len(), "Affinity loaded");
                self.store.cache_affinity(&child_id, scores.clone());
                Some(scores)
            }
            Err(e) => {
                warn!(child = %child_id, error = %e, "Affinity fetch failed");
                None
            }
        }
    }
}
