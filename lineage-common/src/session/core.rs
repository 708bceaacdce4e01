//! Session construction, snapshots and direct slot mutations

use super::picker::{PickerPhase, PickerSession};
use super::stats::{GenerationCounter, StatsReply};
use crate::affinity::Bubble;
use crate::events::{EventBus, LineageEvent};
use crate::service::{FetchError, ScoringService};
use crate::slots::{LineageState, Selection, SlotKey};
use crate::store::{DisplayStats, SlotStore};
use crate::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Owner of the lineage store, the open picker and in-flight stats requests
///
/// Mutating methods spawn stats requests with `tokio::spawn` and must run
/// inside a Tokio runtime.
pub struct LineageSession<S: ScoringService + 'static> {
    pub(super) service: Arc<S>,
    pub(super) store: SlotStore,
    pub(super) events: EventBus,
    pub(super) sprite_base: String,
    pub(super) picker: Option<PickerSession>,
    pub(super) generations: GenerationCounter,
    pub(super) stats_in_flight: usize,
    pub(super) last_stats_error: Option<FetchError>,
    pub(super) stats_tx: mpsc::UnboundedSender<StatsReply>,
    pub(super) stats_rx: mpsc::UnboundedReceiver<StatsReply>,
}

impl<S: ScoringService + 'static> LineageSession<S> {
    pub fn new(service: Arc<S>, events: EventBus, sprite_base: impl Into<String>) -> Self {
        let (stats_tx, stats_rx) = mpsc::unbounded_channel();
        Self {
            service,
            store: SlotStore::new(),
            events,
            sprite_base: sprite_base.into(),
            picker: None,
            generations: GenerationCounter::default(),
            stats_in_flight: 0,
            last_stats_error: None,
            stats_tx,
            stats_rx,
        }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn state(&self) -> &LineageState {
        self.store.state()
    }

    pub fn snapshot(&self) -> LineageState {
        self.store.snapshot()
    }

    pub fn display_stats(&self) -> &DisplayStats {
        self.store.display_stats()
    }

    pub fn candidate_pool(&self) -> &BTreeSet<String> {
        self.store.candidate_pool()
    }

    pub fn bubble(&self, slot: SlotKey) -> Option<Bubble> {
        self.store.bubble(slot)
    }

    /// Bubbles for the six non-child slots in wire order
    pub fn bubbles(&self) -> Vec<(SlotKey, Bubble)> {
        SlotKey::ANCESTORS
            .into_iter()
            .filter_map(|slot| self.store.bubble(slot).map(|b| (slot, b)))
            .collect()
    }

    pub fn picker(&self) -> Option<&PickerSession> {
        self.picker.as_ref()
    }

    pub fn picker_mut(&mut self) -> Option<&mut PickerSession> {
        self.picker.as_mut()
    }

    pub fn picker_phase(&self) -> PickerPhase {
        self.picker
            .as_ref()
            .map(PickerSession::phase)
            .unwrap_or(PickerPhase::Closed)
    }

    /// Selection for a roster id, with the configured sprite path
    pub fn selection_for(&self, id: &str) -> Selection {
        Selection::from_roster_name(id, &self.sprite_base)
    }

    pub fn set_child(&mut self, selection: Selection) {
        let id = selection.id.clone();
        self.store.set_child(selection);
        info!(child = %id, "Child selected, lineage cleared");
        self.slot_changed(SlotKey::Child, Some(id));
        self.sync_stats();
    }

    /// Commit to any slot; fails with `ConstraintViolation` without mutating
    pub fn set_slot(&mut self, slot: SlotKey, selection: Selection) -> Result<()> {
        if slot.is_child() {
            self.set_child(selection);
            return Ok(());
        }
        let id = selection.id.clone();
        self.store.set_slot(slot, selection)?;
        info!(slot = %slot, id = %id, "Slot committed");
        self.slot_changed(slot, Some(id));
        self.sync_stats();
        Ok(())
    }

    /// Empty one slot; clearing the child is a full reset
    pub fn clear_slot(&mut self, slot: SlotKey) -> bool {
        if slot.is_child() {
            if !self.store.state().has_child() {
                return false;
            }
            self.reset();
            return true;
        }
        if !self.store.clear_slot(slot) {
            return false;
        }
        info!(slot = %slot, "Slot cleared");
        self.slot_changed(slot, None);
        self.sync_stats();
        true
    }

    /// Clear all slots, the candidate pool and the derived stats
    pub fn reset(&mut self) {
        self.store.reset();
        self.last_stats_error = None;
        info!("Lineage reset");
        self.events.emit_lossy(LineageEvent::LineageReset {
            timestamp: Utc::now(),
        });
        self.sync_stats();
    }

    pub(super) fn slot_changed(&self, slot: SlotKey, id: Option<String>) {
        self.events.emit_lossy(LineageEvent::SlotChanged {
            slot,
            id,
            timestamp: Utc::now(),
        });
    }
}
