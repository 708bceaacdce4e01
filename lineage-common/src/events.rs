//! Lineage events and the EventBus
//!
//! The presentation layer subscribes to these to follow picker sessions,
//! slot commits and stats updates without polling the session.

use crate::slots::SlotKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What a picker session is choosing for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerTarget {
    /// Single selection committed into one slot
    Slot(SlotKey),
    /// Multi selection confirmed into the candidate pool
    CandidatePool,
}

/// Lineage core events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LineageEvent {
    /// A picker session was requested and is loading candidates
    PickerOpenRequested {
        target: PickerTarget,
        timestamp: DateTime<Utc>,
    },

    /// Candidates are loaded; the session is open
    PickerOptionsReady {
        target: PickerTarget,
        option_count: usize,
        /// Candidate fetch failed and the list is empty
        fetch_failed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A picker session committed its selection
    PickerCommitted {
        target: PickerTarget,
        selected: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A picker session was discarded without mutating the lineage
    PickerCancelled {
        target: PickerTarget,
        timestamp: DateTime<Utc>,
    },

    /// A slot's committed selection changed
    SlotChanged {
        slot: SlotKey,
        /// New selection id (None when cleared)
        id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// All slots, the candidate pool and derived stats were cleared
    LineageReset { timestamp: DateTime<Utc> },

    /// Display stats were replaced by a stats reply
    StatsApplied {
        generation: u64,
        displayed_affinity: f64,
        total_compatibility: f64,
        timestamp: DateTime<Utc>,
    },

    /// The latest stats request failed; display stats kept their last value
    StatsSyncFailed {
        generation: u64,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An optimizer suggestion was merged into the empty slots
    RecommendationApplied {
        filled: Vec<SlotKey>,
        /// Suggested slots left empty because they broke a uniqueness rule
        rejected: Vec<SlotKey>,
        timestamp: DateTime<Utc>,
    },
}

impl LineageEvent {
    pub fn event_type(&self) -> &str {
        match self {
            LineageEvent::PickerOpenRequested { .. } => "PickerOpenRequested",
            LineageEvent::PickerOptionsReady { .. } => "PickerOptionsReady",
            LineageEvent::PickerCommitted { .. } => "PickerCommitted",
            LineageEvent::PickerCancelled { .. } => "PickerCancelled",
            LineageEvent::SlotChanged { .. } => "SlotChanged",
            LineageEvent::LineageReset { .. } => "LineageReset",
            LineageEvent::StatsApplied { .. } => "StatsApplied",
            LineageEvent::StatsSyncFailed { .. } => "StatsSyncFailed",
            LineageEvent::RecommendationApplied { .. } => "RecommendationApplied",
        }
    }
}

/// Event distribution bus
///
/// Backed by `tokio::broadcast`: publishing never blocks, subscribers that
/// fall behind observe a lag error rather than slowing the core down.
///
/// # Examples
///
/// ```
/// use lineage_common::events::{EventBus, LineageEvent};
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(LineageEvent::LineageReset {
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(LineageEvent::LineageReset { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LineageEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LineageEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; `Err` when nobody is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LineageEvent,
    ) -> Result<usize, broadcast::error::SendError<LineageEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LineageEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
