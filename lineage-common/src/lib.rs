//! # Lineage Common Library
//!
//! Composition core for the seven-slot breeding lineage calculator:
//! - Slot keys, selections and the lineage state (`slots`)
//! - Same-side uniqueness rules (`constraints`)
//! - Affinity score → multiplier → bubble color mapping (`affinity`)
//! - The owned slot store with its derived caches (`store`)
//! - Remote scoring service contract and HTTP client (`service`)
//! - Picker sessions, stats sync and recommendation merging (`session`)
//! - Configuration loading and the event bus

pub mod affinity;
pub mod config;
pub mod constraints;
pub mod error;
pub mod events;
pub mod service;
pub mod session;
pub mod slots;
pub mod store;

pub use affinity::{Bubble, Rgb};
pub use error::{Error, Result};
pub use events::{EventBus, LineageEvent};
pub use service::{FetchError, HttpScoringClient, LineageReport, ScoringService};
pub use session::{LineageSession, PickerPhase, PickerSession, PickerTarget};
pub use slots::{LineageState, Selection, SlotKey};
pub use store::{DisplayStats, SlotStore};
