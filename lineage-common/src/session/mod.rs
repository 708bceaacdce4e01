//! Lineage session - the single owner of the composition state
//!
//! **Module Structure:**
//! - `core.rs`: Construction, snapshots, direct slot mutations
//! - `picker.rs`: Picker session state machine and candidate ranking
//! - `stats.rs`: Generation-tagged stats sync
//! - `recommend.rs`: Optimizer request and empty-slot merge
//!
//! Every mutation goes through `&mut LineageSession`, so there is no
//! parallel mutation of the lineage. Network calls either run inline
//! (pickers, recommend) or as spawned tasks whose replies come back over a
//! channel and are applied by the owner (stats sync).

mod core;
mod picker;
mod recommend;
mod stats;

pub use self::core::LineageSession;
pub use crate::events::PickerTarget;
pub use picker::{rank_by_affinity, CandidateOption, PickerPhase, PickerSession};
pub use recommend::{merge_suggestion, MergeOutcome};
pub use stats::StatsReply;
