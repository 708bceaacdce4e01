//! Same-side uniqueness rules
//!
//! A character may not sit in two slots that are horizontally paired
//! (p1/p2, gp1/gp2, gp3/gp4) or lineage-adjacent on the same side
//! (p1 above gp1/gp2, p2 above gp3/gp4). The child is unconstrained.
//!
//! Rules are evaluated against the *current* state, never the value being
//! set, and are never cached: sibling slots can change between a picker
//! opening and its commit.

use crate::slots::{LineageState, SlotKey};
use std::collections::HashSet;

/// Slots whose selections a given slot must differ from
pub fn related_slots(slot: SlotKey) -> &'static [SlotKey] {
    match slot {
        SlotKey::Child => &[],
        SlotKey::P1 => &[SlotKey::P2],
        SlotKey::P2 => &[SlotKey::P1],
        SlotKey::Gp1 => &[SlotKey::Gp2, SlotKey::P1],
        SlotKey::Gp2 => &[SlotKey::Gp1, SlotKey::P1],
        SlotKey::Gp3 => &[SlotKey::Gp4, SlotKey::P2],
        SlotKey::Gp4 => &[SlotKey::Gp3, SlotKey::P2],
    }
}

/// Ids that may not be committed to `slot` given `state`
pub fn disallowed_ids(slot: SlotKey, state: &LineageState) -> HashSet<String> {
    related_slots(slot)
        .iter()
        .filter_map(|related| state.id(*related))
        .map(str::to_owned)
        .collect()
}

pub fn is_allowed(slot: SlotKey, id: &str, state: &LineageState) -> bool {
    !related_slots(slot)
        .iter()
        .any(|related| state.id(*related) == Some(id))
}
