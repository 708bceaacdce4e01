//! Slot keys, selections and the seven-slot lineage state
//!
//! Wire order for every 7-element lineage exchanged with the scoring
//! service is `[child, p1, p2, gp1, gp2, gp3, gp4]`. `gp1`/`gp2` sit on
//! parent 1's side, `gp3`/`gp4` on parent 2's side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of slots in a lineage
pub const SLOT_COUNT: usize = 7;

/// A 7-element lineage of names, empty strings for unfilled slots
pub type WireLineage = [String; SLOT_COUNT];

/// One of the seven fixed lineage positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKey {
    Child,
    P1,
    P2,
    Gp1,
    Gp2,
    Gp3,
    Gp4,
}

impl SlotKey {
    /// All slots in wire order
    pub const ALL: [SlotKey; SLOT_COUNT] = [
        SlotKey::Child,
        SlotKey::P1,
        SlotKey::P2,
        SlotKey::Gp1,
        SlotKey::Gp2,
        SlotKey::Gp3,
        SlotKey::Gp4,
    ];

    /// The six slots gated behind the child
    pub const ANCESTORS: [SlotKey; SLOT_COUNT - 1] = [
        SlotKey::P1,
        SlotKey::P2,
        SlotKey::Gp1,
        SlotKey::Gp2,
        SlotKey::Gp3,
        SlotKey::Gp4,
    ];

    /// Position in the wire lineage
    pub fn index(self) -> usize {
        match self {
            SlotKey::Child => 0,
            SlotKey::P1 => 1,
            SlotKey::P2 => 2,
            SlotKey::Gp1 => 3,
            SlotKey::Gp2 => 4,
            SlotKey::Gp3 => 5,
            SlotKey::Gp4 => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlotKey::Child => "child",
            SlotKey::P1 => "p1",
            SlotKey::P2 => "p2",
            SlotKey::Gp1 => "gp1",
            SlotKey::Gp2 => "gp2",
            SlotKey::Gp3 => "gp3",
            SlotKey::Gp4 => "gp4",
        }
    }

    /// Human-facing label
    pub fn label(self) -> &'static str {
        match self {
            SlotKey::Child => "Child",
            SlotKey::P1 => "Parent 1",
            SlotKey::P2 => "Parent 2",
            SlotKey::Gp1 => "GP 1",
            SlotKey::Gp2 => "GP 2",
            SlotKey::Gp3 => "GP 3",
            SlotKey::Gp4 => "GP 4",
        }
    }

    pub fn is_child(self) -> bool {
        self == SlotKey::Child
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized slot name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown slot: {0}")]
pub struct UnknownSlot(pub String);

impl FromStr for SlotKey {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SlotKey::ALL
            .into_iter()
            .find(|slot| slot.as_str() == needle)
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// A committed character choice
///
/// Two selections are equal iff their `id`s match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Stable identity (the roster name for names-only rosters)
    pub id: String,
    pub name: String,
    /// Sprite path handed to the presentation layer
    pub image_ref: String,
}

impl Selection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_ref: image_ref.into(),
        }
    }

    /// Build a selection from a roster name; the name doubles as the id
    pub fn from_roster_name(name: &str, sprite_base: &str) -> Self {
        let image_ref = format!("{}/{}.png", sprite_base.trim_end_matches('/'), name);
        Self::new(name, name, image_ref)
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Selection {}

/// Mapping from every slot to `Selection | empty`
///
/// All seven keys are always present; empty is a value, not an absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageState {
    slots: [Option<Selection>; SLOT_COUNT],
}

impl LineageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotKey) -> Option<&Selection> {
        self.slots[slot.index()].as_ref()
    }

    pub fn id(&self, slot: SlotKey) -> Option<&str> {
        self.get(slot).map(|s| s.id.as_str())
    }

    pub fn is_filled(&self, slot: SlotKey) -> bool {
        self.slots[slot.index()].is_some()
    }

    pub fn has_child(&self) -> bool {
        self.is_filled(SlotKey::Child)
    }

    /// True when no slot holds a selection
    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Raw slot write; invariant checks live in the store
    pub(crate) fn put(&mut self, slot: SlotKey, selection: Option<Selection>) {
        self.slots[slot.index()] = selection;
    }

    /// Filled slots in wire order
    pub fn filled(&self) -> impl Iterator<Item = (SlotKey, &Selection)> {
        SlotKey::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|sel| (slot, sel)))
    }

    /// Names in wire order, empty strings for unfilled slots
    pub fn names(&self) -> WireLineage {
        SlotKey::ALL.map(|slot| {
            self.get(slot)
                .map(|sel| sel.name.clone())
                .unwrap_or_default()
        })
    }

    /// Child gating plus same-side uniqueness across all six ancestors
    pub fn satisfies_invariants(&self) -> bool {
        if !self.has_child() && SlotKey::ANCESTORS.iter().any(|s| self.is_filled(*s)) {
            return false;
        }
        SlotKey::ANCESTORS.iter().all(|slot| match self.id(*slot) {
            Some(id) => !crate::constraints::disallowed_ids(*slot, self).contains(id),
            None => true,
        })
    }
}
