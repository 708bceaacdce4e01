//! Plain-text rendering of the lineage, bubbles and picker lists

use lineage_common::session::{CandidateOption, PickerSession, PickerTarget};
use lineage_common::{DisplayStats, SlotKey, SlotStore};
use std::fmt::Write;

/// Slot table with bubbles, followed by the aggregate stats
pub fn lineage(store: &SlotStore) -> String {
    let mut out = String::new();
    for slot in SlotKey::ALL {
        let name = store
            .get(slot)
            .map(|s| s.name.as_str())
            .unwrap_or("-");
        match store.bubble(slot) {
            Some(bubble) => {
                let _ = writeln!(
                    out,
                    "{:<9} {:<24} [{} {}]",
                    slot.label(),
                    name,
                    bubble.label,
                    bubble.color
                );
            }
            None => {
                let _ = writeln!(out, "{:<9} {}", slot.label(), name);
            }
        }
    }
    out.push_str(&stats(store.display_stats()));
    let pool = store.candidate_pool();
    if !pool.is_empty() {
        let _ = write!(out, "\nCandidate pool ({}): ", pool.len());
        out.push_str(&pool.iter().cloned().collect::<Vec<_>>().join(", "));
    }
    out
}

pub fn stats(stats: &DisplayStats) -> String {
    format!(
        "Displayed affinity: {:.0}   Total compatibility: {:.0}",
        stats.displayed_affinity, stats.total_compatibility
    )
}

/// Picker header plus the rows matching `query`
pub fn picker(picker: &PickerSession, query: &str) -> String {
    let title = match picker.target() {
        PickerTarget::Slot(slot) => format!("Pick {}", slot.label()),
        PickerTarget::CandidatePool => {
            format!("Candidate pool ({} selected)", picker.selected_count())
        }
    };

    let mut out = title;
    if !query.trim().is_empty() {
        let _ = write!(out, " matching '{}'", query.trim());
    }
    out.push('\n');

    if picker.fetch_failed() {
        out.push_str("  Could not load candidates; 'back' to close");
        return out;
    }

    let visible = picker.visible(query);
    if visible.is_empty() {
        out.push_str("  No matches");
        return out;
    }
    for option in visible {
        out.push_str(&option_row(option, picker.is_selected(&option.selection.id)));
        out.push('\n');
    }
    out.push_str("'pick'/'toggle' a name, then 'ok'");
    out
}

pub fn option_row(option: &CandidateOption, selected: bool) -> String {
    let mark = if selected { "[x]" } else { "[ ]" };
    match option.score {
        Some(score) => format!("  {} {:<24} {:>6.0}", mark, option.selection.name, score),
        None => format!("  {} {}", mark, option.selection.name),
    }
}
