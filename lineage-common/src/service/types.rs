//! Reply records for the scoring service
//!
//! The service's JSON is loosely shaped: numbers may be missing, null or
//! of the wrong type, and lineages may be short. Everything here decodes
//! leniently, defaulting numbers to zero and lineage entries to blanks, so
//! no undefined value ever reaches arithmetic.

use crate::slots::{SlotKey, WireLineage};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Candidate id → affinity score with the current child
pub type AffinityScoreMap = HashMap<String, f64>;

/// Stats or optimizer reply
///
/// `lineage` echoes the request for stats replies and carries the
/// suggestion for optimizer replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
    #[serde(rename = "P1", default, deserialize_with = "lenient_number")]
    pub p1: f64,
    #[serde(rename = "P2", default, deserialize_with = "lenient_number")]
    pub p2: f64,
    #[serde(rename = "GP1_1", default, deserialize_with = "lenient_number")]
    pub gp1_1: f64,
    #[serde(rename = "GP1_2", default, deserialize_with = "lenient_number")]
    pub gp1_2: f64,
    #[serde(rename = "GP2_1", default, deserialize_with = "lenient_number")]
    pub gp2_1: f64,
    #[serde(rename = "GP2_2", default, deserialize_with = "lenient_number")]
    pub gp2_2: f64,
    #[serde(rename = "Total compatibility", default, deserialize_with = "lenient_number")]
    pub total_compatibility: f64,
    #[serde(rename = "Displayed affinity", default, deserialize_with = "lenient_number")]
    pub displayed_affinity: f64,
    #[serde(default, deserialize_with = "lenient_lineage")]
    pub lineage: WireLineage,
}

impl LineageReport {
    /// Per-pair score attributed to `slot`; the child has none
    pub fn slot_score(&self, slot: SlotKey) -> Option<f64> {
        match slot {
            SlotKey::Child => None,
            SlotKey::P1 => Some(self.p1),
            SlotKey::P2 => Some(self.p2),
            SlotKey::Gp1 => Some(self.gp1_1),
            SlotKey::Gp2 => Some(self.gp1_2),
            SlotKey::Gp3 => Some(self.gp2_1),
            SlotKey::Gp4 => Some(self.gp2_2),
        }
    }
}

/// Optimizer replies carry either a report or `{"error": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OptimizeReply {
    Rejected { error: String },
    Report(LineageReport),
}

/// Decode an affinity map, keeping only finite numeric scores
pub(crate) fn affinity_from_json(raw: HashMap<String, Value>) -> AffinityScoreMap {
    raw.into_iter()
        .map(|(id, score)| (id, as_finite(&score)))
        .collect()
}

fn as_finite(value: &Value) -> f64 {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(as_finite).unwrap_or(0.0))
}

fn lenient_lineage<'de, D>(deserializer: D) -> Result<WireLineage, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut lineage = WireLineage::default();
    if let Some(Value::Array(entries)) = value {
        for (slot, entry) in lineage.iter_mut().zip(entries) {
            if let Value::String(name) = entry {
                *slot = name;
            }
        }
    }
    Ok(lineage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_decodes_service_keys() {
        let body = json!({
            "P1": 160, "P2": 40, "GP1_1": 10, "GP1_2": 0,
            "GP2_1": 5, "GP2_2": 0,
            "Total compatibility": 260, "Displayed affinity": 215,
            "lineage": ["A", "B", "C", "D", "", "F", "G"]
        });
        let report: LineageReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.p1, 160.0);
        assert_eq!(report.slot_score(SlotKey::Gp3), Some(5.0));
        assert_eq!(report.slot_score(SlotKey::Child), None);
        assert_eq!(report.total_compatibility, 260.0);
        assert_eq!(report.displayed_affinity, 215.0);
        assert_eq!(report.lineage[4], "");
        assert_eq!(report.lineage[6], "G");
    }

    #[test]
    fn test_report_defaults_missing_and_non_numeric_fields() {
        let body = json!({ "P1": "lots", "P2": null, "lineage": ["A", 3] });
        let report: LineageReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.p1, 0.0);
        assert_eq!(report.p2, 0.0);
        assert_eq!(report.gp2_2, 0.0);
        assert_eq!(report.total_compatibility, 0.0);
        assert_eq!(report.lineage, ["A", "", "", "", "", "", ""].map(String::from));
    }

    #[test]
    fn test_optimize_reply_distinguishes_error_body() {
        let rejected: OptimizeReply =
            serde_json::from_value(json!({ "error": "Not enough characters available" })).unwrap();
        assert!(matches!(rejected, OptimizeReply::Rejected { .. }));

        let report: OptimizeReply =
            serde_json::from_value(json!({ "P1": 1, "lineage": ["A"] })).unwrap();
        assert!(matches!(report, OptimizeReply::Report(_)));
    }

    #[test]
    fn test_affinity_map_drops_to_zero_for_garbage() {
        let raw: HashMap<String, Value> =
            serde_json::from_value(json!({ "B": 120, "C": "n/a", "D": 7.5 })).unwrap();
        let map = affinity_from_json(raw);
        assert_eq!(map["B"], 120.0);
        assert_eq!(map["C"], 0.0);
        assert_eq!(map["D"], 7.5);
    }
}
