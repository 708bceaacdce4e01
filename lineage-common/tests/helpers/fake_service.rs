//! In-memory scoring service
//!
//! Scores follow the scoring server's formula: pair affinities between
//! the child and each parent and between the two parents, plus triple
//! affinities for each (child, parent, grandparent) line. Blank names
//! score zero. Stats replies for a given lineage can be held back with
//! [`FakeScoringService::gate_stats`] to force out-of-order delivery.

use async_trait::async_trait;
use lineage_common::service::{AffinityScoreMap, FetchError, LineageReport, ScoringService};
use lineage_common::slots::WireLineage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct FakeScoringService {
    roster: Vec<String>,
    pairs: HashMap<(String, String), f64>,
    triples: HashMap<(String, String, String), f64>,
    suggestion: Mutex<Option<WireLineage>>,
    gates: Mutex<HashMap<WireLineage, oneshot::Receiver<()>>>,
    last_pool: Mutex<Vec<String>>,

    pub fail_roster: AtomicBool,
    pub fail_affinity: AtomicBool,
    pub fail_stats: AtomicBool,
    pub fail_optimize: AtomicBool,
    pub panic_stats: AtomicBool,

    pub affinity_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub optimize_calls: AtomicUsize,
}

impl FakeScoringService {
    pub fn new(roster: &[&str]) -> Self {
        Self {
            roster: roster.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Symmetric pair affinity
    pub fn with_pair(mut self, a: &str, b: &str, score: f64) -> Self {
        self.pairs.insert(Self::pair_key(a, b), score);
        self
    }

    /// Affinity of the (child, parent, grandparent) line
    pub fn with_triple(mut self, child: &str, parent: &str, grandparent: &str, score: f64) -> Self {
        self.triples.insert(
            (child.to_string(), parent.to_string(), grandparent.to_string()),
            score,
        );
        self
    }

    /// Lineage returned by `optimize`
    pub fn with_suggestion(self, names: [&str; 7]) -> Self {
        self.set_suggestion(names);
        self
    }

    pub fn set_suggestion(&self, names: [&str; 7]) {
        *self.suggestion.lock().unwrap() = Some(names.map(str::to_string));
    }

    /// Hold back the stats reply for `lineage` until the sender fires
    pub fn gate_stats(&self, lineage: [&str; 7]) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(lineage.map(str::to_string), rx);
        tx
    }

    pub fn last_pool(&self) -> Vec<String> {
        self.last_pool.lock().unwrap().clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    fn pair(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        self.pairs.get(&Self::pair_key(a, b)).copied().unwrap_or(0.0)
    }

    fn triple(&self, child: &str, parent: &str, grandparent: &str) -> f64 {
        if child.is_empty() || parent.is_empty() || grandparent.is_empty() {
            return 0.0;
        }
        self.triples
            .get(&(child.to_string(), parent.to_string(), grandparent.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn score(&self, lineage: &WireLineage) -> LineageReport {
        let [child, p1, p2, gp1_1, gp1_2, gp2_1, gp2_2] = lineage;
        let aff_p1 = self.pair(child, p1);
        let aff_p2 = self.pair(child, p2);
        let aff_pp = self.pair(p1, p2);
        let i11 = self.triple(child, p1, gp1_1);
        let i12 = self.triple(child, p1, gp1_2);
        let i21 = self.triple(child, p2, gp2_1);
        let i22 = self.triple(child, p2, gp2_2);
        let grand = i11 + i12 + i21 + i22;

        LineageReport {
            p1: aff_p1 + i11 + i12 + aff_pp,
            p2: aff_p2 + i21 + i22 + aff_pp,
            gp1_1: i11,
            gp1_2: i12,
            gp2_1: i21,
            gp2_2: i22,
            total_compatibility: aff_p1 + aff_p2 + 2.0 * (aff_pp + grand),
            displayed_affinity: aff_p1 + aff_p2 + aff_pp + grand,
            lineage: lineage.clone(),
        }
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), FetchError> {
        if flag.load(Ordering::SeqCst) {
            Err(FetchError::NetworkError(format!("{} unavailable", what)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ScoringService for FakeScoringService {
    async fn list_characters(&self) -> Result<Vec<String>, FetchError> {
        Self::check(&self.fail_roster, "roster")?;
        Ok(self.roster.clone())
    }

    async fn affinity(&self, child_id: &str) -> Result<AffinityScoreMap, FetchError> {
        self.affinity_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_affinity, "affinity")?;
        Ok(self
            .roster
            .iter()
            .filter(|name| name.as_str() != child_id)
            .map(|name| (name.clone(), self.pair(child_id, name)))
            .collect())
    }

    async fn lineage_stats(&self, lineage: &WireLineage) -> Result<LineageReport, FetchError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(lineage);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.panic_stats.load(Ordering::SeqCst) {
            panic!("stats backend crashed");
        }
        Self::check(&self.fail_stats, "stats")?;
        Ok(self.score(lineage))
    }

    async fn optimize(
        &self,
        lineage: &WireLineage,
        candidate_pool: &[String],
    ) -> Result<LineageReport, FetchError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pool.lock().unwrap() = candidate_pool.to_vec();
        Self::check(&self.fail_optimize, "optimizer")?;
        let suggestion = self.suggestion.lock().unwrap().clone();
        match suggestion {
            Some(names) => Ok(self.score(&names)),
            None => Err(FetchError::Rejected(
                "Not enough characters available".to_string(),
            )),
        }
    }
}
