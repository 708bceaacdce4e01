//! Generation-tagged stats sync
//!
//! Every committed change issues one stats request tagged with the next
//! generation. A reply is applied only if its generation is still the
//! latest issued; anything older is dropped, success or failure. Clearing
//! the child advances the generation too, so replies for the old lineage
//! cannot resurrect stats after a reset.

use super::core::LineageSession;
use crate::events::LineageEvent;
use crate::service::{FetchError, LineageReport, ScoringService};
use crate::store::DisplayStats;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one stats request
#[derive(Debug)]
pub struct StatsReply {
    pub generation: u64,
    pub result: Result<LineageReport, FetchError>,
}

#[derive(Debug, Default)]
pub(crate) struct GenerationCounter {
    latest: u64,
}

impl GenerationCounter {
    pub(crate) fn advance(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub(crate) fn latest(&self) -> u64 {
        self.latest
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

impl<S: ScoringService + 'static> LineageSession<S> {
    /// Issue a stats request for the current lineage
    ///
    /// Returns the request's generation, or `None` when there is no child
    /// (display stats are zeroed instead).
    pub fn sync_stats(&mut self) -> Option<u64> {
        let generation = self.generations.advance();

        if !self.store.state().has_child() {
            self.store.clear_display_stats();
            debug!(generation, "No child selected, stats cleared");
            return None;
        }

        let lineage = self.store.names();
        let service = Arc::clone(&self.service);
        let tx = self.stats_tx.clone();
        self.stats_in_flight += 1;
        debug!(generation, "Issuing stats request");

        let request = tokio::spawn(async move { service.lineage_stats(&lineage).await });
        tokio::spawn(async move {
            // A panicking request still answers, or the in-flight count never drains
            let result = match request.await {
                Ok(result) => result,
                Err(e) => Err(FetchError::TaskFailed(e.to_string())),
            };
            // Receiver lives as long as the session
            let _ = tx.send(StatsReply { generation, result });
        });

        Some(generation)
    }

    /// Apply a reply if it is the latest; returns whether stats changed
    pub fn apply_stats_reply(&mut self, reply: StatsReply) -> bool {
        if !self.generations.is_current(reply.generation) {
            debug!(
                generation = reply.generation,
                latest = self.generations.latest(),
                "Discarding stale stats reply"
            );
            return false;
        }

        match reply.result {
            Ok(report) => {
                self.install_stats(reply.generation, &report);
                true
            }
            Err(e) => {
                warn!(generation = reply.generation, error = %e, "Stats sync failed");
                self.events.emit_lossy(LineageEvent::StatsSyncFailed {
                    generation: reply.generation,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.last_stats_error = Some(e);
                false
            }
        }
    }

    /// Next reply from any in-flight request; `None` when nothing is pending
    pub async fn next_stats_reply(&mut self) -> Option<StatsReply> {
        if self.stats_in_flight == 0 {
            return None;
        }
        let reply = self.stats_rx.recv().await;
        if reply.is_some() {
            self.stats_in_flight -= 1;
        }
        reply
    }

    /// Wait for every in-flight request and apply what is still current
    pub async fn settle_stats(&mut self) {
        while let Some(reply) = self.next_stats_reply().await {
            self.apply_stats_reply(reply);
        }
    }

    pub fn stats_generation(&self) -> u64 {
        self.generations.latest()
    }

    pub fn stats_in_flight(&self) -> usize {
        self.stats_in_flight
    }

    /// Failure of the latest stats request, cleared by the next success
    pub fn last_stats_error(&self) -> Option<&FetchError> {
        self.last_stats_error.as_ref()
    }

    /// Take stats from a report that already describes the committed
    /// lineage, superseding any in-flight request
    pub(super) fn apply_report_directly(&mut self, report: &LineageReport) {
        let generation = self.generations.advance();
        self.install_stats(generation, report);
    }

    fn install_stats(&mut self, generation: u64, report: &LineageReport) {
        let stats = DisplayStats::from(report);
        info!(
            generation,
            displayed = stats.displayed_affinity,
            total = stats.total_compatibility,
            "Stats applied"
        );
        self.events.emit_lossy(LineageEvent::StatsApplied {
            generation,
            displayed_affinity: stats.displayed_affinity,
            total_compatibility: stats.total_compatibility,
            timestamp: Utc::now(),
        });
        self.store.set_display_stats(stats);
        self.last_stats_error = None;
    }
}
