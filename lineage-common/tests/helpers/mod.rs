//! Test helpers for lineage-common integration tests
//!
//! - FakeScoringService: in-memory scoring service with failure toggles
//! - ScoringServer: axum stub of the HTTP scoring endpoints
//! - Session constructors and lineage shorthands

#![allow(dead_code)]

pub mod fake_service;
pub mod scoring_server;

pub use fake_service::FakeScoringService;
pub use scoring_server::ScoringServer;

use lineage_common::{EventBus, LineageSession, Selection};
use std::sync::Arc;

pub const SPRITES: &str = "/CharacterSprites";

/// Roster used across the session tests
pub const ROSTER: [&str; 10] = [
    "Air Groove",
    "Daiwa Scarlet",
    "Gold Ship",
    "Mejiro McQueen",
    "Oguri Cap",
    "Rice Shower",
    "Special Week",
    "Silence Suzuka",
    "Tokai Teio",
    "Vodka",
];

pub fn session_with(service: FakeScoringService) -> (LineageSession<FakeScoringService>, Arc<FakeScoringService>) {
    let service = Arc::new(service);
    let session = LineageSession::new(Arc::clone(&service), EventBus::new(64), SPRITES);
    (session, service)
}

pub fn sel(id: &str) -> Selection {
    Selection::from_roster_name(id, SPRITES)
}
