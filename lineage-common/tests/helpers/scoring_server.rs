//! Stub scoring server on an ephemeral port
//!
//! Serves the four scoring endpoints from a fixed roster with the reply
//! shapes of the scoring server, plus a few deliberately broken routes
//! for error-path tests.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;

pub struct ScoringServer {
    addr: SocketAddr,
}

impl ScoringServer {
    /// Start the well-behaved server
    pub async fn start() -> Self {
        let router = Router::new()
            .route("/characters", get(characters))
            .route("/affinity", post(affinity))
            .route("/lineage_stats", post(lineage_stats))
            .route("/optimize", post(optimize));
        Self::serve(router).await
    }

    /// Start a server whose every route misbehaves
    pub async fn start_broken() -> Self {
        let router = Router::new()
            .route("/characters", get(|| async { "not json" }))
            .route(
                "/lineage_stats",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": "exactly 7 character names are required" })),
                    )
                }),
            );
        Self::serve(router).await
    }

    async fn serve(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        Self { addr }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn characters() -> impl IntoResponse {
    Json(json!(["Gold Ship", "Special Week", "Vodka"]))
}

async fn affinity(Json(body): Json<Value>) -> impl IntoResponse {
    match body["character_name"].as_str() {
        Some("Special Week") => Json(json!({ "Gold Ship": 150, "Vodka": null })),
        _ => Json(json!({})),
    }
}

async fn lineage_stats(Json(body): Json<Value>) -> impl IntoResponse {
    let lineage = body["lineage"].clone();
    let p1 = if lineage[1] == "Gold Ship" { 150 } else { 0 };
    Json(json!({
        "P1": p1,
        "P2": 0,
        "GP1_1": 0,
        "GP1_2": 0,
        "GP2_1": 0,
        "GP2_2": 0,
        "Total compatibility": p1,
        "Displayed affinity": p1,
        "lineage": lineage,
    }))
}

async fn optimize(Json(body): Json<Value>) -> impl IntoResponse {
    let pool = body["available_names"].as_array().cloned().unwrap_or_default();
    if pool.len() < 2 {
        return Json(json!({ "error": "Not enough characters available" }));
    }
    let child = body["lineage_names"][0].clone();
    Json(json!({
        "P1": 150,
        "P2": 0,
        "GP1_1": 0,
        "GP1_2": 0,
        "GP2_1": 0,
        "GP2_2": 0,
        "Total compatibility": 150,
        "Displayed affinity": 150,
        "lineage": [child, pool[0], pool[1], "", "", "", ""],
    }))
}
