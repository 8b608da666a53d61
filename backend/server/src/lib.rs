//! Documentation of the KOL marketplace contact-request backend.
//!
//! Businesses run campaigns, influencers (KOLs) get contacted about them. This service tracks
//! which business reached out to which KOL for which campaign, and whether that outreach was
//! later withdrawn.
//!
//!
//!
//! # General Infrastructure
//! - Frontend talks JSON to this server only
//! - Server talks to one store, picked at startup (`STORE_BACKEND`)
//! - `memory` for local runs, `redis` for deployments
//! - No auth at this layer, the frontend session decides who `userId` is
//!
//!
//!
//! # Routes
//!
//! | Route | Method | Handler |
//! |---|---|---|
//! | `/api/contact-requests` | POST | [`routes::intake_handler`] |
//! | `/api/contact-requests` | GET | [`routes::list_handler`] |
//! | `/api/contact-requests/{id}` | GET | [`routes::lookup_handler`] |
//! | `/api/contact-requests/{id}/withdraw` | POST | [`routes::withdraw_handler`] |
//! | `/health` | GET | [`routes::health_handler`] |
//!
//! Payload shapes live in [`payloads`].
//!
//!
//!
//! # Failure Policy
//!
//! **Goal**: never interrupt the business user's flow because the store hiccuped.
//!
//! - Intake/withdraw: store errors are logged and the caller still gets `success: true`
//! - List: store errors become an empty list
//! - Lookup/health: report the failure, nothing to hide there
//! - Flip `DEGRADE_ON_STORAGE_ERROR=false` to surface store errors as 500s instead
//! - Unexpected errors (e.g. unparsable JSON) are 500 with a generic message, details only in logs
//!
//!
//!
//! # Notes
//!
//! ## Withdrawal is not sticky
//! Sending a contact request again for the same (campaign, KOL) pair overwrites the record and
//! puts it back to `in_progress`, even if it was withdrawn. Kept on purpose until product decides
//! otherwise.
//!
//! ## Composite key
//! Records are keyed by `(campaignId, kolId)`. The `campaignId:kolId` string only exists at the
//! HTTP boundary. `:` and `%` in the campaign half are percent-escaped (`a:b` + `k` is `a%3Ab:k`),
//! so the wire id always splits back into the same pair. Put it in a path URL-encoded, since the
//! path is decoded once before parsing.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! `````
//!
//! Run locally with the in-memory store.
//! ```sh
//! RUST_LOG=info cargo run -p backend
//! ```
//!
//! Run against Redis.
//! ```sh
//! STORE_BACKEND=redis REDIS_URL=redis://localhost:6379 RUST_LOG=info cargo run -p backend
//! ```
//!
//! Smoke test a running server.
//! ```sh
//! cargo run -p tester -- --base-url http://localhost:1111
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod payloads;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use routes::{health_handler, intake_handler, list_handler, lookup_handler, withdraw_handler};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(state.config.cors_max_age_secs));

    Router::new()
        .route(
            "/api/contact-requests",
            post(intake_handler).get(list_handler),
        )
        .route("/api/contact-requests/{id}", get(lookup_handler))
        .route("/api/contact-requests/{id}/withdraw", post(withdraw_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await.expect("Store misconfigured!");
    info!("Using {} store", state.store.kind());

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
