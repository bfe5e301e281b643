//! OpenGRC Portal API Backend
//!
//! Axum backend for the GRC management console. Serves the asset, risk,
//! SOA, and treatment-plan registers plus dashboards and exports over
//! JSON; all state is in-memory, seeded with the demo datasets.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grc_registers::{seed, GrcEngine};

mod error;
mod models;
mod routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: GrcEngine,
}

/// Build the portal router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/assets", routes::assets::router())
        .nest("/api/risks", routes::risks::router())
        .nest("/api/soa", routes::soa::router())
        .nest("/api/plans", routes::treatment::router())
        .nest("/api/dashboard", routes::dashboard::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine = GrcEngine::new();
    seed::seed_demo_data(&engine).expect("failed to seed demo data");

    let app = build_router(AppState { engine });

    let addr = std::env::var("GRC_PORTAL_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    tracing::info!("Portal API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
