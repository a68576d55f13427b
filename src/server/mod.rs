pub mod auth;
pub mod csrf;
pub mod handlers;
mod types;

pub use handlers::AppState;
pub use types::ErrorResponse;

use crate::{
    Result,
    config::Config,
    prediction::SentimentEngine,
    service::PredictionService,
    store::PredictionStore,
};
use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/actuator/health", get(handlers::actuator_health))
        .route("/actuator/info", get(handlers::actuator_info));

    let protected = Router::new()
        .route("/api/v1/predict", post(handlers::predict))
        .route("/api/v1/model/status", get(handlers::model_status))
        .route("/api/v1/metrics/predictions", get(handlers::prediction_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf::csrf_protection,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // Initialize prediction log
    let store = PredictionStore::with_fallback_capacity(
        &config.server.database_path,
        config.persistence.fallback_capacity,
    )
    .await?;
    if !store.is_persistent() {
        warn!("Predictions will only be kept in memory");
    }

    let service = PredictionService::new(SentimentEngine::default(), Arc::new(store), &config);

    if config.security.users.is_empty() {
        warn!("No users configured; authenticated endpoints will reject every request");
    }

    let app = build_router(AppState::new(service, config.security.clone()));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
