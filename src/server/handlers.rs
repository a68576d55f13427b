use super::{
    auth::AuthenticatedUser,
    types::{ActuatorHealth, ActuatorInfo, ErrorResponse},
};
use crate::{
    Error,
    config::SecurityConfig,
    prediction::{HealthStatus, ModelStatus, PredictionRequest, PredictionResponse},
    service::{self, PredictionService},
    store::PredictionMetrics,
};
use axum::{Extension, extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use tracing::{error, info, warn};

type HandlerError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    pub fn new(service: PredictionService, security: SecurityConfig) -> Self {
        Self {
            service: Arc::new(service),
            security: Arc::new(security),
        }
    }
}

fn error_response(e: Error) -> HandlerError {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

pub async fn predict(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, HandlerError> {
    info!(
        "Received prediction request from {} ({} chars)",
        user.username,
        request.text.chars().count()
    );

    state.service.handle_predict(request).map(Json).map_err(|e| {
        warn!("Prediction request rejected: {}", e);
        error_response(e)
    })
}

pub async fn health() -> Json<HealthStatus> {
    Json(service::health())
}

pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.service.handle_status())
}

pub async fn prediction_metrics(
    State(state): State<AppState>,
) -> Result<Json<PredictionMetrics>, HandlerError> {
    state
        .service
        .prediction_summary()
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to summarize predictions: {}", e);
            error_response(e)
        })
}

pub async fn actuator_health() -> Json<ActuatorHealth> {
    Json(ActuatorHealth { status: "UP" })
}

pub async fn actuator_info(State(state): State<AppState>) -> Json<ActuatorInfo> {
    Json(ActuatorInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        model_version: state.service.model_version().to_string(),
    })
}
