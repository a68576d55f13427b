//! Request orchestration: classify, build the response envelope, and hand the
//! event to the prediction log without letting the write affect the caller.

use crate::{
    Error, Result,
    config::Config,
    prediction::{
        HealthStatus, ModelStatus, PredictionRequest, PredictionResponse, SentimentEngine,
    },
    store::{PredictionLog, PredictionLogEntry, PredictionMetrics},
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "model-serving";

pub struct PredictionService {
    engine: SentimentEngine,
    log: Arc<dyn PredictionLog>,
    model_version: String,
    reject_empty_text: bool,
    write_timeout: Duration,
}

impl PredictionService {
    pub fn new(engine: SentimentEngine, log: Arc<dyn PredictionLog>, config: &Config) -> Self {
        Self {
            engine,
            log,
            model_version: config.model.version.clone(),
            reject_empty_text: config.model.reject_empty_text,
            write_timeout: Duration::from_millis(config.persistence.write_timeout_ms),
        }
    }

    /// Classify `request.text` and return the response envelope.
    ///
    /// The log write runs on its own task and its outcome never reaches the
    /// caller. Must be called from within a tokio runtime.
    pub fn handle_predict(&self, request: PredictionRequest) -> Result<PredictionResponse> {
        let (response, _write) = self.predict_and_dispatch(request)?;
        Ok(response)
    }

    fn predict_and_dispatch(
        &self,
        request: PredictionRequest,
    ) -> Result<(PredictionResponse, JoinHandle<()>)> {
        if self.reject_empty_text && request.text.trim().is_empty() {
            return Err(Error::invalid_request("text must not be empty"));
        }

        if let Some(ref requested) = request.model_version {
            debug!(
                "Ignoring requested model version {} (serving {})",
                requested, self.model_version
            );
        }

        let prediction_id = Uuid::new_v4().to_string();
        let (sentiment, confidence) = self.engine.classify(&request.text);
        let response = PredictionResponse {
            prediction_id,
            sentiment,
            confidence,
            timestamp: Utc::now(),
        };

        info!(
            "Prediction {}: {} ({:.3})",
            response.prediction_id, response.sentiment, response.confidence
        );

        let entry = PredictionLogEntry::from_exchange(&request, &response);
        let write = self.dispatch_log_write(entry);

        Ok((response, write))
    }

    fn dispatch_log_write(&self, entry: PredictionLogEntry) -> JoinHandle<()> {
        let log = Arc::clone(&self.log);
        let write_timeout = self.write_timeout;

        tokio::spawn(async move {
            let prediction_id = entry.prediction_id.clone();
            let outcome = match tokio::time::timeout(write_timeout, log.append(entry)).await {
                Ok(result) => result,
                Err(_) => Err(Error::WriteTimeout {
                    timeout_ms: write_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(()) => debug!("Prediction {} logged", prediction_id),
                Err(e) => warn!("Failed to log prediction {}: {}", prediction_id, e),
            }
        })
    }

    pub fn handle_status(&self) -> ModelStatus {
        ModelStatus {
            model_loaded: true,
            last_updated: Utc::now(),
            version: self.model_version.clone(),
        }
    }

    pub async fn prediction_summary(&self) -> Result<PredictionMetrics> {
        self.log.summary().await
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

pub fn health() -> HealthStatus {
    HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
    }
}
