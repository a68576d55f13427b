use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            other => Err(crate::Error::internal(format!("Unknown sentiment: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
    #[serde(default)]
    pub model_version: Option<String>,
}

impl PredictionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction_id: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}
