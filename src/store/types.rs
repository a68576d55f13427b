use crate::prediction::{PredictionRequest, PredictionResponse, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one prediction event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub prediction_id: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl PredictionLogEntry {
    pub fn from_exchange(request: &PredictionRequest, response: &PredictionResponse) -> Self {
        Self {
            prediction_id: response.prediction_id.clone(),
            text: request.text.clone(),
            sentiment: response.sentiment,
            confidence: response.confidence,
            timestamp: response.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    pub total_predictions: u64,
    pub positive_ratio: f64,
    pub avg_confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl PredictionMetrics {
    pub fn from_totals(total: u64, positive: u64, confidence_sum: f64) -> Self {
        let (positive_ratio, avg_confidence) = if total > 0 {
            (positive as f64 / total as f64, confidence_sum / total as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            total_predictions: total,
            positive_ratio,
            avg_confidence,
            timestamp: Utc::now(),
        }
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a PredictionLogEntry>) -> Self {
        let (total, positive, confidence_sum) = totals(entries);
        Self::from_totals(total, positive, confidence_sum)
    }
}

/// Count, positive count and confidence sum over a set of entries.
pub(crate) fn totals<'a>(
    entries: impl IntoIterator<Item = &'a PredictionLogEntry>,
) -> (u64, u64, f64) {
    entries
        .into_iter()
        .fold((0, 0, 0.0), |(total, positive, sum), entry| {
            let is_positive = u64::from(entry.sentiment == Sentiment::Positive);
            (total + 1, positive + is_positive, sum + entry.confidence)
        })
}
