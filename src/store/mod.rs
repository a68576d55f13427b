mod storage;
mod types;

pub use storage::{DEFAULT_FALLBACK_CAPACITY, PredictionLog, PredictionStore};
pub use types::{PredictionLogEntry, PredictionMetrics};
