use async_trait::async_trait;
use model_serving::{
    Error, Result,
    store::{PredictionLog, PredictionLogEntry, PredictionMetrics},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tokio::sync::Notify;

/// Mock prediction log that records every append
#[derive(Debug, Default)]
pub struct MockPredictionLog {
    pub entries: Arc<Mutex<Vec<PredictionLogEntry>>>,
    pub attempts: AtomicUsize,
    pub error: Option<String>,
    notify: Notify,
}

impl MockPredictionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every append fails with the given message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn get_entries(&self) -> Vec<PredictionLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Wait until at least `count` appends were attempted.
    pub async fn wait_for_attempts(&self, count: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.attempts() >= count {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| {
                panic!(
                    "expected {} append attempts, saw {}",
                    count,
                    self.attempts()
                )
            });
    }
}

#[async_trait]
impl PredictionLog for MockPredictionLog {
    async fn append(&self, entry: PredictionLogEntry) -> Result<()> {
        let result = match self.error {
            Some(ref error) => Err(Error::internal(error.clone())),
            None => {
                self.entries.lock().unwrap().push(entry);
                Ok(())
            }
        };

        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
        result
    }

    async fn summary(&self) -> Result<PredictionMetrics> {
        if let Some(ref error) = self.error {
            return Err(Error::internal(error.clone()));
        }
        Ok(PredictionMetrics::from_entries(
            self.entries.lock().unwrap().iter(),
        ))
    }
}

/// Prediction log whose writes never complete
#[derive(Debug, Default)]
pub struct StalledPredictionLog {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl PredictionLog for StalledPredictionLog {
    async fn append(&self, _entry: PredictionLogEntry) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn summary(&self) -> Result<PredictionMetrics> {
        Ok(PredictionMetrics::from_totals(0, 0, 0.0))
    }
}
