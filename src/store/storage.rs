use super::{PredictionLogEntry, PredictionMetrics, types::totals};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::SecondsFormat;
use libsql::{Builder, Connection};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};
use tracing::{debug, info, warn};

/// Entries kept in memory while the database is unavailable.
pub const DEFAULT_FALLBACK_CAPACITY: usize = 10_000;

/// Append-only sink for prediction events.
#[async_trait]
pub trait PredictionLog: Send + Sync {
    /// Record one event. Writing the same `prediction_id` again replaces it.
    async fn append(&self, entry: PredictionLogEntry) -> Result<()>;

    async fn summary(&self) -> Result<PredictionMetrics>;
}

/// In-memory entries keyed by id, oldest first write at the front.
#[derive(Default)]
struct FallbackLog {
    entries: HashMap<String, PredictionLogEntry>,
    order: VecDeque<String>,
}

impl FallbackLog {
    /// Insert or replace `entry`, then evict the oldest ids beyond `capacity`.
    fn upsert(&mut self, entry: PredictionLogEntry, capacity: usize) -> Vec<String> {
        let id = entry.prediction_id.clone();
        if self.entries.insert(id.clone(), entry).is_none() {
            self.order.push_back(id);
        }

        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted.push(oldest);
        }
        evicted
    }

    fn get(&self, prediction_id: &str) -> Option<&PredictionLogEntry> {
        self.entries.get(prediction_id)
    }
}

pub struct PredictionStore {
    conn: Option<Connection>,
    // In-memory fallback storage
    fallback: Arc<Mutex<FallbackLog>>,
    fallback_capacity: usize,
}

impl PredictionStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_fallback_capacity(db_path, DEFAULT_FALLBACK_CAPACITY).await
    }

    pub async fn with_fallback_capacity(db_path: &str, fallback_capacity: usize) -> Result<Self> {
        let mut store = Self {
            conn: None,
            fallback: Arc::new(Mutex::new(FallbackLog::default())),
            fallback_capacity: fallback_capacity.max(1),
        };

        match store.init_database(db_path).await {
            Ok(()) => {
                info!("Prediction database initialized: {}", db_path);
            }
            Err(e) => {
                warn!(
                    "Prediction database initialization failed, using in-memory fallback: {}",
                    e
                );
            }
        }

        Ok(store)
    }

    async fn init_database(&mut self, db_path: &str) -> Result<()> {
        let db = Builder::new_local(db_path).build().await?;

        // One shared connection, so ":memory:" databases survive across calls.
        let conn = db.connect()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                prediction_id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                confidence REAL NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            (),
        )
        .await?;

        self.conn = Some(conn);
        Ok(())
    }

    /// Whether entries are reaching the database rather than the fallback.
    pub fn is_persistent(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn get(&self, prediction_id: &str) -> Result<Option<PredictionLogEntry>> {
        if let Some(ref conn) = self.conn {
            match self.get_from_db(conn, prediction_id).await {
                Ok(Some(entry)) => return Ok(Some(entry)),
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to read from database, using fallback: {}", e);
                }
            }
        }

        Ok(self.lock_fallback()?.get(prediction_id).cloned())
    }

    async fn save_to_db(&self, conn: &Connection, entry: &PredictionLogEntry) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO predictions (prediction_id, text, sentiment, confidence, timestamp) VALUES (?, ?, ?, ?, ?)",
            (
                entry.prediction_id.as_str(),
                entry.text.as_str(),
                entry.sentiment.as_str(),
                entry.confidence,
                entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
        )
        .await?;
        Ok(())
    }

    async fn get_from_db(
        &self,
        conn: &Connection,
        prediction_id: &str,
    ) -> Result<Option<PredictionLogEntry>> {
        let mut rows = conn
            .query(
                "SELECT prediction_id, text, sentiment, confidence, timestamp FROM predictions WHERE prediction_id = ?",
                [prediction_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let sentiment: String = row.get(2)?;
        let timestamp: String = row.get(4)?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| Error::internal(format!("Failed to parse timestamp: {e}")))?
            .with_timezone(&chrono::Utc);

        Ok(Some(PredictionLogEntry {
            prediction_id: row.get(0)?,
            text: row.get(1)?,
            sentiment: sentiment.parse()?,
            confidence: row.get(3)?,
            timestamp,
        }))
    }

    async fn totals_from_db(&self, conn: &Connection) -> Result<(u64, u64, f64)> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN sentiment = 'positive' THEN 1 ELSE 0 END), 0), COALESCE(SUM(confidence), 0.0) FROM predictions",
                (),
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| Error::internal("Aggregate query returned no rows"))?;

        let total: i64 = row.get(0)?;
        let positive: i64 = row.get(1)?;
        let confidence_sum: f64 = row.get(2)?;
        Ok((total as u64, positive as u64, confidence_sum))
    }

    fn save_to_fallback(&self, entry: PredictionLogEntry) -> Result<()> {
        let evicted = self.lock_fallback()?.upsert(entry, self.fallback_capacity);
        for prediction_id in evicted {
            warn!(
                "In-memory prediction log is full ({} entries), dropped {}",
                self.fallback_capacity, prediction_id
            );
        }
        Ok(())
    }

    fn lock_fallback(&self) -> Result<std::sync::MutexGuard<'_, FallbackLog>> {
        self.fallback
            .lock()
            .map_err(|e| Error::internal(format!("Mutex lock failed: {e}")))
    }
}

#[async_trait]
impl PredictionLog for PredictionStore {
    async fn append(&self, entry: PredictionLogEntry) -> Result<()> {
        if let Some(ref conn) = self.conn {
            match self.save_to_db(conn, &entry).await {
                Ok(()) => {
                    debug!("Prediction saved to database: {}", entry.prediction_id);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to save to database, using fallback: {}", e);
                }
            }
        }

        self.save_to_fallback(entry)
    }

    async fn summary(&self) -> Result<PredictionMetrics> {
        let (mut total, mut positive, mut confidence_sum) = match self.conn {
            Some(ref conn) => self.totals_from_db(conn).await?,
            None => (0, 0, 0.0),
        };

        let (fb_total, fb_positive, fb_sum) = totals(self.lock_fallback()?.entries.values());
        total += fb_total;
        positive += fb_positive;
        confidence_sum += fb_sum;

        Ok(PredictionMetrics::from_totals(total, positive, confidence_sum))
    }
}
