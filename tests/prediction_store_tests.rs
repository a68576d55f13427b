use chrono::Utc;
use model_serving::{
    prediction::{PredictionRequest, PredictionResponse, Sentiment},
    store::{PredictionLog, PredictionLogEntry, PredictionStore},
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn entry(id: &str, text: &str, sentiment: Sentiment, confidence: f64) -> PredictionLogEntry {
    PredictionLogEntry {
        prediction_id: id.to_string(),
        text: text.to_string(),
        sentiment,
        confidence,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_entry_projects_request_and_response() {
    let request = PredictionRequest {
        text: "pretty good".to_string(),
        model_version: Some("1.0.0".to_string()),
    };
    let response = PredictionResponse {
        prediction_id: "abc".to_string(),
        sentiment: Sentiment::Positive,
        confidence: 0.83,
        timestamp: Utc::now(),
    };

    let projected = PredictionLogEntry::from_exchange(&request, &response);
    assert_eq!(
        projected,
        PredictionLogEntry {
            prediction_id: "abc".to_string(),
            text: "pretty good".to_string(),
            sentiment: Sentiment::Positive,
            confidence: 0.83,
            timestamp: response.timestamp,
        }
    );
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = PredictionStore::new(":memory:").await.unwrap();
    assert!(store.is_persistent());

    let saved = entry("mem-1", "great", Sentiment::Positive, 0.9);
    store.append(saved.clone()).await.unwrap();

    assert_eq!(store.get("mem-1").await.unwrap(), Some(saved));
}

#[tokio::test]
async fn test_file_database_store() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let store = PredictionStore::new(&db_path_str).await.unwrap();
    assert!(store.is_persistent());

    let entries = vec![
        entry("f-1", "good morning", Sentiment::Positive, 0.71),
        entry("f-2", "meh", Sentiment::Negative, 0.99),
        entry("f-3", "GREAT", Sentiment::Positive, 0.85),
    ];

    for e in &entries {
        store.append(e.clone()).await.unwrap();
    }

    for e in &entries {
        let loaded = store.get(&e.prediction_id).await.unwrap().unwrap();
        assert_eq!(&loaded, e);
    }
}

#[tokio::test]
async fn test_fallback_store_when_db_fails() {
    // Use an invalid path to force database initialization failure
    let store = PredictionStore::new("/invalid/path/to/predictions.db")
        .await
        .unwrap();
    assert!(!store.is_persistent());

    let saved = entry("fb-1", "test message", Sentiment::Negative, 0.8);
    store.append(saved.clone()).await.unwrap();

    assert_eq!(store.get("fb-1").await.unwrap(), Some(saved));

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_predictions, 1);
    assert_eq!(summary.positive_ratio, 0.0);
}

#[tokio::test]
async fn test_summary_aggregates() {
    let store = PredictionStore::new(":memory:").await.unwrap();

    store
        .append(entry("s-1", "good", Sentiment::Positive, 0.7))
        .await
        .unwrap();
    store
        .append(entry("s-2", "great", Sentiment::Positive, 0.8))
        .await
        .unwrap();
    store
        .append(entry("s-3", "bad", Sentiment::Negative, 0.9))
        .await
        .unwrap();
    store
        .append(entry("s-4", "worse", Sentiment::Negative, 1.0))
        .await
        .unwrap();

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_predictions, 4);
    assert!((summary.positive_ratio - 0.5).abs() < 1e-9);
    assert!((summary.avg_confidence - 0.85).abs() < 1e-9);
}

#[tokio::test]
async fn test_concurrent_access() {
    let store = Arc::new(PredictionStore::new(":memory:").await.unwrap());

    let mut handles = vec![];

    for i in 0..10 {
        let store_clone = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            let e = entry(&format!("c-{i}"), "concurrent", Sentiment::Negative, 0.75);
            store_clone.append(e).await
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.summary().await.unwrap().total_predictions, 10);
    for i in 0..10 {
        assert!(store.get(&format!("c-{i}")).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_fallback_concurrent_access() {
    let store = Arc::new(PredictionStore::new("/invalid/path").await.unwrap());

    let mut handles = vec![];

    for i in 0..5 {
        let store_clone = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            let e = entry(&format!("fc-{i}"), "fallback", Sentiment::Positive, 0.9);
            store_clone.append(e).await
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_predictions, 5);
    assert_eq!(summary.positive_ratio, 1.0);
}

#[tokio::test]
async fn test_large_text() {
    let store = PredictionStore::new(":memory:").await.unwrap();

    let large_text = "x".repeat(10000);
    store
        .append(entry("large", &large_text, Sentiment::Negative, 0.7))
        .await
        .unwrap();

    let loaded = store.get("large").await.unwrap().unwrap();
    assert_eq!(loaded.text.len(), 10000);
    assert_eq!(loaded.text, large_text);
}
