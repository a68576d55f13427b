use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use base64::Engine;
use model_serving::{
    config::{self, Config, CsrfPolicy, UserCredential},
    prediction::{SeededRandom, SentimentEngine},
    server::{AppState, auth::hash_password, build_router},
    service::PredictionService,
    store::PredictionLog,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub const TEST_USER: &str = "admin";
pub const TEST_PASSWORD: &str = "s3cret-password";

/// Hashing is slow, so every test shares one hash.
fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hashing should succeed"))
}

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    let mut config = config::parse(SAMPLE_CONFIG_YAML).expect("sample config should parse");
    config.security.users = vec![UserCredential {
        username: TEST_USER.to_string(),
        password_hash: test_password_hash().to_string(),
    }];
    config
}

pub fn create_test_config_with_csrf(policy: CsrfPolicy) -> Config {
    let mut config = create_test_config();
    config.security.csrf = policy;
    config
}

pub fn create_test_service(log: Arc<dyn PredictionLog>, config: &Config) -> PredictionService {
    PredictionService::new(SentimentEngine::new(SeededRandom::new(7)), log, config)
}

pub fn create_test_app(log: Arc<dyn PredictionLog>, config: &Config) -> Router {
    let service = create_test_service(log, config);
    build_router(AppState::new(service, config.security.clone()))
}

pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

pub fn authorized_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(TEST_USER, TEST_PASSWORD))
        .body(Body::empty())
        .unwrap()
}

pub fn authorized_predict(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic_auth(TEST_USER, TEST_PASSWORD))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 8080
  database_path: ":memory:"
  logs:
    level: "debug"

model:
  version: "1.0.0"

persistence:
  write_timeout_ms: 200

security:
  csrf: disable
"#;
