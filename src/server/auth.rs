//! HTTP Basic authentication against Argon2-hashed credentials.

use super::{handlers::AppState, types::ErrorResponse};
use crate::{Error, Result, config::UserCredential};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const REALM: &str = "model-serving";

/// Verified in place of a real hash when the username is unknown, so both
/// paths cost one Argon2 verification. Uses `Argon2::default()` parameters.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$taLJYlBhI2bqJy/6xtl0Sq9LRarNlqp8/Lkx7jtVglk";

/// Identity attached to requests that passed [`require_basic_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Hash a password into a PHC string suitable for `security.users`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header.
pub fn parse_basic_credentials(headers: &HeaderMap) -> Result<(String, String)> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::auth("Missing Authorization header"))?
        .to_str()
        .map_err(|_| Error::auth("Authorization header is not valid ASCII"))?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or_else(|| Error::auth("Expected Basic authorization scheme"))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::auth("Malformed Basic credentials"))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| Error::auth("Malformed Basic credentials"))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| Error::auth("Malformed Basic credentials"))?;

    Ok((username.to_string(), password.to_string()))
}

pub fn authenticate(headers: &HeaderMap, users: &[UserCredential]) -> Result<AuthenticatedUser> {
    let (username, password) = parse_basic_credentials(headers)?;

    let user = users.iter().find(|user| user.username == username);
    let password_hash = user.map_or(DUMMY_PASSWORD_HASH, |user| user.password_hash.as_str());

    if !verify_password(&password, password_hash) || user.is_none() {
        return Err(Error::auth("Bad credentials"));
    }

    Ok(AuthenticatedUser { username })
}

pub async fn require_basic_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers().clone();
    let security = Arc::clone(&state.security);

    // Argon2 is CPU-bound; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || authenticate(&headers, &security.users))
        .await
        .unwrap_or_else(|e| Err(Error::internal(format!("Authentication task failed: {e}"))));

    match outcome {
        Ok(user) => {
            debug!("Authenticated {} for {}", user.username, request.uri().path());
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e @ Error::Auth(_)) => {
            warn!("Rejected request to {}: {}", request.uri().path(), e);
            unauthorized(e)
        }
        Err(e) => {
            error!("Authentication failed for {}: {}", request.uri().path(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
                .into_response()
        }
    }
}

fn unauthorized(error: Error) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
        Json(ErrorResponse::new(error.to_string())),
    )
        .into_response()
}
