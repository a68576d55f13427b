//! Double-submit cookie CSRF protection.
//!
//! Clients without an `XSRF-TOKEN` cookie are issued one. State-changing
//! requests must echo the cookie value in the `X-XSRF-TOKEN` header.

use super::{handlers::AppState, types::ErrorResponse};
use crate::config::CsrfPolicy;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
pub const CSRF_HEADER: &str = "x-xsrf-token";

const EXEMPT_PATHS: [&str; 1] = ["/api/v1/health"];
const EXEMPT_PREFIX: &str = "/actuator";

pub fn is_safe_method(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE].contains(method)
}

fn is_exempt_path(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path)
        || path == EXEMPT_PREFIX
        || path.starts_with(&format!("{EXEMPT_PREFIX}/"))
}

pub fn requires_token(policy: CsrfPolicy, method: &Method, path: &str) -> bool {
    match policy {
        CsrfPolicy::Disable => false,
        CsrfPolicy::Enforce => !is_safe_method(method),
        CsrfPolicy::ExemptHealth => !is_safe_method(method) && !is_exempt_path(path),
    }
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub async fn csrf_protection(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let policy = state.security.csrf;
    if policy == CsrfPolicy::Disable {
        return next.run(request).await;
    }

    let cookie_token = cookie_value(request.headers(), CSRF_COOKIE).filter(|t| !t.is_empty());

    if requires_token(policy, request.method(), request.uri().path()) {
        let header_token = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok());

        let valid = matches!(
            (cookie_token.as_deref(), header_token),
            (Some(expected), Some(sent)) if expected == sent
        );

        if !valid {
            warn!(
                "Rejected {} {}: missing or mismatched CSRF token",
                request.method(),
                request.uri().path()
            );
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new("Invalid CSRF token")),
            )
                .into_response();
        }
    }

    let mut response = next.run(request).await;

    if cookie_token.is_none() {
        let token = Uuid::new_v4().simple().to_string();
        if let Ok(value) =
            HeaderValue::from_str(&format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Strict"))
        {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
