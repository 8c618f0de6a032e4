//! Optional bearer-token authentication for the API.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

/// Access settings for the HTTP API.
///
/// With no API key the server is open, which is the normal setup for a
/// single machine. Setting a key makes every dose route require
/// `Authorization: Bearer <key>`.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    pub api_key: Option<String>,
    /// Allowed CORS origins. `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    /// No authentication and permissive CORS (local use and tests).
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cors_origins: None,
        }
    }
}

pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer "));

    match token {
        Some(Some(token)) if token == expected => Ok(next.run(request).await),
        Some(Some(_)) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(None) => {
            tracing::warn!("Invalid Authorization header format");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: SecurityConfig) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    async fn status(config: SecurityConfig, auth: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri("/");
        if let Some(value) = auth {
            request = request.header(header::AUTHORIZATION, value);
        }
        app(config)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn open_when_no_key_is_configured() {
        assert_eq!(status(SecurityConfig::disabled(), None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn accepts_matching_bearer_token() {
        let config = SecurityConfig::with_api_key("secret");
        assert_eq!(status(config, Some("Bearer secret")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_wrong_missing_or_malformed_credentials() {
        let config = SecurityConfig::with_api_key("secret");

        assert_eq!(
            status(config.clone(), Some("Bearer nope")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(config.clone(), Some("secret")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(config, None).await, StatusCode::UNAUTHORIZED);
    }
}
