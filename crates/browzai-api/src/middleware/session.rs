use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use browzai_types::RequestContext;
use std::sync::Arc;

use crate::state::AppState;

/// Resolve the session cookie into a `RequestContext` extension
///
/// Runs on every request. Anonymous requests get a context without a user;
/// handlers that need one reject with 401.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match session_token(req.headers(), &state.config.auth.cookie_name) {
        Some(token) => state.identity.resolve_user(&token).await,
        None => None,
    };

    let ctx = RequestContext::new(user);
    tracing::debug!(
        request_id = %ctx.request_id,
        authenticated = ctx.is_authenticated(),
        "Resolved request context"
    );

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Value of the named cookie, if present and non-empty
pub fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Session token from the named cookie, falling back to a bearer token
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; browzai_session=abc123; lang=en"),
        );
        assert_eq!(
            session_token(&headers, "browzai_session").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers, "browzai_session").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_value_ignores_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert!(cookie_value(&headers, "browzai_session").is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("browzai_session_state=n1"));
        assert_eq!(
            cookie_value(&headers, "browzai_session_state").as_deref(),
            Some("n1")
        );
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers, "browzai_session").is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("browzai_session="));
        assert!(session_token(&headers, "browzai_session").is_none());
    }
}
