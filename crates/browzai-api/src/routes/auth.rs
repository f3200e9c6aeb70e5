use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::ApiResult,
    middleware::session::{cookie_value, session_token},
    state::AppState,
};

const AUTH_CODE_ERROR_PATH: &str = "/auth/auth-code-error";

/// Lifetime of the pending sign-in cookie, in seconds
const SIGN_IN_STATE_MAX_AGE: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    /// Nonce issued by `sign_in`, echoed back by the provider
    #[serde(default)]
    pub state: Option<String>,
}

/// Send the browser to the identity provider
#[utoipa::path(
    get,
    path = "/auth/signin",
    params(
        ("next" = Option<String>, Query, description = "Relative path to return to after sign-in")
    ),
    responses(
        (status = 303, description = "Redirect to the identity provider, setting the pending sign-in cookie")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignInQuery>,
) -> ApiResult<Response> {
    let auth = &state.config.auth;
    let next = safe_next(query.next.as_deref());
    let nonce = uuid::Uuid::new_v4().simple().to_string();

    let url = state.identity.sign_in_url(&callback_uri(auth), &nonce)?;
    let pending = cookie(
        auth,
        &state_cookie_name(auth),
        &encode_sign_in_state(&nonce, next),
        SIGN_IN_STATE_MAX_AGE,
    );

    Ok(([(header::SET_COOKIE, pending)], Redirect::to(&url)).into_response())
}

/// Finish sign-in: exchange the code, set the session cookie, return to `next`
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "Nonce that must match the pending sign-in cookie"),
        ("next" = Option<String>, Query, description = "Relative path to return to")
    ),
    responses(
        (status = 307, description = "Redirect to `next`, or to the sign-in error page")
    ),
    tag = "auth"
)]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let auth = &state.config.auth;
    let base = redirect_base(auth, &headers);
    let error_target = format!("{}{}", base, AUTH_CODE_ERROR_PATH);

    let state_cookie = state_cookie_name(auth);
    let pending = cookie_value(&headers, &state_cookie);
    let clear_pending = cookie(auth, &state_cookie, "", 0);

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("Auth callback without code");
        return error_page(&error_target, clear_pending);
    };

    let Some(pending_next) = verified_next(pending.as_deref(), query.state.as_deref()) else {
        tracing::warn!("Auth callback state does not match a pending sign-in");
        return error_page(&error_target, clear_pending);
    };

    match state
        .identity
        .exchange_code(&code, &callback_uri(auth))
        .await
    {
        Ok(session) => {
            let next = safe_next(query.next.as_deref().or(Some(pending_next.as_str())));
            let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
            (
                AppendHeaders([
                    (
                        header::SET_COOKIE,
                        session_cookie(auth, &session.token, max_age),
                    ),
                    (header::SET_COOKIE, clear_pending),
                ]),
                Redirect::temporary(&format!("{}{}", base, next)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Code exchange failed: {}", e);
            error_page(&error_target, clear_pending)
        }
    }
}

fn error_page(target: &str, clear_pending: String) -> Response {
    ([(header::SET_COOKIE, clear_pending)], Redirect::temporary(target)).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/auth-code-error",
    responses(
        (status = 200, description = "Sign-in failure notice", content_type = "text/plain")
    ),
    tag = "auth"
)]
pub async fn auth_code_error() -> &'static str {
    "Sorry, we couldn't sign you in. Please try again."
}

/// End the session and clear the cookie
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses(
        (status = 303, description = "Redirect to the home page")
    ),
    tag = "auth"
)]
pub async fn sign_out(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let auth = &state.config.auth;
    if let Some(token) = session_token(&headers, &auth.cookie_name) {
        state.identity.sign_out(&token).await;
    }

    (
        [(header::SET_COOKIE, session_cookie(auth, "", 0))],
        Redirect::to("/"),
    )
        .into_response()
}

fn callback_uri(auth: &AuthConfig) -> String {
    format!("{}/auth/callback", auth.site_url.trim_end_matches('/'))
}

/// Origin the browser is sent back to after the callback
///
/// Development trusts the request's own host. Behind a proxy the forwarded
/// host wins; otherwise the configured site URL.
fn redirect_base(auth: &AuthConfig, headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if auth.development {
        if let Some(host) = header_value(header::HOST.as_str()) {
            return format!("http://{}", host);
        }
    } else if let Some(forwarded) = header_value("x-forwarded-host") {
        return format!("https://{}", forwarded);
    }

    auth.site_url.trim_end_matches('/').to_string()
}

/// Only same-site relative paths are followed
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn state_cookie_name(auth: &AuthConfig) -> String {
    format!("{}_state", auth.cookie_name)
}

/// Pending sign-in cookie value: `{nonce}.{percent-encoded next}`
fn encode_sign_in_state(nonce: &str, next: &str) -> String {
    format!("{}.{}", nonce, utf8_percent_encode(next, NON_ALPHANUMERIC))
}

/// The pending `next` path, only when the returned state matches its nonce
fn verified_next(pending: Option<&str>, state: Option<&str>) -> Option<String> {
    let (nonce, next) = pending?.split_once('.')?;
    if nonce.is_empty() || Some(nonce) != state {
        return None;
    }
    percent_decode_str(next)
        .decode_utf8()
        .ok()
        .map(|next| next.into_owned())
}

fn session_cookie(auth: &AuthConfig, token: &str, max_age: i64) -> String {
    cookie(auth, &auth.cookie_name, token, max_age)
}

fn cookie(auth: &AuthConfig, name: &str, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if !auth.development {
        cookie.push_str("; Secure");
    }
    cookie
}
