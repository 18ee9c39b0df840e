//! Registration, sign-in, federated sign-in and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use domain::ProfileUpdate;
use serde::Deserialize;
use serde_json::{Value, json};
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser, TOKEN_COOKIE, cookie_value};
use crate::state::AppState;

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_TTL_SECS: i64 = 600;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `Set-Cookie` value for the session token.
fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn with_cookie(mut response: Response, cookie: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::Internal(format!("invalid cookie header: {e}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}

/// POST /auth/register
#[tracing::instrument(skip(state, req))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = state
        .accounts
        .register(&req.name, &req.email, &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "token": session.token,
            "user": session.user,
        })),
    ))
}

/// POST /auth/login: also sets the session cookie.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state.accounts.login(&req.email, &req.password).await?;
    let cookie = session_cookie(
        &session.token,
        state.accounts.tokens().expiry_secs(),
        state.config.is_production(),
    );
    let body = Json(json!({
        "success": true,
        "message": "Login successful",
        "token": session.token,
        "user": session.user,
    }));
    with_cookie(body.into_response(), &cookie)
}

/// POST /auth/logout: expires the session cookie.
pub async fn logout() -> Result<Response, ApiError> {
    let body = Json(json!({ "success": true, "message": "Logged out successfully" }));
    with_cookie(body.into_response(), &session_cookie("", 0, false))
}

/// GET /auth/google: starts the authorization-code flow.
#[tracing::instrument(skip(state))]
pub async fn google<S: Store>(State(state): State<Arc<AppState<S>>>) -> Result<Response, ApiError> {
    let provider = state
        .identity_provider
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Google sign-in is not configured".to_string()))?;

    let csrf = uuid::Uuid::new_v4().to_string();
    let cookie = format!(
        "{OAUTH_STATE_COOKIE}={csrf}; Path=/auth/google; Max-Age={OAUTH_STATE_TTL_SECS}; HttpOnly; SameSite=Lax"
    );
    let redirect = Redirect::to(&provider.authorize_url(&csrf)).into_response();
    with_cookie(redirect, &cookie)
}

/// GET /auth/google/callback: signs in and hands the token to the
/// frontend. Every failure redirects to the frontend login page.
#[tracing::instrument(skip_all)]
pub async fn google_callback<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallback>,
) -> Response {
    let failure = format!(
        "{}/login?error=google_auth_failed",
        state.config.frontend_url.trim_end_matches('/')
    );

    let target = match complete_google_sign_in(&state, &headers, params).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = ?e, "Google sign-in failed");
            failure
        }
    };
    Redirect::to(&target).into_response()
}

async fn complete_google_sign_in<S: Store>(
    state: &AppState<S>,
    headers: &HeaderMap,
    params: OAuthCallback,
) -> Result<String, ApiError> {
    let provider = state
        .identity_provider
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Google sign-in is not configured".to_string()))?;

    if let Some(error) = params.error {
        return Err(ApiError::BadRequest(format!("provider returned {error}")));
    }
    let expected = cookie_value(headers, OAUTH_STATE_COOKIE);
    if expected.is_none() || expected != params.state {
        return Err(ApiError::BadRequest("state mismatch".to_string()));
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::BadRequest("missing code".to_string()))?;

    let profile = provider
        .exchange(&code)
        .await
        .map_err(workflow::WorkflowError::from)?;
    let session = state.accounts.federated_login(profile).await?;

    let summary = json!({
        "id": session.user.id,
        "name": session.user.name,
        "email": session.user.email,
        "role": session.user.role,
        "avatar": session.user.avatar,
    })
    .to_string();

    auth::frontend_callback_url(
        &state.config.frontend_url,
        &[("token", session.token.as_str()), ("user", summary.as_str())],
    )
    .ok_or_else(|| ApiError::Internal("FRONTEND_URL is not a valid URL".to_string()))
}

/// GET /auth/profile
#[tracing::instrument(skip(state))]
pub async fn profile<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state.accounts.profile(identity).await?;
    let wishlist = state.accounts.wishlist(identity).await?;
    Ok(Json(json!({ "success": true, "user": user, "wishlist": wishlist })))
}

/// PUT /auth/profile
#[tracing::instrument(skip(state, update))]
pub async fn update_profile<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    let user = state.accounts.update_profile(identity, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": user,
    })))
}

/// PUT /auth/change-password
#[tracing::instrument(skip(state, req))]
pub async fn change_password<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .accounts
        .change_password(identity, req.current_password.as_deref(), &req.new_password)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Password changed successfully" })))
}
