use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, RefreshRequest, TokenResponse};
use crate::schemas::user::UserResponse;

/// Max login attempts per username per window.
const LOGIN_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }

    let rate_key = format!("rl:login:{username}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(issue_token_pair(&state, user).await?))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let now = primitive_now_utc();
    let token_hash = security::hash_refresh_token(&payload.refresh_token);

    let stored = repositories::refresh_tokens::find_by_hash(state.db(), &token_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load refresh token"))?
        .ok_or(ApiError::Unauthorized("Invalid refresh token"))?;

    if stored.revoked_at.is_some() || stored.expires_at <= now {
        return Err(ApiError::Unauthorized("Invalid refresh token"));
    }

    // A token that lost the race to another refresh is treated as already used.
    let revoked = repositories::refresh_tokens::revoke(state.db(), &stored.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to revoke refresh token"))?;
    if !revoked {
        return Err(ApiError::Unauthorized("Invalid refresh token"));
    }

    let user = repositories::users::find_by_id(state.db(), &stored.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .filter(|user| user.is_active)
        .ok_or(ApiError::Unauthorized("Invalid refresh token"))?;

    Ok(Json(issue_token_pair(&state, user).await?))
}

async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<StatusCode, ApiError> {
    let token_hash = security::hash_refresh_token(&payload.refresh_token);
    let stored = repositories::refresh_tokens::find_by_hash(state.db(), &token_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load refresh token"))?;

    if let Some(stored) = stored {
        repositories::refresh_tokens::revoke(state.db(), &stored.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to revoke refresh token"))?;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn issue_token_pair(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let access_token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let issued = security::issue_refresh_token(state.settings());
    let now = primitive_now_utc();
    repositories::refresh_tokens::create(
        state.db(),
        repositories::refresh_tokens::CreateRefreshToken {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            token_hash: &issued.token_hash,
            expires_at: PrimitiveDateTime::new(issued.expires_at.date(), issued.expires_at.time()),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store refresh token"))?;

    if let Err(err) = repositories::refresh_tokens::delete_expired(state.db(), &user.id, now).await
    {
        tracing::warn!(error = %err, user_id = %user.id, "Failed to prune expired refresh tokens");
    }

    Ok(TokenResponse {
        access_token,
        refresh_token: issued.token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}
