//! Google sign-in and Sheets authorization.
//!
//! `redirect` starts the handshake; `callback` finishes it either for a
//! signed-in user connecting Google or as a login for anonymous callers.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use widgetry_core::crypto::generate_state_token;
use widgetry_core::types::DbId;
use widgetry_db::models::user::CreateUser;
use widgetry_db::repositories::{OAuthStateRepo, UserRepo};
use widgetry_google::{GoogleOAuthClient, TokenResponse};

use crate::error::{AppError, AppResult};
use crate::handlers::auth::{create_auth_response, ensure_active, normalize_email};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query string Google appends when redirecting back.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn oauth_client(state: &AppState) -> AppResult<&GoogleOAuthClient> {
    state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google sign-in is not configured".into()))
}

/// GET /api/v1/auth/google
///
/// Persist a fresh `state` and send the browser to Google's consent screen
/// (303 See Other).
pub async fn redirect(State(state): State<AppState>) -> AppResult<Redirect> {
    let client = oauth_client(&state)?;
    let session_state = generate_state_token();
    OAuthStateRepo::create(&state.pool, &session_state).await?;
    Ok(Redirect::to(&client.authorization_url(&session_state)))
}

/// GET /api/v1/auth/google/callback
pub async fn callback(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Query(params): Query<CallbackParams>,
) -> AppResult<Response> {
    if let Some(error) = params.error {
        return Err(AppError::BadRequest(error));
    }
    let (Some(code), Some(session_state)) = (params.code, params.state) else {
        return Err(AppError::BadRequest("Missing code or state".into()));
    };

    if !OAuthStateRepo::consume(&state.pool, &session_state).await? {
        return Err(AppError::BadRequest("Session state not found.".into()));
    }

    let client = oauth_client(&state)?;
    let tokens = client
        .exchange_code(&code)
        .await
        .map_err(|e| AppError::Upstream(format!("Google token exchange failed: {e}")))?;

    if let Some(caller) = caller {
        keep_tokens(&state, caller.user_id, &tokens).await?;
        UserRepo::set_oauth(&state.pool, caller.user_id).await?;
        tracing::info!(user_id = caller.user_id, "Google account connected");
        return Ok(Json(DataResponse {
            data: json!({"message": "Google account connected."}),
        })
        .into_response());
    }

    let email = client
        .user_email(&tokens.access_token)
        .await
        .map_err(|e| AppError::Upstream(format!("Google userinfo lookup failed: {e}")))?;
    let email = normalize_email(&email);

    let user = match UserRepo::find_by_email(&state.pool, &email).await? {
        Some(user) => user,
        None => {
            let user = UserRepo::create(
                &state.pool,
                &CreateUser {
                    email,
                    password_hash: None,
                    is_oauth: true,
                },
            )
            .await?;
            tracing::info!(user_id = user.id, "User created through Google sign-in");
            user
        }
    };
    ensure_active(&user)?;

    keep_tokens(&state, user.id, &tokens).await?;
    UserRepo::set_oauth(&state.pool, user.id).await?;

    Ok(Json(create_auth_response(&state, &user).await?).into_response())
}

/// Store the issued tokens unless the user already has a refresh token on
/// file.
async fn keep_tokens(state: &AppState, user_id: DbId, tokens: &TokenResponse) -> AppResult<()> {
    if state.credentials.has_refresh_token(user_id).await? {
        tracing::debug!(user_id, "Refresh token already stored, keeping existing credentials");
        return Ok(());
    }
    state
        .credentials
        .store_tokens(
            user_id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            tokens.expires_at(),
        )
        .await?;
    Ok(())
}
