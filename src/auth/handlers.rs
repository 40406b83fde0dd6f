use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookies::{cleared_headers, read_cookie, session_headers, REFRESH_COOKIE},
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest,
            UpdatePasswordRequest,
        },
        failures::AuthFailure,
        jwt::{AuthUser, JwtKeys},
        password::{hash_password_blocking, verify_password_blocking},
        repo::User,
    },
    error::{AppError, AppResult},
    state::AppState,
    validation::ValidJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/update-password", post(update_password))
        .route("/auth/me", get(get_me))
}

fn issue_session(state: &AppState, user: &User) -> AppResult<HeaderMap> {
    let pair = JwtKeys::from_ref(state).sign_pair(user.id)?;
    Ok(session_headers(
        &pair.access,
        pair.access_ttl_secs,
        &pair.refresh,
        pair.refresh_ttl_secs,
        &state.config.cookie,
    ))
}

fn auth_response(user: User) -> Json<AuthResponse> {
    Json(AuthResponse {
        success: true,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    let hash = hash_password_blocking(payload.password).await?;

    let Some(user) = User::create(&state.db, &email, &hash).await? else {
        warn!(email = %email, "email already registered");
        return Err(AuthFailure::EmailTaken.into());
    };

    let headers = issue_session(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, headers, auth_response(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthFailure::InvalidCredentials.into());
    };

    let ok = verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let headers = issue_session(&state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((headers, auth_response(user)))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageResponse>) {
    (
        cleared_headers(&state.config.cookie),
        Json(MessageResponse::ok("Signed out")),
    )
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let token = read_cookie(&headers, REFRESH_COOKIE).ok_or(AuthFailure::SessionMissing)?;
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::from(AuthFailure::SessionExpired)
        })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

    let headers = issue_session(&state, &user)?;
    Ok((headers, auth_response(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<UpdatePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

    if verify_password_blocking(payload.new_password.clone(), user.password_hash).await? {
        return Err(AuthFailure::SamePassword.into());
    }

    let hash = hash_password_blocking(payload.new_password).await?;
    if !User::update_password(&state.db, user_id, &hash).await? {
        return Err(AuthFailure::UserNotFound.into());
    }

    info!(user_id = %user_id, "password updated");
    Ok(Json(MessageResponse::ok("Password updated")))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<AuthResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;
    Ok(auth_response(user))
}
