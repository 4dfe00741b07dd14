use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::access::Actor;
use crate::services::accounts::{
    self, AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::state::AppState;

/// The caller behind a valid bearer token, re-read from storage so role
/// changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))?;

        let claims = accounts::verify_token(token.trim(), &state.config.jwt_secret)?;

        let user = {
            let conn = state.conn()?;
            queries::get_user(&conn, &claims.sub)?
        };

        user.map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(req) = body?;
    let req = req.normalized();
    req.validate()?;

    let password = req.password.clone();
    let cost = state.config.bcrypt_cost;
    let password_hash = run_blocking(move || accounts::hash_password(&password, cost)).await?;

    let user = {
        let conn = state.conn()?;
        accounts::register(&conn, &req, password_hash)?
    };

    let token = accounts::issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = body?;
    let invalid = || AppError::Unauthorized("invalid email or password".to_string());

    let user = {
        let conn = state.conn()?;
        queries::get_user_by_email(&conn, &req.email.trim().to_lowercase())?
    }
    .ok_or_else(invalid)?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let matches = run_blocking(move || accounts::verify_password(&password, &hash)).await?;
    if !matches {
        tracing::info!(user_id = %user.id, "failed login attempt");
        return Err(invalid());
    }

    let token = accounts::issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse { token, user }))
}

// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.0)
}

// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = body?;
    req.validate()?;

    let conn = state.conn()?;
    let user = accounts::update_profile(&conn, &auth.0, &req)?;
    Ok(Json(user))
}
